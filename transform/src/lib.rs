//! Graph passes for tensorfold.
//!
//! # Module Organization
//!
//! - [`fold`] - Folding rules that replace closed sub-expressions with constants
//! - [`pass`] - The [`Pass`] trait, [`ShapeInferPass`] and [`PassManager`]
//! - [`config`] - Pass configuration with environment fallbacks
//! - [`error`] - Pass errors
//!
//! Folding never computes operator results itself; it hands closed
//! sub-expressions to an [`Evaluator`](tensorfold_ir::Evaluator). The default
//! passes use [`ReferenceEvaluator`](tensorfold_evaluator::ReferenceEvaluator).

pub mod config;
pub mod error;
pub mod fold;
pub mod pass;


pub use config::PassOptions;
pub use error::{Error, Result};
pub use fold::{FoldConstCall, FoldConstFunction, FoldContext, FoldShapeOp, folding_rules};
pub use pass::{Pass, PassManager, PassOutput, ShapeInferPass};
