//! Intermediate representation for the tensorfold graph compiler.
//!
//! This crate defines the expression graph, its type system and the
//! pattern-directed rewriting machinery that later passes build on.
//!
//! # Module Organization
//!
//! - [`expr`] - Expression nodes, the [`Graph`] arena, builders and tree printing
//! - [`types`] - Constant values and operator kinds
//! - [`op`] - Operators carried by calls
//! - [`tensor`] - Host tensors and evaluation values
//! - [`shape`] / [`ty`] - Partially known shapes and checked types
//! - [`infer`] - Bottom-up type and shape inference
//! - [`pattern`] - Pattern language and matcher
//! - [`rewrite`] - Rewrite rules and the fixpoint driver
//! - [`eval`] - Interface to the external numeric evaluator
//! - [`cost`] - Additive cost model
//! - [`error`] - Error types and result handling

pub mod cost;
pub mod error;
pub mod eval;
pub mod expr;
pub mod infer;
pub mod op;
pub mod pattern;
pub mod prelude;
pub mod rewrite;
pub mod shape;
pub mod tensor;
pub mod ty;
pub mod types;


pub use cost::{Cost, CostModel, ExprCostModel, total_cost};
pub use error::{Error, Result};
pub use eval::{Bindings, EvalError, Evaluator};
pub use expr::{Call, Expr, ExprId, Function, Graph, Var};
pub use infer::{TypeTable, infer_type};
pub use op::{Op, OpKind};
pub use pattern::{ConstPredicate, FieldPattern, MatchResult, OpFilter, Pattern};
pub use rewrite::{
    Convergence, PatternRule, RewriteOptions, RewriteOutput, RewriteRule, RuleSet, SelectionPolicy, rewrite,
    rewrite_with_options,
};
pub use shape::{Dim, Shape};
pub use tensor::{Tensor, Value};
pub use ty::{CheckedType, TensorType, TypeError};
pub use types::{BinaryOp, ConstValue, ConstValueHash, ReduceOp, UnaryOp};

pub use tensorfold_dtype::DataType;
