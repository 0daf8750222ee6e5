//! Reference evaluator for tensorfold expressions.
//!
//! [`ReferenceEvaluator`] implements [`Evaluator`](tensorfold_ir::Evaluator)
//! on host tensors. It favours clarity over speed and is what constant folding
//! and the test suites evaluate with.
//!
//! Operand validation is shared with type inference: every call is checked by
//! the same typing rules before its kernel runs, so the evaluator and the type
//! checker agree on which expressions are well formed.

pub mod kernels;
pub mod reference;
pub mod scalar;


pub use reference::ReferenceEvaluator;
pub use scalar::{eval_binary_op, eval_unary_op};
