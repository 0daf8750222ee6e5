//! Interface to the numeric evaluation library.
//!
//! The IR never computes operator results itself. Constant folding hands a
//! closed sub-expression to an [`Evaluator`], which either produces a
//! [`Value`] or reports why it could not.

use std::collections::HashMap;

use snafu::Snafu;

use crate::error::Error;
use crate::expr::{ExprId, Graph};
use crate::op::OpKind;
use crate::tensor::Value;
use crate::ty::TypeError;

/// Values bound to `Var` nodes during evaluation.
pub type Bindings = HashMap<ExprId, Value>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum EvalError {
    #[snafu(display("variable {var} has no bound value"))]
    UnboundVariable { var: ExprId },

    #[snafu(display("{op} is not supported by this evaluator"))]
    UnsupportedOp { op: OpKind },

    #[snafu(display("operand {index} of {op} has the wrong kind of value"))]
    InvalidOperand { op: OpKind, index: usize },

    #[snafu(display("integer division by zero"))]
    DivisionByZero,

    #[snafu(display("ill-typed expression {expr}: {source}"))]
    IllTyped { expr: ExprId, source: TypeError },

    #[snafu(display("{expr} is a function and cannot be evaluated directly"))]
    NotCallable { expr: ExprId },

    /// Operand shapes rejected by a kernel.
    #[snafu(display("invalid operand shapes: {source}"))]
    InvalidShape { source: TypeError },

    #[snafu(display("kernel produced a malformed tensor: {source}"))]
    MalformedTensor { source: Error },
}

/// Deterministic evaluation of an expression to a host value.
///
/// `bindings` supplies the values of free variables. The same inputs always
/// produce the same result.
pub trait Evaluator {
    fn evaluate(&self, graph: &Graph, expr: ExprId, bindings: &Bindings) -> Result<Value, EvalError>;
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn evaluate(&self, graph: &Graph, expr: ExprId, bindings: &Bindings) -> Result<Value, EvalError> {
        (**self).evaluate(graph, expr, bindings)
    }
}
