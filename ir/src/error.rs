use snafu::Snafu;

use crate::expr::ExprId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// An operand handle does not refer to a node of the graph.
    #[snafu(display("dangling operand {operand} (graph holds {len} nodes)"))]
    DanglingOperand { operand: ExprId, len: usize },

    /// Function parameters must be `Var` nodes.
    #[snafu(display("function parameter {param} is not a variable"))]
    ParameterNotVar { param: ExprId },

    /// Tensor element count does not match the product of its dims.
    #[snafu(display("tensor data holds {actual} elements but dims {dims:?} require {expected}"))]
    TensorDataLength { dims: Vec<usize>, expected: usize, actual: usize },

    /// Product of the dims does not fit in `usize`.
    #[snafu(display("dims {dims:?} hold more elements than fit in usize"))]
    ElementCountOverflow { dims: Vec<usize> },

    /// Rewrite driver stopped on an iteration cap before reaching a fixpoint.
    #[snafu(display("rewrite did not converge after {sweeps} sweeps"))]
    NotConverged { sweeps: usize },
}
