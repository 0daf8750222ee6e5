use snafu::Snafu;
use tensorfold_ir::ExprId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Passes run on functions only.
    #[snafu(display("{expr} is not a function"))]
    NotAFunction { expr: ExprId },

    /// The rewrite driver hit an iteration cap before reaching a fixpoint.
    #[snafu(display("pass {pass} did not converge after {sweeps} sweeps"))]
    DidNotConverge { pass: String, sweeps: usize },

    #[snafu(display("IR error: {source}"))]
    Ir { source: tensorfold_ir::Error },
}
