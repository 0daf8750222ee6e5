//! Constant and shape folding.
//!
//! Three rules replace sub-expressions whose value no longer depends on graph
//! inputs:
//!
//! - [`FoldShapeOp`]: `ShapeOf(x)` of a statically shaped `x`
//! - [`FoldConstFunction`]: `Invoke` of a function on constant arguments
//! - [`FoldConstCall`]: any other call whose operands are all constant
//!
//! A fold that cannot be carried out (ill-typed call, evaluation failure,
//! result of an unexpected type) is an ordinary "rule does not apply".

mod context;
mod rules;

pub use context::FoldContext;
pub use rules::{FoldConstCall, FoldConstFunction, FoldShapeOp};

use tensorfold_ir::RuleSet;

/// The folding rules in trial order: shape, function, call.
pub fn folding_rules<'e>() -> RuleSet<FoldContext<'e>> {
    RuleSet::default().with_rule(FoldShapeOp::new()).with_rule(FoldConstFunction::new()).with_rule(FoldConstCall::new())
}
