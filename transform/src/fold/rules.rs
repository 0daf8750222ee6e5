use tensorfold_ir::{
    Bindings, CheckedType, ExprId, Graph, MatchResult, OpFilter, Pattern, RewriteRule, Value,
};
use tracing::{debug, trace};

use super::FoldContext;

/// `ShapeOf(x)` with a fully static `x` becomes an Int64 constant.
///
/// `x` itself is never evaluated, so this also folds shapes of graph inputs.
pub struct FoldShapeOp {
    pattern: Pattern,
}

impl FoldShapeOp {
    pub fn new() -> Self {
        Self { pattern: Pattern::shape_of(Pattern::wild("x")) }
    }
}

impl Default for FoldShapeOp {
    fn default() -> Self {
        Self::new()
    }
}

impl<'e> RewriteRule<FoldContext<'e>> for FoldShapeOp {
    fn name(&self) -> &str {
        "fold-shape-op"
    }

    fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    fn build(&self, matched: &MatchResult, graph: &mut Graph, ctx: &mut FoldContext<'e>) -> Option<ExprId> {
        let x = matched.get("x")?;
        let dims = ctx.types.type_of(graph, x).as_tensor()?.shape.to_static()?;
        let dims: Vec<i64> = dims.iter().map(|&d| d as i64).collect();

        let folded = graph.const_i64s(&dims);
        ctx.types.infer(graph, folded);
        Some(folded)
    }
}

/// A call whose operands are all constants (or tuples of constants) is
/// evaluated and replaced by its value.
pub struct FoldConstCall {
    pattern: Pattern,
}

impl FoldConstCall {
    pub fn new() -> Self {
        let operand = Pattern::any(vec![Pattern::is_const(), Pattern::tuple_of(Pattern::is_const())]);
        Self { pattern: Pattern::call_repeat(OpFilter::AnyOp, operand) }
    }
}

impl Default for FoldConstCall {
    fn default() -> Self {
        Self::new()
    }
}

impl<'e> RewriteRule<FoldContext<'e>> for FoldConstCall {
    fn name(&self) -> &str {
        "fold-const-call"
    }

    fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    fn build(&self, matched: &MatchResult, graph: &mut Graph, ctx: &mut FoldContext<'e>) -> Option<ExprId> {
        let root = matched.root;
        let expected = well_typed(graph, ctx, root)?;
        let value = evaluate(self.name(), graph, ctx, root, &Bindings::new())?;
        replace(graph, ctx, root, &expected, value)
    }
}

/// `Invoke(function, consts...)` is evaluated by binding the parameters to
/// the argument values and evaluating the body.
pub struct FoldConstFunction {
    pattern: Pattern,
}

impl FoldConstFunction {
    pub fn new() -> Self {
        let function = Pattern::function(Pattern::wildcard()).named("function");
        Self { pattern: Pattern::invoke(function, Pattern::is_const()) }
    }
}

impl Default for FoldConstFunction {
    fn default() -> Self {
        Self::new()
    }
}

impl<'e> RewriteRule<FoldContext<'e>> for FoldConstFunction {
    fn name(&self) -> &str {
        "fold-const-function"
    }

    fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    fn build(&self, matched: &MatchResult, graph: &mut Graph, ctx: &mut FoldContext<'e>) -> Option<ExprId> {
        let root = matched.root;
        let expected = well_typed(graph, ctx, root)?;

        let func = graph.as_function(matched.get("function")?)?;
        let args = graph.as_call(root)?.args.get(1..)?;
        let mut bindings = Bindings::new();
        for (&param, &arg) in func.params.iter().zip(args) {
            bindings.insert(param, Value::Tensor(graph.as_const(arg)?.clone()));
        }
        let body = func.body;

        let value = evaluate(self.name(), graph, ctx, body, &bindings)?;
        replace(graph, ctx, root, &expected, value)
    }
}

/// Inferred type of `root`, or `None` if it is ill-typed.
fn well_typed(graph: &Graph, ctx: &mut FoldContext<'_>, root: ExprId) -> Option<CheckedType> {
    let ty = ctx.types.type_of(graph, root);
    if !ty.is_valid() {
        trace!(expr = %root, ty = %ty, "ill-typed, not folding");
        return None;
    }
    Some(ty.clone())
}

fn evaluate(rule: &str, graph: &Graph, ctx: &FoldContext<'_>, expr: ExprId, bindings: &Bindings) -> Option<Value> {
    match ctx.evaluate(graph, expr, bindings) {
        Ok(value) => Some(value),
        Err(error) => {
            debug!(rule, expr = %expr, %error, "evaluation failed, not folding");
            None
        }
    }
}

/// Insert `value` as constants in place of `root` if its type agrees with
/// the type `root` was inferred to have.
fn replace(
    graph: &mut Graph,
    ctx: &mut FoldContext<'_>,
    root: ExprId,
    expected: &CheckedType,
    value: Value,
) -> Option<ExprId> {
    let actual = value.checked_type();
    if !expected.accepts(&actual) {
        debug!(expr = %root, %expected, %actual, "folded value has a different type, not folding");
        return None;
    }

    let folded = materialize(graph, value);
    ctx.types.infer(graph, folded);
    Some(folded)
}

fn materialize(graph: &mut Graph, value: Value) -> ExprId {
    match value {
        Value::Tensor(tensor) => graph.constant(tensor),
        Value::Tuple(members) => {
            let fields: Vec<ExprId> = members.into_iter().map(|member| materialize(graph, member)).collect();
            graph.tuple(&fields)
        }
    }
}
