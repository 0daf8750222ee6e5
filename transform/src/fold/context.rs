use tensorfold_ir::{Bindings, EvalError, Evaluator, ExprId, Graph, TypeTable, Value};

/// Context handed to the folding rules.
///
/// Replacement nodes get their types recorded in [`FoldContext::types`], so
/// the table stays complete for everything the rewrite produces.
pub struct FoldContext<'e> {
    evaluator: &'e dyn Evaluator,
    pub types: TypeTable,
}

impl<'e> FoldContext<'e> {
    pub fn new(evaluator: &'e dyn Evaluator) -> Self {
        Self::with_types(evaluator, TypeTable::new())
    }

    /// Continue with types inferred earlier for the same graph.
    pub fn with_types(evaluator: &'e dyn Evaluator, types: TypeTable) -> Self {
        Self { evaluator, types }
    }

    pub fn evaluator(&self) -> &'e dyn Evaluator {
        self.evaluator
    }

    pub fn into_types(self) -> TypeTable {
        self.types
    }

    pub(crate) fn evaluate(&self, graph: &Graph, expr: ExprId, bindings: &Bindings) -> Result<Value, EvalError> {
        self.evaluator.evaluate(graph, expr, bindings)
    }
}
