use std::collections::HashMap;

use snafu::{OptionExt, ResultExt};
use tensorfold_ir::eval::{
    Bindings, EvalError, Evaluator, IllTypedSnafu, InvalidOperandSnafu, NotCallableSnafu, UnboundVariableSnafu,
};
use tensorfold_ir::infer::{ArgInfo, infer_call};
use tensorfold_ir::{Call, CheckedType, Expr, ExprId, Graph, Op, OpKind, TypeError, Value};
use tracing::trace;

use crate::kernels;

/// Evaluates expressions node by node on host tensors.
///
/// Every call is checked with the inference rules before its kernel runs, so
/// ill-typed sub-expressions fail with [`EvalError::IllTyped`] instead of
/// producing a value of the wrong shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceEvaluator;

impl ReferenceEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for ReferenceEvaluator {
    fn evaluate(&self, graph: &Graph, expr: ExprId, bindings: &Bindings) -> Result<Value, EvalError> {
        if graph.as_function(expr).is_some() {
            return NotCallableSnafu { expr }.fail();
        }

        let mut values: HashMap<ExprId, Value> = HashMap::new();
        for id in schedule(graph, expr) {
            let value = match graph.get(id) {
                // Only reachable as an `Invoke` target, which reads the node itself.
                Expr::Function(_) => continue,
                Expr::Var(_) => bindings.get(&id).cloned().context(UnboundVariableSnafu { var: id })?,
                Expr::Const(tensor) => Value::Tensor(tensor.clone()),
                Expr::Tuple(fields) => {
                    Value::Tuple(fields.iter().map(|&f| value_of(&values, f).cloned()).collect::<Result<_, _>>()?)
                }
                Expr::Call(call) => self.call(graph, id, call, &values, bindings)?,
            };
            trace!(expr = %id, "evaluated");
            values.insert(id, value);
        }

        values.remove(&expr).context(NotCallableSnafu { expr })
    }
}

impl ReferenceEvaluator {
    fn call(
        &self,
        graph: &Graph,
        id: ExprId,
        call: &Call,
        values: &HashMap<ExprId, Value>,
        bindings: &Bindings,
    ) -> Result<Value, EvalError> {
        if matches!(call.op, Op::Invoke) {
            return self.invoke(graph, id, call, values, bindings);
        }

        let args = call.args.iter().map(|&arg| value_of(values, arg)).collect::<Result<Vec<_>, _>>()?;
        let types: Vec<CheckedType> = args.iter().map(|v| v.checked_type()).collect();
        let infos: Vec<ArgInfo<'_>> =
            args.iter().zip(&types).map(|(v, ty)| ArgInfo { ty, value: v.as_tensor() }).collect();
        let out = infer_call(&call.op, &infos).context(IllTypedSnafu { expr: id })?;

        kernels::apply(&call.op, &args, &out)
    }

    /// Bind the function parameters to the argument values and evaluate the body.
    fn invoke(
        &self,
        graph: &Graph,
        id: ExprId,
        call: &Call,
        values: &HashMap<ExprId, Value>,
        bindings: &Bindings,
    ) -> Result<Value, EvalError> {
        let Some((&target, actuals)) = call.args.split_first() else {
            return InvalidOperandSnafu { op: OpKind::Invoke, index: 0usize }.fail();
        };
        let func = graph.as_function(target).context(InvalidOperandSnafu { op: OpKind::Invoke, index: 0usize })?;
        if func.params.len() != actuals.len() {
            let source = TypeError::ParameterCountMismatch { expected: func.params.len(), actual: actuals.len() };
            return Err(EvalError::IllTyped { expr: id, source });
        }

        let mut inner = bindings.clone();
        for (index, (&param, &actual)) in func.params.iter().zip(actuals).enumerate() {
            let value = value_of(values, actual)?;
            let accepted = graph
                .get(param)
                .as_var()
                .is_some_and(|var| CheckedType::Tensor(var.ty.clone()).accepts(&value.checked_type()));
            if !accepted {
                return Err(EvalError::IllTyped { expr: id, source: TypeError::ParameterTypeMismatch { index } });
            }
            inner.insert(param, value.clone());
        }

        trace!(function = %func.name, expr = %id, "invoking");
        self.evaluate(graph, func.body, &inner)
    }
}

fn value_of(values: &HashMap<ExprId, Value>, id: ExprId) -> Result<&Value, EvalError> {
    values.get(&id).context(NotCallableSnafu { expr: id })
}

/// Nodes needed to evaluate `root`, operands first. Function bodies are not
/// entered; they are evaluated per `Invoke` with their own bindings.
fn schedule(graph: &Graph, root: ExprId) -> Vec<ExprId> {
    let mut seen = vec![false; root.index() + 1];
    let mut stack = vec![root];
    seen[root.index()] = true;
    while let Some(id) = stack.pop() {
        if graph.as_function(id).is_some() {
            continue;
        }
        for operand in graph.operands(id) {
            if !seen[operand.index()] {
                seen[operand.index()] = true;
                stack.push(operand);
            }
        }
    }
    graph.ids().take(seen.len()).filter(|id| seen[id.index()]).collect()
}
