//! Bottom-up type and shape inference.
//!
//! Types live in a [`TypeTable`] side table keyed by [`ExprId`]. A node with
//! no entry has not been inferred yet. Entries are computed once from the
//! operator, its parameters, the operand types and (for value-dependent
//! operators) constant operand values, and are never overwritten.

mod rules;

use std::collections::HashMap;

use tracing::trace;

pub use rules::{ArgInfo, infer_call};

use crate::expr::{Expr, ExprId, Graph};
use crate::op::{Op, OpKind};
use crate::ty::{CheckedType, TypeError};

#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: HashMap<ExprId, CheckedType>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ExprId) -> Option<&CheckedType> {
        self.types.get(&id)
    }

    pub fn contains(&self, id: ExprId) -> bool {
        self.types.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Record `ty` for `id` unless an entry already exists. Returns the stored type.
    pub fn record(&mut self, id: ExprId, ty: CheckedType) -> &CheckedType {
        self.types.entry(id).or_insert(ty)
    }

    /// Infer every node reachable from `root` that has no type yet.
    ///
    /// Returns true if every reachable node is well typed.
    pub fn infer(&mut self, graph: &Graph, root: ExprId) -> bool {
        let mut valid = true;
        for id in graph.reachable(root) {
            if !self.types.contains_key(&id) {
                let ty = check(graph, id, self);
                trace!(expr = %id, ty = %ty, "inferred");
                self.types.insert(id, ty);
            }
            valid &= self.types[&id].is_valid();
        }
        valid
    }

    /// Type of `id`, inferring it (and its operands) on demand.
    pub fn type_of(&mut self, graph: &Graph, id: ExprId) -> &CheckedType {
        self.infer(graph, id);
        &self.types[&id]
    }
}

impl TypeTable {
    fn operand(&self, index: usize, operand: ExprId) -> Result<&CheckedType, TypeError> {
        match &self.types[&operand] {
            CheckedType::Invalid(_) => Err(TypeError::InvalidOperand { index }),
            ty => Ok(ty),
        }
    }
}

/// Free-function form of [`TypeTable::infer`].
pub fn infer_type(graph: &Graph, root: ExprId, types: &mut TypeTable) -> bool {
    types.infer(graph, root)
}

/// Type of one node whose operands are already typed.
fn check(graph: &Graph, id: ExprId, types: &TypeTable) -> CheckedType {
    let operand_type = |index, operand| types.operand(index, operand);

    let result = match graph.get(id) {
        Expr::Var(var) => Ok(CheckedType::Tensor(var.ty.clone())),
        Expr::Const(tensor) => Ok(CheckedType::Tensor(tensor.tensor_type())),
        Expr::Tuple(fields) => fields
            .iter()
            .enumerate()
            .map(|(index, &field)| match operand_type(index, field)? {
                CheckedType::Tensor(t) => Ok(t.clone()),
                _ => Err(TypeError::NestedTuple { index }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(CheckedType::Tuple),
        Expr::Function(func) => operand_type(0, func.body).cloned(),
        Expr::Call(call) => {
            let arg_types = call
                .args
                .iter()
                .enumerate()
                .map(|(index, &arg)| operand_type(index, arg))
                .collect::<Result<Vec<_>, _>>();
            arg_types.and_then(|arg_types| match call.op {
                Op::Invoke => check_invoke(graph, &call.args, &arg_types),
                _ => {
                    let args: Vec<ArgInfo<'_>> = call
                        .args
                        .iter()
                        .zip(arg_types)
                        .map(|(&arg, ty)| ArgInfo { ty, value: graph.as_const(arg) })
                        .collect();
                    infer_call(&call.op, &args)
                }
            })
        }
    };

    result.unwrap_or_else(CheckedType::Invalid)
}

fn check_invoke(graph: &Graph, args: &[ExprId], arg_types: &[&CheckedType]) -> Result<CheckedType, TypeError> {
    let Some((&target, actuals)) = args.split_first() else {
        return Err(TypeError::ArityMismatch { op: OpKind::Invoke, expected: 1, actual: 0 });
    };
    let func = graph.as_function(target).ok_or(TypeError::InvokeTargetNotFunction)?;
    if func.params.len() != actuals.len() {
        return Err(TypeError::ParameterCountMismatch { expected: func.params.len(), actual: actuals.len() });
    }

    for (index, &param) in func.params.iter().enumerate() {
        let expected = graph.get(param).as_var().map(|var| CheckedType::Tensor(var.ty.clone()));
        let accepted = expected.is_some_and(|expected| expected.accepts(arg_types[index + 1]));
        if !accepted {
            return Err(TypeError::ParameterTypeMismatch { index });
        }
    }

    Ok(arg_types[0].clone())
}
