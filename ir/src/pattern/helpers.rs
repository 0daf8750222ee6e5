//! Shortcuts for inspecting constant operands inside rewrite builders.

use crate::expr::{ExprId, Graph};
use crate::tensor::Tensor;

/// Tensor of `id` if it is a constant.
#[inline]
pub fn try_const(graph: &Graph, id: ExprId) -> Option<&Tensor> {
    graph.as_const(id)
}

/// Check if `id` is a constant matching `predicate`.
#[inline]
pub fn const_matches<F>(graph: &Graph, id: ExprId, predicate: F) -> bool
where
    F: FnOnce(&Tensor) -> bool,
{
    graph.as_const(id).is_some_and(predicate)
}

/// Check if `id` is a non-empty constant of zeros.
#[inline]
pub fn is_zero(graph: &Graph, id: ExprId) -> bool {
    const_matches(graph, id, |t| !t.is_empty() && t.data().iter().all(|v| v.is_zero()))
}

/// Check if `id` is a non-empty constant of ones.
#[inline]
pub fn is_one(graph: &Graph, id: ExprId) -> bool {
    const_matches(graph, id, |t| !t.is_empty() && t.data().iter().all(|v| v.is_one()))
}
