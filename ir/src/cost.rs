//! Additive cost model over expression graphs.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use crate::expr::{Expr, ExprId, Graph};
use crate::infer::TypeTable;
use crate::op::Op;
use crate::ty::{CheckedType, TensorType};
use crate::types::BinaryOp;

/// Estimated execution cost.
///
/// Costs add component-wise, `Cost::default()` is the zero cost and
/// [`Cost::Infinite`] absorbs everything added to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cost {
    Finite { compute: u64, memory: u64 },
    Infinite,
}

impl Cost {
    pub const ZERO: Cost = Cost::Finite { compute: 0, memory: 0 };

    pub const fn new(compute: u64, memory: u64) -> Self {
        Cost::Finite { compute, memory }
    }

    pub const fn compute(compute: u64) -> Self {
        Self::new(compute, 0)
    }

    pub const fn memory(memory: u64) -> Self {
        Self::new(0, memory)
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Cost::Infinite)
    }

    /// Single scalar used to compare candidates; infinite costs compare last.
    pub fn score(&self) -> Option<u64> {
        match *self {
            Cost::Finite { compute, memory } => Some(compute.saturating_add(memory)),
            Cost::Infinite => None,
        }
    }
}

impl Default for Cost {
    fn default() -> Self {
        Cost::ZERO
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        match (self, rhs) {
            (Cost::Finite { compute: c1, memory: m1 }, Cost::Finite { compute: c2, memory: m2 }) => {
                Cost::Finite { compute: c1.saturating_add(c2), memory: m1.saturating_add(m2) }
            }
            _ => Cost::Infinite,
        }
    }
}

impl AddAssign for Cost {
    fn add_assign(&mut self, rhs: Cost) {
        *self = *self + rhs;
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::ZERO, Add::add)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cost::Finite { compute, memory } => write!(f, "Cost(compute={compute}, memory={memory})"),
            Cost::Infinite => f.write_str("Cost(inf)"),
        }
    }
}

/// Per-node cost estimate.
///
/// `types` must already hold the types of the node and its operands.
pub trait CostModel {
    fn cost(&self, graph: &Graph, expr: ExprId, types: &TypeTable) -> Cost;
}

/// Default visitor-style model.
///
/// - leaves, tuples and functions are free;
/// - elementwise operators cost one unit per output element, `Pow` with a
///   constant integer exponent `k` costs `k` units per element;
/// - reductions cost one unit per input element;
/// - data movement costs the output size in bytes as memory traffic;
/// - reshapes, squeezes, `ShapeOf` and `GetItem` are free views;
/// - `Invoke` costs the body of the called function;
/// - a call that is ill-typed or has a non-static shape costs [`Cost::Infinite`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExprCostModel;

impl CostModel for ExprCostModel {
    fn cost(&self, graph: &Graph, expr: ExprId, types: &TypeTable) -> Cost {
        let Expr::Call(call) = graph.get(expr) else {
            return Cost::ZERO;
        };
        if let Op::Invoke = call.op {
            return match call.args.first().and_then(|&target| graph.as_function(target)) {
                Some(func) => total_cost(self, graph, func.body, types),
                None => Cost::Infinite,
            };
        }

        let Some(out) = types.get(expr).filter(|ty| ty.is_static()) else {
            return Cost::Infinite;
        };
        // Static types only reach here; a missing count means the product overflowed.
        let count = |t: &TensorType| t.shape.element_count().map_or(u64::MAX, |n| n as u64);
        let elements = |ty: &CheckedType| -> u64 {
            match ty {
                CheckedType::Tensor(t) => count(t),
                CheckedType::Tuple(members) => members.iter().map(count).fold(0, u64::saturating_add),
                CheckedType::Invalid(_) => 0,
            }
        };
        let bytes = |ty: &CheckedType| -> u64 {
            match ty {
                CheckedType::Tensor(t) => count(t).saturating_mul(t.dtype.bytes() as u64),
                CheckedType::Tuple(members) => {
                    members.iter().map(|t| count(t).saturating_mul(t.dtype.bytes() as u64)).fold(0, u64::saturating_add)
                }
                CheckedType::Invalid(_) => 0,
            }
        };

        match &call.op {
            Op::Binary(BinaryOp::Pow) => {
                let per_element = graph
                    .as_const(call.args[1])
                    .and_then(|t| t.as_scalar())
                    .filter(|k| k.as_f64().fract() == 0.0)
                    .map_or(1, |k| k.as_i64().unsigned_abs().max(1));
                Cost::compute(per_element.saturating_mul(elements(out)))
            }
            Op::Unary(_) | Op::Binary(_) | Op::Clamp | Op::Cast { .. } => Cost::compute(elements(out)),
            Op::Reduce { .. } => match types.get(call.args[0]).filter(|ty| ty.is_static()) {
                Some(input) => Cost::compute(elements(input)),
                None => Cost::Infinite,
            },
            Op::Concat { .. } | Op::Stack { .. } | Op::Slice | Op::Transpose { .. } | Op::Range | Op::ConstantOfShape => {
                Cost::memory(bytes(out))
            }
            Op::Reshape | Op::ShapeOf | Op::GetItem { .. } | Op::Squeeze { .. } | Op::Unsqueeze { .. } => Cost::ZERO,
            Op::Invoke => Cost::ZERO,
        }
    }
}

/// Sum of node costs below `root`.
///
/// Function bodies are not entered; they are paid for by each `Invoke`.
pub fn total_cost(model: &impl CostModel, graph: &Graph, root: ExprId, types: &TypeTable) -> Cost {
    let mut seen = vec![false; root.index() + 1];
    let mut stack = vec![root];
    seen[root.index()] = true;
    let mut cost = Cost::ZERO;
    while let Some(id) = stack.pop() {
        cost += model.cost(graph, id, types);
        if let Expr::Function(_) = graph.get(id) {
            continue;
        }
        for operand in graph.operands(id) {
            if !seen[operand.index()] {
                seen[operand.index()] = true;
                stack.push(operand);
            }
        }
    }
    cost
}
