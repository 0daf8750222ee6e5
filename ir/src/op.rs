//! Operators carried by `Call` expressions.

use std::fmt;

use smallvec::SmallVec;
use tensorfold_dtype::DataType;

use crate::types::{BinaryOp, ReduceOp, UnaryOp};

pub type Axes = SmallVec<[i64; 4]>;

/// Operator plus its static parameters.
///
/// Operands are not part of the operator; they live in the enclosing
/// [`Call`](crate::expr::Call). The expected operand layout is documented per
/// variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::EnumDiscriminants)]
#[strum_discriminants(name(OpKind), derive(Hash, strum::Display, strum::VariantArray))]
pub enum Op {
    /// `(x)`
    Unary(UnaryOp),
    /// `(lhs, rhs)`, broadcast.
    Binary(BinaryOp),
    /// `(x, min, max)`, min and max broadcast against x.
    Clamp,
    /// `(x)`
    Cast { to: DataType },
    /// `(tuple)` joined along an existing axis.
    Concat { axis: i64 },
    /// `(tuple)` joined along a new axis.
    Stack { axis: i64 },
    /// `(x, shape)` where `shape` is a rank-1 integer tensor, one entry may be -1.
    Reshape,
    /// `(x)` producing a rank-1 Int64 tensor of x's dims.
    ShapeOf,
    /// `(x, begins, ends, axes, strides)`, all rank-1 integer tensors of equal length.
    Slice,
    /// `(x)` selecting a tuple member, or a tensor slice along axis 0.
    GetItem { index: usize },
    /// `(x)` removing unit dims. Empty `axes` removes every unit dim.
    Squeeze { axes: Axes },
    /// `(x)` inserting unit dims at positions of the output.
    Unsqueeze { axes: Axes },
    /// `(x)`. Empty `perm` reverses the axes.
    Transpose { perm: SmallVec<[usize; 4]> },
    /// `(x)`. Empty `axes` reduces over every axis.
    Reduce { op: ReduceOp, axes: Axes, keep_dims: bool },
    /// `(start, limit, delta)` scalars of one dtype.
    Range,
    /// `(shape, value)` where `value` is a one-element tensor.
    ConstantOfShape,
    /// `(function, args...)`
    Invoke,
}

impl Op {
    pub fn kind(&self) -> OpKind {
        OpKind::from(self)
    }

    /// Fixed operand count, `None` for variadic operators.
    pub fn arity(&self) -> Option<usize> {
        Some(match self {
            Op::Unary(_)
            | Op::Cast { .. }
            | Op::Concat { .. }
            | Op::Stack { .. }
            | Op::ShapeOf
            | Op::GetItem { .. }
            | Op::Squeeze { .. }
            | Op::Unsqueeze { .. }
            | Op::Transpose { .. }
            | Op::Reduce { .. } => 1,
            Op::Binary(_) | Op::Reshape | Op::ConstantOfShape => 2,
            Op::Clamp | Op::Range => 3,
            Op::Slice => 5,
            Op::Invoke => return None,
        })
    }
}

impl From<UnaryOp> for Op {
    fn from(op: UnaryOp) -> Self {
        Op::Unary(op)
    }
}

impl From<BinaryOp> for Op {
    fn from(op: BinaryOp) -> Self {
        Op::Binary(op)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Unary(op) => write!(f, "{op}"),
            Op::Binary(op) => write!(f, "{op}"),
            Op::Cast { to } => write!(f, "Cast({to})"),
            Op::Concat { axis } => write!(f, "Concat(axis={axis})"),
            Op::Stack { axis } => write!(f, "Stack(axis={axis})"),
            Op::GetItem { index } => write!(f, "GetItem({index})"),
            Op::Squeeze { axes } => write!(f, "Squeeze(axes={:?})", axes.as_slice()),
            Op::Unsqueeze { axes } => write!(f, "Unsqueeze(axes={:?})", axes.as_slice()),
            Op::Transpose { perm } => write!(f, "Transpose(perm={:?})", perm.as_slice()),
            Op::Reduce { op, axes, keep_dims } => {
                write!(f, "Reduce{op}(axes={:?}, keep_dims={keep_dims})", axes.as_slice())
            }
            other => write!(f, "{}", other.kind()),
        }
    }
}
