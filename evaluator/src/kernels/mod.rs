//! Tensor kernels, one module per operator family.
//!
//! Kernels run after the call has been type checked, so they only re-validate
//! what the typing rules cannot see (element values, index bounds).

mod elementwise;
mod movement;
mod reduce;

use smallvec::SmallVec;
use snafu::{OptionExt, ResultExt};
use tensorfold_ir::eval::{EvalError, InvalidOperandSnafu, InvalidShapeSnafu, MalformedTensorSnafu, UnsupportedOpSnafu};
use tensorfold_ir::shape;
use tensorfold_ir::{CheckedType, ConstValue, Op, OpKind, Tensor, Value};

pub use elementwise::{binary, clamp, unary};
pub use movement::{concat, constant_of_shape, get_item, range, slice, stack, transpose};
pub use reduce::reduce;

pub(crate) type Index = SmallVec<[usize; 4]>;

/// Row-major strides of `dims`.
pub(crate) fn strides(dims: &[usize]) -> Index {
    let mut strides = Index::from_elem(1, dims.len());
    for i in (0..dims.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * dims[i + 1];
    }
    strides
}

/// Multi-index of the `flat`-th element of a row-major tensor with `dims`.
pub(crate) fn unravel(mut flat: usize, dims: &[usize]) -> Index {
    let mut index = Index::from_elem(0, dims.len());
    for (i, &dim) in dims.iter().enumerate().rev() {
        if dim > 0 {
            index[i] = flat % dim;
            flat /= dim;
        }
    }
    index
}

pub(crate) fn element_count(dims: &[usize]) -> Result<usize, EvalError> {
    shape::element_count(dims).context(InvalidShapeSnafu)
}

pub(crate) fn offset(index: &[usize], strides: &[usize]) -> usize {
    index.iter().zip(strides).map(|(i, s)| i * s).sum()
}

/// Run the kernel of `op` over evaluated operands.
///
/// `out` is the type the typing rules assigned to the call; view operators
/// (reshape, squeeze, unsqueeze) take their result dims from it.
pub fn apply(op: &Op, args: &[&Value], out: &CheckedType) -> Result<Value, EvalError> {
    let tensor = match op {
        Op::Unary(uop) => unary(*uop, tensor_arg(op, args, 0)?)?,
        Op::Binary(bop) => binary(*bop, tensor_arg(op, args, 0)?, tensor_arg(op, args, 1)?)?,
        Op::Clamp => clamp(tensor_arg(op, args, 0)?, tensor_arg(op, args, 1)?, tensor_arg(op, args, 2)?)?,
        Op::Cast { to } => tensor_arg(op, args, 0)?.cast(*to),
        Op::Concat { axis } => concat(&tuple_arg(op, args, 0)?, *axis)?,
        Op::Stack { axis } => stack(&tuple_arg(op, args, 0)?, *axis)?,
        Op::Reshape | Op::Squeeze { .. } | Op::Unsqueeze { .. } => {
            let dims = out.as_tensor().and_then(|t| t.shape.to_static()).context(InvalidOperandSnafu {
                op: op.kind(),
                index: 0usize,
            })?;
            tensor_arg(op, args, 0)?.reshaped(&dims).context(MalformedTensorSnafu)?
        }
        Op::ShapeOf => {
            let dims: Vec<i64> = tensor_arg(op, args, 0)?.dims().iter().map(|&d| d as i64).collect();
            Tensor::from_i64s(&dims)
        }
        Op::Slice => slice(
            tensor_arg(op, args, 0)?,
            &int_arg(op, args, 1)?,
            &int_arg(op, args, 2)?,
            &int_arg(op, args, 3)?,
            &int_arg(op, args, 4)?,
        )?,
        Op::GetItem { index } => return get_item(args[0], *index),
        Op::Transpose { perm } => transpose(tensor_arg(op, args, 0)?, perm)?,
        Op::Reduce { op: rop, axes, keep_dims } => reduce(*rop, tensor_arg(op, args, 0)?, axes, *keep_dims)?,
        Op::Range => {
            let start = tensor_arg(op, args, 0)?;
            range(start.dtype(), scalar_arg(op, args, 0)?, scalar_arg(op, args, 1)?, scalar_arg(op, args, 2)?)?
        }
        Op::ConstantOfShape => constant_of_shape(&int_arg(op, args, 0)?, tensor_arg(op, args, 1)?)?,
        Op::Invoke => return UnsupportedOpSnafu { op: OpKind::Invoke }.fail(),
    };
    Ok(Value::Tensor(tensor))
}

fn tensor_arg<'a>(op: &Op, args: &[&'a Value], index: usize) -> Result<&'a Tensor, EvalError> {
    args.get(index).and_then(|v| v.as_tensor()).context(InvalidOperandSnafu { op: op.kind(), index })
}

fn tuple_arg<'a>(op: &Op, args: &[&'a Value], index: usize) -> Result<Vec<&'a Tensor>, EvalError> {
    match args.get(index) {
        Some(Value::Tuple(members)) => members
            .iter()
            .map(|m| m.as_tensor().context(InvalidOperandSnafu { op: op.kind(), index }))
            .collect(),
        _ => InvalidOperandSnafu { op: op.kind(), index }.fail(),
    }
}

fn int_arg(op: &Op, args: &[&Value], index: usize) -> Result<Vec<i64>, EvalError> {
    tensor_arg(op, args, index)?.to_i64_vec().context(InvalidOperandSnafu { op: op.kind(), index })
}

fn scalar_arg(op: &Op, args: &[&Value], index: usize) -> Result<ConstValue, EvalError> {
    tensor_arg(op, args, index)?.as_scalar().context(InvalidOperandSnafu { op: op.kind(), index })
}
