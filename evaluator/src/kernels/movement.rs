use snafu::{OptionExt, ResultExt};
use tensorfold_dtype::DataType;
use tensorfold_ir::eval::{EvalError, InvalidShapeSnafu, MalformedTensorSnafu};
use tensorfold_ir::shape::{SliceRange, normalize_axes, normalize_axis, range_len, resolve_perm, slice_range};
use tensorfold_ir::ty::{IndexOutOfRangeSnafu, LengthMismatchSnafu, NegativeDimSnafu, ShapeOverflowSnafu};
use tensorfold_ir::{BinaryOp, ConstValue, OpKind, Tensor, Value};

use super::{Index, element_count, offset, strides, unravel};
use crate::scalar::eval_binary_op;

/// Copy the elements of `x` selected by `source` for every output index.
fn gather(x: &Tensor, out_dims: &[usize], mut source: impl FnMut(&[usize]) -> usize) -> Result<Tensor, EvalError> {
    let count = element_count(out_dims)?;
    let data = (0..count).map(|flat| x.data()[source(&unravel(flat, out_dims))]);
    Tensor::new(x.dtype(), out_dims, data).context(MalformedTensorSnafu)
}

pub fn concat(members: &[&Tensor], axis: i64) -> Result<Tensor, EvalError> {
    let first = members.first().ok_or(EvalError::InvalidOperand { op: OpKind::Concat, index: 0 })?;
    let axis = normalize_axis(axis, first.rank()).context(InvalidShapeSnafu)?;

    let mut dims = Index::from_slice(first.dims());
    dims[axis] = members
        .iter()
        .try_fold(0usize, |acc, m| acc.checked_add(m.dims()[axis]))
        .with_context(|| ShapeOverflowSnafu { dims: members.iter().map(|m| m.dims()[axis] as i64).collect::<Vec<_>>() })
        .context(InvalidShapeSnafu)?;
    let outer = element_count(&first.dims()[..axis])?;

    let mut data = Vec::with_capacity(element_count(&dims)?);
    for o in 0..outer {
        for member in members {
            let block = element_count(&member.dims()[axis..])?;
            data.extend_from_slice(&member.data()[o * block..(o + 1) * block]);
        }
    }
    Tensor::new(first.dtype(), dims, data).context(MalformedTensorSnafu)
}

pub fn stack(members: &[&Tensor], axis: i64) -> Result<Tensor, EvalError> {
    let first = members.first().ok_or(EvalError::InvalidOperand { op: OpKind::Stack, index: 0 })?;
    let axis = normalize_axis(axis, first.rank() + 1).context(InvalidShapeSnafu)?;

    let expanded = members
        .iter()
        .map(|m| {
            let mut dims = Index::from_slice(m.dims());
            dims.insert(axis, 1);
            m.reshaped(&dims).context(MalformedTensorSnafu)
        })
        .collect::<Result<Vec<_>, _>>()?;
    concat(&expanded.iter().collect::<Vec<_>>(), axis as i64)
}

/// ONNX-style slice. Axes not listed in `axes` are kept whole.
pub fn slice(x: &Tensor, begins: &[i64], ends: &[i64], axes: &[i64], steps: &[i64]) -> Result<Tensor, EvalError> {
    for list in [ends, axes, steps] {
        if list.len() != begins.len() {
            return LengthMismatchSnafu { expected: begins.len(), actual: list.len() }
                .fail()
                .context(InvalidShapeSnafu);
        }
    }
    let axes = normalize_axes(axes, x.rank()).context(InvalidShapeSnafu)?;

    let mut ranges: Vec<SliceRange> =
        x.dims().iter().map(|&dim| SliceRange { start: 0, step: 1, len: dim }).collect();
    for (i, &axis) in axes.iter().enumerate() {
        ranges[axis] = slice_range(x.dims()[axis], begins[i], ends[i], steps[i]).context(InvalidShapeSnafu)?;
    }

    let out_dims: Index = ranges.iter().map(|r| r.len).collect();
    let in_strides = strides(x.dims());
    gather(x, &out_dims, |index| {
        index
            .iter()
            .zip(&ranges)
            .zip(&in_strides)
            .map(|((&i, r), s)| (r.start + i as i64 * r.step) as usize * s)
            .sum()
    })
}

pub fn transpose(x: &Tensor, perm: &[usize]) -> Result<Tensor, EvalError> {
    let perm = resolve_perm(perm, x.rank()).context(InvalidShapeSnafu)?;
    let out_dims: Index = perm.iter().map(|&p| x.dims()[p]).collect();
    let in_strides = strides(x.dims());
    // Output axis k walks input axis perm[k].
    let permuted: Index = perm.iter().map(|&p| in_strides[p]).collect();
    gather(x, &out_dims, |index| offset(index, &permuted))
}

/// Member `index` of a tuple, or row `index` along axis 0 of a tensor.
pub fn get_item(value: &Value, index: usize) -> Result<Value, EvalError> {
    match value {
        Value::Tuple(members) => members
            .get(index)
            .cloned()
            .ok_or(IndexOutOfRangeSnafu { index, len: members.len() }.build())
            .context(InvalidShapeSnafu),
        Value::Tensor(x) => {
            let Some((&len, rest)) = x.dims().split_first() else {
                return Err(EvalError::InvalidOperand { op: OpKind::GetItem, index: 0 });
            };
            if index >= len {
                return IndexOutOfRangeSnafu { index, len }.fail().context(InvalidShapeSnafu);
            }
            let block = element_count(rest)?;
            let data = x.data()[index * block..(index + 1) * block].iter().copied();
            Tensor::new(x.dtype(), rest, data).map(Value::Tensor).context(MalformedTensorSnafu)
        }
    }
}

/// `start, start + delta, ...` up to (excluding) `limit`, in `dtype`.
pub fn range(dtype: DataType, start: ConstValue, limit: ConstValue, delta: ConstValue) -> Result<Tensor, EvalError> {
    let len = range_len(start, limit, delta).context(InvalidShapeSnafu)?;
    let (start, delta) = (start.cast(dtype), delta.cast(dtype));
    let data = (0..len)
        .map(|i| {
            let step = ConstValue::Int(i as i64).cast(dtype);
            eval_binary_op(BinaryOp::Mul, step, delta)
                .and_then(|shift| eval_binary_op(BinaryOp::Add, start, shift))
                .ok_or(EvalError::InvalidOperand { op: OpKind::Range, index: 2 })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Tensor::new(dtype, [len].as_slice(), data).context(MalformedTensorSnafu)
}

/// Tensor of `dims` filled with the single element of `value`.
pub fn constant_of_shape(dims: &[i64], value: &Tensor) -> Result<Tensor, EvalError> {
    let fill = value.as_scalar().ok_or(EvalError::InvalidOperand { op: OpKind::ConstantOfShape, index: 1 })?;
    let dims = dims
        .iter()
        .map(|&d| usize::try_from(d).map_err(|_| NegativeDimSnafu { dim: d }.build()))
        .collect::<Result<Vec<_>, _>>()
        .context(InvalidShapeSnafu)?;
    Tensor::full(value.dtype(), &dims, fill).context(MalformedTensorSnafu)
}
