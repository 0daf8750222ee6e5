use snafu::ResultExt;
use tensorfold_ir::eval::{EvalError, InvalidShapeSnafu, MalformedTensorSnafu};
use tensorfold_ir::shape::resolve_reduce_axes;
use tensorfold_ir::{BinaryOp, ConstValue, OpKind, ReduceOp, Tensor};

use super::{Index, element_count, offset, strides, unravel};
use crate::scalar::{eval_binary_op, eval_reduce_step};

/// Reduce `x` over `axes` (all axes when empty).
///
/// Empty reductions yield the identity of `Sum` and `Prod`; `Mean`, `Max` and
/// `Min` of nothing are rejected.
pub fn reduce(op: ReduceOp, x: &Tensor, axes: &[i64], keep_dims: bool) -> Result<Tensor, EvalError> {
    let axes = resolve_reduce_axes(axes, x.rank()).context(InvalidShapeSnafu)?;
    let invalid = || EvalError::InvalidOperand { op: OpKind::Reduce, index: 0 };

    // Accumulator layout keeps reduced axes at size 1; `keep_dims` only decides
    // the dims reported at the end.
    let kept: Index = x.dims().iter().enumerate().map(|(i, &d)| if axes.contains(&i) { 1 } else { d }).collect();
    let acc_strides = strides(&kept);
    let mut acc: Vec<Option<ConstValue>> = vec![None; element_count(&kept)?];

    for (flat, &v) in x.data().iter().enumerate() {
        let mut index = unravel(flat, x.dims());
        for &axis in &axes {
            index[axis] = 0;
        }
        let slot = &mut acc[offset(&index, &acc_strides)];
        *slot = Some(match *slot {
            None => v,
            Some(prev) => eval_reduce_step(op, prev, v).ok_or_else(invalid)?,
        });
    }

    let reduced: Index = axes.iter().map(|&a| x.dims()[a]).collect();
    let count = element_count(&reduced)?;
    let dtype = x.dtype();
    let data = acc
        .into_iter()
        .map(|slot| match (op, slot) {
            (ReduceOp::Mean, Some(sum)) => {
                let divisor = ConstValue::UInt(count as u64).cast(dtype);
                eval_binary_op(BinaryOp::Div, sum, divisor).ok_or_else(invalid)
            }
            (_, Some(value)) => Ok(value),
            (ReduceOp::Sum, None) => Ok(ConstValue::zero(dtype)),
            (ReduceOp::Prod, None) => Ok(ConstValue::one(dtype)),
            (_, None) => Err(invalid()),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let dims: Index = if keep_dims {
        kept
    } else {
        x.dims().iter().enumerate().filter(|(i, _)| !axes.contains(i)).map(|(_, &d)| d).collect()
    };
    Tensor::new(dtype, dims, data).context(MalformedTensorSnafu)
}
