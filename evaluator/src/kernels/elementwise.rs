use snafu::ResultExt;
use tensorfold_ir::eval::{EvalError, InvalidShapeSnafu, MalformedTensorSnafu};
use tensorfold_ir::shape::broadcast_static;
use tensorfold_ir::{BinaryOp, ConstValue, OpKind, Tensor, UnaryOp};

use super::{Index, element_count, offset, strides, unravel};
use crate::scalar::{eval_binary_op, eval_unary_op, is_int_division_by_zero};

/// Strides that read an input of `dims` at a right-aligned index of `out`.
/// Broadcast axes get stride zero.
fn broadcast_strides(dims: &[usize], out: &[usize]) -> Index {
    let own = strides(dims);
    let pad = out.len() - dims.len();
    (0..out.len())
        .map(|i| if i < pad || dims[i - pad] == 1 { 0 } else { own[i - pad] })
        .collect()
}

/// Element-wise combination of broadcast operands.
fn zip_broadcast<F>(inputs: &[&Tensor], mut f: F) -> Result<Tensor, EvalError>
where
    F: FnMut(&[ConstValue]) -> Result<ConstValue, EvalError>,
{
    let mut dims: Index = Index::from_slice(inputs[0].dims());
    for input in &inputs[1..] {
        dims = broadcast_static(&dims, input.dims()).context(InvalidShapeSnafu)?;
    }
    let input_strides: Vec<Index> = inputs.iter().map(|t| broadcast_strides(t.dims(), &dims)).collect();

    let count = element_count(&dims)?;
    let mut data = Vec::with_capacity(count);
    let mut elements = Vec::with_capacity(inputs.len());
    for flat in 0..count {
        let index = unravel(flat, &dims);
        elements.clear();
        elements.extend(inputs.iter().zip(&input_strides).map(|(t, s)| t.data()[offset(&index, s)]));
        data.push(f(&elements)?);
    }
    Tensor::new(inputs[0].dtype(), dims, data).context(MalformedTensorSnafu)
}

pub fn unary(op: UnaryOp, x: &Tensor) -> Result<Tensor, EvalError> {
    let data = x
        .data()
        .iter()
        .map(|&v| eval_unary_op(op, v).ok_or(EvalError::InvalidOperand { op: OpKind::Unary, index: 0 }))
        .collect::<Result<Vec<_>, _>>()?;
    Tensor::new(x.dtype(), x.dims(), data).context(MalformedTensorSnafu)
}

fn binary_element(op: BinaryOp, a: ConstValue, b: ConstValue) -> Result<ConstValue, EvalError> {
    eval_binary_op(op, a, b).ok_or_else(|| {
        if is_int_division_by_zero(op, b) {
            EvalError::DivisionByZero
        } else {
            EvalError::InvalidOperand { op: OpKind::Binary, index: 1 }
        }
    })
}

pub fn binary(op: BinaryOp, lhs: &Tensor, rhs: &Tensor) -> Result<Tensor, EvalError> {
    zip_broadcast(&[lhs, rhs], |v| binary_element(op, v[0], v[1]))
}

/// `min(max(x, lo), hi)` with all three operands broadcast.
pub fn clamp(x: &Tensor, lo: &Tensor, hi: &Tensor) -> Result<Tensor, EvalError> {
    zip_broadcast(&[x, lo, hi], |v| {
        let raised = binary_element(BinaryOp::Max, v[0], v[1])?;
        binary_element(BinaryOp::Min, raised, v[2])
    })
}
