//! Per-operator typing rules.
//!
//! Every rule is a pure function of the operator parameters, the operand types
//! and, for value-dependent operators, the values of constant operands.

use smallvec::SmallVec;
use snafu::{OptionExt, ensure};
use tensorfold_dtype::DataType;

use crate::op::Op;
use crate::shape::{
    self, Dim, DimVec, Shape, broadcast, normalize_axes, normalize_axis, resolve_perm, resolve_reduce_axes, resolve_reshape,
};
use crate::tensor::Tensor;
use crate::ty::*;
use crate::types::{ReduceOp, UnaryOp};

/// What a typing rule knows about one operand.
#[derive(Debug, Clone, Copy)]
pub struct ArgInfo<'a> {
    pub ty: &'a CheckedType,
    /// Present when the operand is a `Const`.
    pub value: Option<&'a Tensor>,
}

type Rule = Result<CheckedType, TypeError>;

/// Type of a call to `op` over `args`. `Invoke` needs the graph and is
/// handled by the caller.
pub fn infer_call(op: &Op, args: &[ArgInfo<'_>]) -> Rule {
    if let Some(expected) = op.arity() {
        ensure!(args.len() == expected, ArityMismatchSnafu { op: op.kind(), expected, actual: args.len() });
    }

    match op {
        Op::Unary(uop) => unary(*uop, tensor(args, 0)?),
        Op::Binary(_) => {
            let (lhs, rhs) = (tensor(args, 0)?, tensor(args, 1)?);
            ensure!(lhs.dtype == rhs.dtype, DTypeMismatchSnafu { lhs: lhs.dtype, rhs: rhs.dtype });
            ensure!(lhs.dtype.is_numeric(), ExpectedNumericDTypeSnafu { dtype: lhs.dtype });
            Ok(TensorType::new(lhs.dtype, broadcast(&lhs.shape, &rhs.shape)?).into())
        }
        Op::Clamp => {
            let x = tensor(args, 0)?;
            let mut shape = x.shape.clone();
            for index in 1..3 {
                let bound = tensor(args, index)?;
                ensure!(bound.dtype == x.dtype, DTypeMismatchSnafu { lhs: x.dtype, rhs: bound.dtype });
                shape = broadcast(&shape, &bound.shape)?;
            }
            ensure!(x.dtype.is_numeric(), ExpectedNumericDTypeSnafu { dtype: x.dtype });
            Ok(TensorType::new(x.dtype, shape).into())
        }
        Op::Cast { to } => Ok(TensorType::new(*to, tensor(args, 0)?.shape.clone()).into()),
        Op::Concat { axis } => concat(*axis, tuple(args, 0)?),
        Op::Stack { axis } => stack(*axis, tuple(args, 0)?),
        Op::Reshape => reshape(tensor(args, 0)?, args[1]),
        Op::ShapeOf => {
            let len = tensor(args, 0)?.shape.rank().map_or(Dim::Unknown, Dim::Fixed);
            Ok(TensorType::new(DataType::Int64, Shape::Ranked(smallvec::smallvec![len])).into())
        }
        Op::Slice => slice(tensor(args, 0)?, &args[1..]),
        Op::GetItem { index } => get_item(*index, args[0].ty),
        Op::Squeeze { axes } => squeeze(tensor(args, 0)?, axes),
        Op::Unsqueeze { axes } => unsqueeze(tensor(args, 0)?, axes),
        Op::Transpose { perm } => transpose(tensor(args, 0)?, perm),
        Op::Reduce { op, axes, keep_dims } => reduce(*op, tensor(args, 0)?, axes, *keep_dims),
        Op::Range => range(args),
        Op::ConstantOfShape => constant_of_shape(args),
        Op::Invoke => InvokeTargetNotFunctionSnafu.fail(),
    }
}

fn tensor<'a>(args: &[ArgInfo<'a>], index: usize) -> Result<&'a TensorType, TypeError> {
    match args[index].ty {
        CheckedType::Tensor(t) => Ok(t),
        CheckedType::Invalid(_) => InvalidOperandSnafu { index }.fail(),
        CheckedType::Tuple(_) => ExpectedTensorSnafu { index }.fail(),
    }
}

fn tuple<'a>(args: &[ArgInfo<'a>], index: usize) -> Result<&'a [TensorType], TypeError> {
    match args[index].ty {
        CheckedType::Tuple(members) => {
            ensure!(!members.is_empty(), EmptyTupleSnafu);
            Ok(members)
        }
        CheckedType::Invalid(_) => InvalidOperandSnafu { index }.fail(),
        CheckedType::Tensor(_) => ExpectedTupleSnafu { index }.fail(),
    }
}

/// Integer contents of a rank-1 (or scalar) integer operand, if it is constant.
fn int_values(arg: ArgInfo<'_>, index: usize) -> Result<Option<Vec<i64>>, TypeError> {
    let ty = match arg.ty {
        CheckedType::Tensor(t) => t,
        CheckedType::Invalid(_) => return InvalidOperandSnafu { index }.fail(),
        CheckedType::Tuple(_) => return ExpectedTensorSnafu { index }.fail(),
    };
    ensure!(ty.dtype.is_int(), ExpectedIntegerDTypeSnafu { dtype: ty.dtype });
    if let Some(rank) = ty.shape.rank() {
        ensure!(rank <= 1, RankMismatchSnafu { expected: 1usize, actual: rank });
    }
    Ok(arg.value.and_then(Tensor::to_i64_vec))
}

/// Length of a rank-1 operand known from its type alone.
fn static_len(arg: ArgInfo<'_>) -> Option<usize> {
    match arg.ty.as_tensor()?.shape.dims()? {
        [Dim::Fixed(n)] => Some(*n),
        _ => None,
    }
}

/// Merge two dims already known to be compatible, preferring the fixed one.
fn merge(a: Dim, b: Dim) -> Dim {
    match a {
        Dim::Unknown => b,
        fixed => fixed,
    }
}

fn unary(op: UnaryOp, x: &TensorType) -> Rule {
    match op {
        UnaryOp::Abs | UnaryOp::Neg => {
            ensure!(x.dtype.is_numeric(), ExpectedNumericDTypeSnafu { dtype: x.dtype });
        }
        _ => {
            ensure!(x.dtype.is_float(), ExpectedFloatDTypeSnafu { dtype: x.dtype });
        }
    }
    Ok(x.clone().into())
}

fn concat(axis: i64, members: &[TensorType]) -> Rule {
    let first = &members[0];
    for (index, member) in members.iter().enumerate().skip(1) {
        ensure!(member.dtype == first.dtype, DTypeMismatchSnafu { lhs: first.dtype, rhs: member.dtype });
        if let (Some(a), Some(b)) = (first.shape.rank(), member.shape.rank()) {
            ensure!(a == b, ConcatShapeMismatchSnafu { index });
        }
    }
    let Some(ranked) = members.iter().map(|m| m.shape.dims()).collect::<Option<Vec<_>>>() else {
        return Ok(TensorType::unranked(first.dtype).into());
    };

    let rank = ranked[0].len();
    let axis = normalize_axis(axis, rank)?;
    let mut out: DimVec = ranked[0].iter().copied().collect();
    for (index, dims) in ranked.iter().enumerate().skip(1) {
        for (i, &dim) in dims.iter().enumerate() {
            if i == axis {
                out[i] = match (out[i], dim) {
                    (Dim::Fixed(a), Dim::Fixed(b)) => {
                        Dim::Fixed(a.checked_add(b).context(ShapeOverflowSnafu { dims: vec![a as i64, b as i64] })?)
                    }
                    _ => Dim::Unknown,
                };
            } else {
                ensure!(out[i].accepts(dim), ConcatShapeMismatchSnafu { index });
                out[i] = merge(out[i], dim);
            }
        }
    }
    Ok(TensorType::new(first.dtype, Shape::Ranked(out)).into())
}

fn stack(axis: i64, members: &[TensorType]) -> Rule {
    let first = &members[0];
    let mut shape = first.shape.clone();
    for (index, member) in members.iter().enumerate().skip(1) {
        ensure!(member.dtype == first.dtype, DTypeMismatchSnafu { lhs: first.dtype, rhs: member.dtype });
        ensure!(shape.accepts(&member.shape), StackShapeMismatchSnafu { index });
        shape = match (shape, &member.shape) {
            (Shape::Ranked(a), Shape::Ranked(b)) => Shape::Ranked(a.iter().zip(b).map(|(&x, &y)| merge(x, y)).collect()),
            (Shape::Unranked, other) => other.clone(),
            (ranked, Shape::Unranked) => ranked,
        };
    }
    let Shape::Ranked(mut dims) = shape else {
        return Ok(TensorType::unranked(first.dtype).into());
    };

    let axis = normalize_axis(axis, dims.len() + 1)?;
    dims.insert(axis, Dim::Fixed(members.len()));
    Ok(TensorType::new(first.dtype, Shape::Ranked(dims)).into())
}

fn reshape(x: &TensorType, target: ArgInfo<'_>) -> Rule {
    let input_count = match x.shape.to_static() {
        Some(dims) => Some(shape::element_count(&dims)?),
        None => None,
    };
    let shape = match int_values(target, 1)? {
        Some(values) => Shape::Ranked(resolve_reshape(input_count, &values)?),
        None => static_len(target).map_or(Shape::Unranked, Shape::unknown),
    };
    Ok(TensorType::new(x.dtype, shape).into())
}

fn slice(x: &TensorType, params: &[ArgInfo<'_>]) -> Rule {
    let mut values = SmallVec::<[Option<Vec<i64>>; 4]>::new();
    for (offset, &param) in params.iter().enumerate() {
        values.push(int_values(param, offset + 1)?);
    }
    let Some(dims) = x.shape.dims() else {
        return Ok(TensorType::unranked(x.dtype).into());
    };
    let [Some(begins), Some(ends), Some(axes), Some(strides)] = values.as_slice() else {
        return Ok(TensorType::new(x.dtype, Shape::unknown(dims.len())).into());
    };

    for list in [ends, axes, strides] {
        ensure!(list.len() == begins.len(), LengthMismatchSnafu { expected: begins.len(), actual: list.len() });
    }
    let axes = normalize_axes(axes, dims.len())?;

    let mut out: DimVec = dims.iter().copied().collect();
    for (i, &axis) in axes.iter().enumerate() {
        out[axis] = match dims[axis] {
            Dim::Fixed(n) => Dim::Fixed(shape::slice_range(n, begins[i], ends[i], strides[i])?.len),
            Dim::Unknown => {
                ensure!(strides[i] != 0, ZeroStepSnafu);
                Dim::Unknown
            }
        };
    }
    Ok(TensorType::new(x.dtype, Shape::Ranked(out)).into())
}

fn get_item(index: usize, ty: &CheckedType) -> Rule {
    match ty {
        CheckedType::Tuple(members) => {
            let member = members.get(index).ok_or(TypeError::IndexOutOfRange { index, len: members.len() })?;
            Ok(member.clone().into())
        }
        CheckedType::Tensor(t) => {
            let Some(dims) = t.shape.dims() else {
                return Ok(TensorType::unranked(t.dtype).into());
            };
            let (&first, rest) = dims.split_first().ok_or(TypeError::AxisOutOfRange { axis: 0, rank: 0 })?;
            if let Dim::Fixed(len) = first {
                ensure!(index < len, IndexOutOfRangeSnafu { index, len });
            }
            Ok(TensorType::new(t.dtype, Shape::Ranked(rest.iter().copied().collect())).into())
        }
        CheckedType::Invalid(_) => InvalidOperandSnafu { index: 0usize }.fail(),
    }
}

fn squeeze(x: &TensorType, axes: &[i64]) -> Rule {
    let Some(dims) = x.shape.dims() else {
        return Ok(TensorType::unranked(x.dtype).into());
    };

    if axes.is_empty() {
        if dims.contains(&Dim::Unknown) {
            return Ok(TensorType::unranked(x.dtype).into());
        }
        let out = dims.iter().copied().filter(|&d| d != Dim::Fixed(1)).collect();
        return Ok(TensorType::new(x.dtype, Shape::Ranked(out)).into());
    }

    let axes = normalize_axes(axes, dims.len())?;
    for &axis in &axes {
        if let Dim::Fixed(dim) = dims[axis] {
            ensure!(dim == 1, SqueezeNonUnitDimSnafu { axis, dim });
        }
    }
    let out = dims.iter().enumerate().filter(|(i, _)| !axes.contains(i)).map(|(_, &d)| d).collect();
    Ok(TensorType::new(x.dtype, Shape::Ranked(out)).into())
}

fn unsqueeze(x: &TensorType, axes: &[i64]) -> Rule {
    let Some(dims) = x.shape.dims() else {
        return Ok(TensorType::unranked(x.dtype).into());
    };

    let rank = dims.len() + axes.len();
    let axes = normalize_axes(axes, rank)?;
    let mut rest = dims.iter();
    let out = (0..rank)
        .map(|i| if axes.contains(&i) { Dim::Fixed(1) } else { rest.next().copied().unwrap_or(Dim::Unknown) })
        .collect();
    Ok(TensorType::new(x.dtype, Shape::Ranked(out)).into())
}

fn transpose(x: &TensorType, perm: &[usize]) -> Rule {
    let Some(dims) = x.shape.dims() else {
        return Ok(TensorType::unranked(x.dtype).into());
    };
    let perm = resolve_perm(perm, dims.len())?;
    Ok(TensorType::new(x.dtype, Shape::Ranked(perm.iter().map(|&p| dims[p]).collect())).into())
}

fn reduce(_op: ReduceOp, x: &TensorType, axes: &[i64], keep_dims: bool) -> Rule {
    ensure!(x.dtype.is_numeric(), ExpectedNumericDTypeSnafu { dtype: x.dtype });
    let Some(dims) = x.shape.dims() else {
        return Ok(TensorType::unranked(x.dtype).into());
    };

    let axes = resolve_reduce_axes(axes, dims.len())?;
    let out = dims
        .iter()
        .enumerate()
        .filter_map(|(i, &d)| match (axes.contains(&i), keep_dims) {
            (false, _) => Some(d),
            (true, true) => Some(Dim::Fixed(1)),
            (true, false) => None,
        })
        .collect();
    Ok(TensorType::new(x.dtype, Shape::Ranked(out)).into())
}

fn range(args: &[ArgInfo<'_>]) -> Rule {
    let start = tensor(args, 0)?;
    for index in 0..3 {
        let t = tensor(args, index)?;
        ensure!(t.dtype == start.dtype, DTypeMismatchSnafu { lhs: start.dtype, rhs: t.dtype });
        if let Some(rank) = t.shape.rank() {
            ensure!(rank == 0, RankMismatchSnafu { expected: 0usize, actual: rank });
        }
    }
    ensure!(start.dtype.is_numeric(), ExpectedNumericDTypeSnafu { dtype: start.dtype });

    let scalars = [0, 1, 2].map(|i| args[i].value.and_then(Tensor::as_scalar));
    let len = match scalars {
        [Some(start), Some(limit), Some(delta)] => Dim::Fixed(shape::range_len(start, limit, delta)?),
        _ => Dim::Unknown,
    };
    Ok(TensorType::new(start.dtype, Shape::Ranked(smallvec::smallvec![len])).into())
}

fn constant_of_shape(args: &[ArgInfo<'_>]) -> Rule {
    let value = tensor(args, 1)?;
    if let Some(count) = value.shape.element_count() {
        ensure!(count == 1, LengthMismatchSnafu { expected: 1usize, actual: count });
    }

    let shape = match int_values(args[0], 0)? {
        Some(dims) => {
            if let Some(&dim) = dims.iter().find(|&&d| d < 0) {
                return NegativeDimSnafu { dim }.fail();
            }
            let fixed: SmallVec<[usize; 4]> = dims.iter().map(|&d| d as usize).collect();
            shape::element_count(&fixed)?;
            Shape::fixed(&fixed)
        }
        None => static_len(args[0]).map_or(Shape::Unranked, Shape::unknown),
    };
    Ok(TensorType::new(value.dtype, shape).into())
}
