//! Builders for every expression and operator.
//!
//! All builders insert into the graph and panic on dangling operands, like
//! [`Graph::insert`].

use smallvec::SmallVec;
use tensorfold_dtype::DataType;
use tensorfold_dtype::ext::HasDataType;

use super::{Call, Expr, ExprId, Function, Graph, Operands, Var};
use crate::op::{Axes, Op};
use crate::tensor::Tensor;
use crate::ty::TensorType;
use crate::types::{BinaryOp, ConstValue, ReduceOp, UnaryOp};

impl Graph {
    pub fn var(&mut self, name: impl Into<String>, ty: TensorType) -> ExprId {
        self.insert(Expr::Var(Var { name: name.into(), ty }))
    }

    pub fn constant(&mut self, tensor: Tensor) -> ExprId {
        self.insert(Expr::Const(tensor))
    }

    pub fn scalar<T: HasDataType + Into<ConstValue>>(&mut self, value: T) -> ExprId {
        self.constant(Tensor::scalar(value))
    }

    /// Rank-1 Int64 constant, the usual form of shape and axis operands.
    pub fn const_i64s(&mut self, values: &[i64]) -> ExprId {
        self.constant(Tensor::from_i64s(values))
    }

    pub fn tuple(&mut self, fields: &[ExprId]) -> ExprId {
        self.insert(Expr::Tuple(Operands::from_slice(fields)))
    }

    pub fn call(&mut self, op: Op, args: &[ExprId]) -> ExprId {
        self.insert(Expr::Call(Call { op, args: Operands::from_slice(args) }))
    }

    pub fn function(&mut self, name: impl Into<String>, body: ExprId, params: &[ExprId]) -> ExprId {
        self.insert(Expr::Function(Function { name: name.into(), body, params: Operands::from_slice(params) }))
    }

    pub fn unary(&mut self, op: UnaryOp, x: ExprId) -> ExprId {
        self.call(Op::Unary(op), &[x])
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.call(Op::Binary(op), &[lhs, rhs])
    }

    pub fn add(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.binary(BinaryOp::Add, lhs, rhs)
    }

    pub fn sub(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.binary(BinaryOp::Sub, lhs, rhs)
    }

    pub fn mul(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.binary(BinaryOp::Mul, lhs, rhs)
    }

    pub fn div(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.binary(BinaryOp::Div, lhs, rhs)
    }

    pub fn rem(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.binary(BinaryOp::Mod, lhs, rhs)
    }

    pub fn min(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.binary(BinaryOp::Min, lhs, rhs)
    }

    pub fn max(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.binary(BinaryOp::Max, lhs, rhs)
    }

    pub fn pow(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.binary(BinaryOp::Pow, lhs, rhs)
    }

    pub fn neg(&mut self, x: ExprId) -> ExprId {
        self.unary(UnaryOp::Neg, x)
    }

    pub fn abs(&mut self, x: ExprId) -> ExprId {
        self.unary(UnaryOp::Abs, x)
    }

    pub fn sqrt(&mut self, x: ExprId) -> ExprId {
        self.unary(UnaryOp::Sqrt, x)
    }

    pub fn clamp(&mut self, x: ExprId, min: ExprId, max: ExprId) -> ExprId {
        self.call(Op::Clamp, &[x, min, max])
    }

    pub fn cast(&mut self, x: ExprId, to: DataType) -> ExprId {
        self.call(Op::Cast { to }, &[x])
    }

    /// Concatenate the members of a tuple expression.
    pub fn concat(&mut self, tuple: ExprId, axis: i64) -> ExprId {
        self.call(Op::Concat { axis }, &[tuple])
    }

    pub fn stack(&mut self, tuple: ExprId, axis: i64) -> ExprId {
        self.call(Op::Stack { axis }, &[tuple])
    }

    pub fn reshape(&mut self, x: ExprId, shape: ExprId) -> ExprId {
        self.call(Op::Reshape, &[x, shape])
    }

    /// Reshape to a constant target.
    pub fn reshape_to(&mut self, x: ExprId, shape: &[i64]) -> ExprId {
        let shape = self.const_i64s(shape);
        self.reshape(x, shape)
    }

    pub fn shape_of(&mut self, x: ExprId) -> ExprId {
        self.call(Op::ShapeOf, &[x])
    }

    pub fn slice(&mut self, x: ExprId, begins: ExprId, ends: ExprId, axes: ExprId, strides: ExprId) -> ExprId {
        self.call(Op::Slice, &[x, begins, ends, axes, strides])
    }

    pub fn get_item(&mut self, x: ExprId, index: usize) -> ExprId {
        self.call(Op::GetItem { index }, &[x])
    }

    pub fn squeeze(&mut self, x: ExprId, axes: &[i64]) -> ExprId {
        self.call(Op::Squeeze { axes: Axes::from_slice(axes) }, &[x])
    }

    pub fn unsqueeze(&mut self, x: ExprId, axes: &[i64]) -> ExprId {
        self.call(Op::Unsqueeze { axes: Axes::from_slice(axes) }, &[x])
    }

    pub fn transpose(&mut self, x: ExprId, perm: &[usize]) -> ExprId {
        self.call(Op::Transpose { perm: SmallVec::from_slice(perm) }, &[x])
    }

    pub fn reduce(&mut self, op: ReduceOp, x: ExprId, axes: &[i64], keep_dims: bool) -> ExprId {
        self.call(Op::Reduce { op, axes: Axes::from_slice(axes), keep_dims }, &[x])
    }

    pub fn range(&mut self, start: ExprId, limit: ExprId, delta: ExprId) -> ExprId {
        self.call(Op::Range, &[start, limit, delta])
    }

    pub fn constant_of_shape(&mut self, shape: ExprId, value: ExprId) -> ExprId {
        self.call(Op::ConstantOfShape, &[shape, value])
    }

    pub fn invoke(&mut self, function: ExprId, args: &[ExprId]) -> ExprId {
        let mut operands = Operands::with_capacity(args.len() + 1);
        operands.push(function);
        operands.extend_from_slice(args);
        self.insert(Expr::Call(Call { op: Op::Invoke, args: operands }))
    }
}
