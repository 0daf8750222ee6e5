//! Generators for property-based testing.
//!
//! Expression trees are generated as [`ExprRecipe`] values and materialized
//! into a [`Graph`] with [`ExprRecipe::build`], so proptest can shrink them.

use proptest::prelude::*;
use tensorfold_dtype::DataType;

use crate::expr::{ExprId, Graph};
use crate::tensor::Tensor;
use crate::ty::TensorType;
use crate::types::{BinaryOp, ConstValue, UnaryOp};

/// Generate arbitrary ConstValue with reasonable bounds.
pub fn arb_const_value() -> impl Strategy<Value = ConstValue> {
    prop_oneof![
        (-1000i64..=1000).prop_map(ConstValue::Int),
        (0u64..=1000).prop_map(ConstValue::UInt),
        (-100.0..=100.0).prop_map(ConstValue::Float),
        any::<bool>().prop_map(ConstValue::Bool),
    ]
}

/// Small integers, weighted towards the identities 0 and 1.
pub fn arb_small_int() -> impl Strategy<Value = i64> {
    prop_oneof![
        3 => Just(0i64),
        3 => Just(1i64),
        4 => -8i64..=8,
    ]
}

/// Binary ops that stay total on integers.
pub fn arb_int_binary_op() -> impl Strategy<Value = BinaryOp> {
    prop_oneof![
        5 => Just(BinaryOp::Add),
        5 => Just(BinaryOp::Mul),
        4 => Just(BinaryOp::Sub),
        2 => Just(BinaryOp::Max),
        2 => Just(BinaryOp::Min),
    ]
}

/// Static shape of rank 0 to 3 with small dims.
pub fn arb_dims() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..=4, 0..=3)
}

/// Recipe for a scalar expression tree over one dtype.
#[derive(Debug, Clone)]
pub enum ExprRecipe {
    Var(String),
    Const(i64),
    Unary(UnaryOp, Box<ExprRecipe>),
    Binary(BinaryOp, Box<ExprRecipe>, Box<ExprRecipe>),
}

impl ExprRecipe {
    /// Insert the recipe into `graph` as scalars of `dtype`.
    pub fn build(&self, graph: &mut Graph, dtype: DataType) -> ExprId {
        match self {
            ExprRecipe::Var(name) => graph.var(name.clone(), TensorType::scalar(dtype)),
            ExprRecipe::Const(value) => graph.constant(Tensor::full(dtype, &[], ConstValue::Int(*value)).unwrap()),
            ExprRecipe::Unary(op, src) => {
                let src = src.build(graph, dtype);
                graph.unary(*op, src)
            }
            ExprRecipe::Binary(op, lhs, rhs) => {
                let lhs = lhs.build(graph, dtype);
                let rhs = rhs.build(graph, dtype);
                graph.binary(*op, lhs, rhs)
            }
        }
    }

    /// True if no `Var` occurs in the recipe.
    pub fn is_closed(&self) -> bool {
        match self {
            ExprRecipe::Var(_) => false,
            ExprRecipe::Const(_) => true,
            ExprRecipe::Unary(_, src) => src.is_closed(),
            ExprRecipe::Binary(_, lhs, rhs) => lhs.is_closed() && rhs.is_closed(),
        }
    }
}

/// Leaves: a variable from a small pool or a small constant.
pub fn arb_leaf(allow_vars: bool) -> BoxedStrategy<ExprRecipe> {
    let consts = arb_small_int().prop_map(ExprRecipe::Const);
    if allow_vars {
        prop_oneof![consts, "[a-c]".prop_map(ExprRecipe::Var)].boxed()
    } else {
        consts.boxed()
    }
}

/// Integer arithmetic tree of bounded depth.
///
/// Depth 0: constant or variable
/// Depth N: binary/unary operation over depth N-1 expressions
pub fn arb_int_tree(depth: u32, allow_vars: bool) -> impl Strategy<Value = ExprRecipe> {
    arb_leaf(allow_vars).prop_recursive(depth, depth * 4, 2, |inner| {
        prop_oneof![
            (arb_int_binary_op(), inner.clone(), inner.clone())
                .prop_map(|(op, lhs, rhs)| ExprRecipe::Binary(op, Box::new(lhs), Box::new(rhs))),
            (prop_oneof![Just(UnaryOp::Neg), Just(UnaryOp::Abs)], inner)
                .prop_map(|(op, src)| ExprRecipe::Unary(op, Box::new(src))),
        ]
    })
}
