//! Structural pattern language over expression graphs.
//!
//! A [`Pattern`] describes the shape of a sub-graph: wildcards, constants,
//! variables, tuples, calls filtered by operator, functions and ordered
//! alternatives. Matching a pattern against a node yields a [`MatchResult`]
//! binding names to the matched nodes.
//!
//! # Example
//!
//! ```rust
//! # use tensorfold_ir::prelude::*;
//! // Match: x + c (any expression plus a constant)
//! let pat = Pattern::wild("x") + Pattern::cvar("c");
//!
//! let mut graph = Graph::new();
//! let x = graph.var("x", TensorType::fixed(DataType::Float32, &[4]));
//! let c = graph.scalar(1.0f32);
//! let sum = graph.add(x, c);
//!
//! let m = pat.match_expr(&graph, sum).unwrap();
//! assert_eq!(m.get("x"), Some(x));
//! assert_eq!(m.get("c"), Some(c));
//! ```

pub mod helpers;
mod matcher;

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};
use std::sync::Arc;

use smallvec::{SmallVec, smallvec};
use tensorfold_dtype::DataType;

use crate::expr::ExprId;
use crate::op::{Op, OpKind};
use crate::tensor::Tensor;
use crate::types::{BinaryOp, UnaryOp};

pub use helpers::{const_matches, is_one, is_zero, try_const};

/// Operator test applied by [`Pattern::Call`].
#[derive(Debug, Clone, PartialEq)]
pub enum OpFilter {
    /// Operator and parameters must be equal.
    Exact(Op),
    /// Same operator variant, any parameters.
    Kind(OpKind),
    Binary(SmallVec<[BinaryOp; 4]>),
    Unary(SmallVec<[UnaryOp; 4]>),
    AnyOp,
}

impl OpFilter {
    pub fn accepts(&self, op: &Op) -> bool {
        match self {
            OpFilter::Exact(expected) => expected == op,
            OpFilter::Kind(kind) => op.kind() == *kind,
            OpFilter::Binary(ops) => matches!(op, Op::Binary(b) if ops.contains(b)),
            OpFilter::Unary(ops) => matches!(op, Op::Unary(u) if ops.contains(u)),
            OpFilter::AnyOp => true,
        }
    }
}

/// Extra test on the tensor of a matched `Const`.
#[derive(Clone)]
pub enum ConstPredicate {
    /// Exactly one element, whatever the rank.
    Scalar,
    /// Non-empty with every element zero.
    Zero,
    /// Non-empty with every element one.
    One,
    DType(DataType),
    Custom(Arc<dyn Fn(&Tensor) -> bool + Send + Sync>),
}

impl ConstPredicate {
    pub fn custom(f: impl Fn(&Tensor) -> bool + Send + Sync + 'static) -> Self {
        ConstPredicate::Custom(Arc::new(f))
    }

    pub fn matches(&self, tensor: &Tensor) -> bool {
        match self {
            ConstPredicate::Scalar => tensor.len() == 1,
            ConstPredicate::Zero => !tensor.is_empty() && tensor.data().iter().all(|v| v.is_zero()),
            ConstPredicate::One => !tensor.is_empty() && tensor.data().iter().all(|v| v.is_one()),
            ConstPredicate::DType(dtype) => tensor.dtype() == *dtype,
            ConstPredicate::Custom(f) => f(tensor),
        }
    }
}

impl fmt::Debug for ConstPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstPredicate::Scalar => f.write_str("Scalar"),
            ConstPredicate::Zero => f.write_str("Zero"),
            ConstPredicate::One => f.write_str("One"),
            ConstPredicate::DType(dtype) => f.debug_tuple("DType").field(dtype).finish(),
            ConstPredicate::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

/// How the operand list of a tuple or call is matched.
#[derive(Debug, Clone)]
pub enum FieldPattern {
    /// One pattern per operand, arity must match.
    Exact(Vec<Pattern>),
    /// Every operand matches the same pattern.
    Repeat(Box<Pattern>),
    /// Fixed prefix, then every remaining operand matches `rest`.
    Variadic { head: Vec<Pattern>, rest: Box<Pattern> },
}

#[derive(Debug, Clone)]
pub enum Pattern {
    Wildcard { name: Option<String> },
    Const { name: Option<String>, predicate: Option<ConstPredicate> },
    Var { name: Option<String> },
    Tuple { name: Option<String>, fields: FieldPattern },
    Call { name: Option<String>, op: OpFilter, args: FieldPattern },
    Function { name: Option<String>, body: Box<Pattern> },
    /// Ordered alternatives; the first one that matches is committed to.
    Any(Vec<Pattern>),
}

/// Bindings produced by a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub root: ExprId,
    pub bindings: SmallVec<[(String, ExprId); 4]>,
}

impl MatchResult {
    pub fn get(&self, name: &str) -> Option<ExprId> {
        self.bindings.iter().find(|(n, _)| n == name).map(|&(_, id)| id)
    }
}

/// Operator overloads building binary and unary call patterns.
macro_rules! impl_pattern_ops {
    (
        binary: [ $(($Trait:ident, $method:ident, $op:expr)),* $(,)? ],
        unary: [ $(($UTrait:ident, $umethod:ident, $uop:expr)),* $(,)? ] $(,)?
    ) => {
        $(
            impl $Trait for Pattern {
                type Output = Pattern;
                fn $method(self, rhs: Pattern) -> Pattern {
                    Self::binary($op, self, rhs)
                }
            }
        )*
        $(
            impl $UTrait for Pattern {
                type Output = Pattern;
                fn $umethod(self) -> Pattern {
                    Self::unary($uop, self)
                }
            }
        )*
    };
}

impl_pattern_ops! {
    binary: [
        (Add, add, BinaryOp::Add),
        (Sub, sub, BinaryOp::Sub),
        (Mul, mul, BinaryOp::Mul),
        (Div, div, BinaryOp::Div),
        (Rem, rem, BinaryOp::Mod),
    ],
    unary: [
        (Neg, neg, UnaryOp::Neg),
    ],
}

/// Constant matchers with a fixed predicate, e.g. `zero_const("z")`.
macro_rules! pattern_const_pred {
    ($name:ident, $pred:expr) => {
        pub fn $name(name: impl Into<String>) -> Self {
            Pattern::Const { name: Some(name.into()), predicate: Some($pred) }
        }
    };
}

/// Single-operand call matchers filtered by operator kind, e.g. `shape_of(x)`.
macro_rules! pattern_op_single {
    ($name:ident, $kind:expr) => {
        pub fn $name(src: Pattern) -> Self {
            Pattern::Call { name: None, op: OpFilter::Kind($kind), args: FieldPattern::Exact(vec![src]) }
        }
    };
}

impl Pattern {
    pub fn wildcard() -> Self {
        Pattern::Wildcard { name: None }
    }

    /// Wildcard bound to `name`.
    pub fn wild(name: impl Into<String>) -> Self {
        Pattern::Wildcard { name: Some(name.into()) }
    }

    /// Any constant, bound to `name`.
    pub fn cvar(name: impl Into<String>) -> Self {
        Pattern::Const { name: Some(name.into()), predicate: None }
    }

    /// Any constant, unbound.
    pub fn is_const() -> Self {
        Pattern::Const { name: None, predicate: None }
    }

    pub fn const_where(name: impl Into<String>, predicate: ConstPredicate) -> Self {
        Pattern::Const { name: Some(name.into()), predicate: Some(predicate) }
    }

    pattern_const_pred!(zero_const, ConstPredicate::Zero);
    pattern_const_pred!(one_const, ConstPredicate::One);
    pattern_const_pred!(scalar_const, ConstPredicate::Scalar);

    /// Any `Var`, bound to `name`.
    pub fn input(name: impl Into<String>) -> Self {
        Pattern::Var { name: Some(name.into()) }
    }

    pub fn tuple(fields: Vec<Pattern>) -> Self {
        Pattern::Tuple { name: None, fields: FieldPattern::Exact(fields) }
    }

    /// Tuple of any length whose members all match `field`.
    pub fn tuple_of(field: Pattern) -> Self {
        Pattern::Tuple { name: None, fields: FieldPattern::Repeat(Box::new(field)) }
    }

    pub fn call(op: OpFilter, args: Vec<Pattern>) -> Self {
        Pattern::Call { name: None, op, args: FieldPattern::Exact(args) }
    }

    /// Call of any arity whose operands all match `arg`.
    pub fn call_repeat(op: OpFilter, arg: Pattern) -> Self {
        Pattern::Call { name: None, op, args: FieldPattern::Repeat(Box::new(arg)) }
    }

    pub fn call_variadic(op: OpFilter, head: Vec<Pattern>, rest: Pattern) -> Self {
        Pattern::Call { name: None, op, args: FieldPattern::Variadic { head, rest: Box::new(rest) } }
    }

    pub fn binary(op: BinaryOp, lhs: Pattern, rhs: Pattern) -> Self {
        Self::call(OpFilter::Binary(smallvec![op]), vec![lhs, rhs])
    }

    /// Binary call with any of `ops`.
    pub fn binary_any(ops: &[BinaryOp], lhs: Pattern, rhs: Pattern) -> Self {
        Self::call(OpFilter::Binary(SmallVec::from_slice(ops)), vec![lhs, rhs])
    }

    pub fn unary(op: UnaryOp, src: Pattern) -> Self {
        Self::call(OpFilter::Unary(smallvec![op]), vec![src])
    }

    pattern_op_single!(cast, OpKind::Cast);
    pattern_op_single!(shape_of, OpKind::ShapeOf);
    pattern_op_single!(concat, OpKind::Concat);
    pattern_op_single!(stack, OpKind::Stack);

    /// `Invoke(function, args...)` with the function matched by `function`.
    pub fn invoke(function: Pattern, arg: Pattern) -> Self {
        Self::call_variadic(OpFilter::Exact(Op::Invoke), vec![function], arg)
    }

    pub fn function(body: Pattern) -> Self {
        Pattern::Function { name: None, body: Box::new(body) }
    }

    pub fn any(alternatives: Vec<Pattern>) -> Self {
        Pattern::Any(alternatives)
    }

    /// Bind the node matched by this pattern to `name`.
    ///
    /// On `Any`, the name is pushed into every alternative.
    pub fn named(self, name: impl Into<String>) -> Self {
        let name = name.into();
        match self {
            Pattern::Wildcard { .. } => Pattern::Wildcard { name: Some(name) },
            Pattern::Const { predicate, .. } => Pattern::Const { name: Some(name), predicate },
            Pattern::Var { .. } => Pattern::Var { name: Some(name) },
            Pattern::Tuple { fields, .. } => Pattern::Tuple { name: Some(name), fields },
            Pattern::Call { op, args, .. } => Pattern::Call { name: Some(name), op, args },
            Pattern::Function { body, .. } => Pattern::Function { name: Some(name), body },
            Pattern::Any(alternatives) => Pattern::Any(alternatives.into_iter().map(|p| p.named(name.clone())).collect()),
        }
    }

    /// This pattern, or the same pattern under a `Cast`.
    pub fn or_casted(self) -> Self {
        Pattern::any(vec![self.clone(), Pattern::cast(self)])
    }
}
