//! Checked types attached to expressions by inference.

use std::fmt;

use snafu::Snafu;
use tensorfold_dtype::DataType;

use crate::op::OpKind;
use crate::shape::Shape;
use crate::tensor::Value;

/// Element type plus (possibly partial) shape of a tensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorType {
    pub dtype: DataType,
    pub shape: Shape,
}

impl TensorType {
    pub fn new(dtype: DataType, shape: Shape) -> Self {
        Self { dtype, shape }
    }

    pub fn scalar(dtype: DataType) -> Self {
        Self::new(dtype, Shape::scalar())
    }

    pub fn fixed(dtype: DataType, dims: &[usize]) -> Self {
        Self::new(dtype, Shape::fixed(dims))
    }

    pub fn unranked(dtype: DataType) -> Self {
        Self::new(dtype, Shape::Unranked)
    }

    pub fn accepts(&self, other: &TensorType) -> bool {
        self.dtype == other.dtype && self.shape.accepts(&other.shape)
    }
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.dtype, self.shape)
    }
}

/// Why an expression failed type checking.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum TypeError {
    #[snafu(display("{op:?} expects {expected} operands, got {actual}"))]
    ArityMismatch { op: OpKind, expected: usize, actual: usize },

    #[snafu(display("operand {index} must be a tensor"))]
    ExpectedTensor { index: usize },

    #[snafu(display("operand {index} must be a tuple"))]
    ExpectedTuple { index: usize },

    #[snafu(display("tuple member {index} is itself a tuple"))]
    NestedTuple { index: usize },

    #[snafu(display("operand {index} is ill-typed"))]
    InvalidOperand { index: usize },

    #[snafu(display("dtype mismatch: {lhs} vs {rhs}"))]
    DTypeMismatch { lhs: DataType, rhs: DataType },

    #[snafu(display("shapes {lhs} and {rhs} cannot be broadcast"))]
    NotBroadcastable { lhs: Shape, rhs: Shape },

    #[snafu(display("axis {axis} is out of range for rank {rank}"))]
    AxisOutOfRange { axis: i64, rank: usize },

    #[snafu(display("axis {axis} appears more than once"))]
    DuplicateAxis { axis: usize },

    #[snafu(display("cannot reshape {input} elements to {target:?}"))]
    ReshapeElementCountMismatch { input: usize, target: Vec<i64> },

    #[snafu(display("reshape target {target:?} has more than one inferred dimension"))]
    MultipleInferredDims { target: Vec<i64> },

    #[snafu(display("shape {dims:?} holds more elements than fit in usize"))]
    ShapeOverflow { dims: Vec<i64> },

    #[snafu(display("negative dimension {dim}"))]
    NegativeDim { dim: i64 },

    #[snafu(display("concat member {index} does not agree with the first member"))]
    ConcatShapeMismatch { index: usize },

    #[snafu(display("stack member {index} does not agree with the first member"))]
    StackShapeMismatch { index: usize },

    #[snafu(display("tuple operand is empty"))]
    EmptyTuple,

    #[snafu(display("expected rank {expected}, got {actual}"))]
    RankMismatch { expected: usize, actual: usize },

    #[snafu(display("expected {expected} values, got {actual}"))]
    LengthMismatch { expected: usize, actual: usize },

    #[snafu(display("cannot squeeze axis {axis} of size {dim}"))]
    SqueezeNonUnitDim { axis: usize, dim: usize },

    #[snafu(display("{perm:?} is not a permutation of 0..{rank}"))]
    InvalidPermutation { perm: Vec<usize>, rank: usize },

    #[snafu(display("index {index} is out of range for length {len}"))]
    IndexOutOfRange { index: usize, len: usize },

    #[snafu(display("expected an integer dtype, got {dtype}"))]
    ExpectedIntegerDType { dtype: DataType },

    #[snafu(display("expected a float dtype, got {dtype}"))]
    ExpectedFloatDType { dtype: DataType },

    #[snafu(display("expected a numeric dtype, got {dtype}"))]
    ExpectedNumericDType { dtype: DataType },

    #[snafu(display("step must not be zero"))]
    ZeroStep,

    #[snafu(display("invoke target is not a function"))]
    InvokeTargetNotFunction,

    #[snafu(display("function takes {expected} arguments, got {actual}"))]
    ParameterCountMismatch { expected: usize, actual: usize },

    #[snafu(display("argument {index} does not match its parameter type"))]
    ParameterTypeMismatch { index: usize },
}

/// Outcome of type inference for one expression.
///
/// An expression that has not been inferred yet simply has no entry in the
/// [`TypeTable`](crate::infer::TypeTable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckedType {
    Tensor(TensorType),
    Tuple(Vec<TensorType>),
    Invalid(TypeError),
}

impl CheckedType {
    pub fn is_valid(&self) -> bool {
        !matches!(self, CheckedType::Invalid(_))
    }

    pub fn as_tensor(&self) -> Option<&TensorType> {
        match self {
            CheckedType::Tensor(t) => Some(t),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&TypeError> {
        match self {
            CheckedType::Invalid(err) => Some(err),
            _ => None,
        }
    }

    /// Whether a value of type `other` may stand where `self` is expected.
    ///
    /// Unknown dims and unranked shapes on either side match anything; an
    /// invalid type accepts nothing and is accepted by nothing.
    pub fn accepts(&self, other: &CheckedType) -> bool {
        match (self, other) {
            (CheckedType::Tensor(a), CheckedType::Tensor(b)) => a.accepts(b),
            (CheckedType::Tuple(a), CheckedType::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.accepts(y))
            }
            _ => false,
        }
    }

    /// True for a tensor with a fully static shape, or a tuple of them.
    pub fn is_static(&self) -> bool {
        match self {
            CheckedType::Tensor(t) => t.shape.is_static(),
            CheckedType::Tuple(members) => members.iter().all(|t| t.shape.is_static()),
            CheckedType::Invalid(_) => false,
        }
    }
}

impl From<TensorType> for CheckedType {
    fn from(ty: TensorType) -> Self {
        CheckedType::Tensor(ty)
    }
}

impl From<TypeError> for CheckedType {
    fn from(err: TypeError) -> Self {
        CheckedType::Invalid(err)
    }
}

impl fmt::Display for CheckedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckedType::Tensor(t) => write!(f, "{t}"),
            CheckedType::Tuple(members) => {
                f.write_str("(")?;
                for (i, t) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{t}")?;
                }
                f.write_str(")")
            }
            CheckedType::Invalid(err) => write!(f, "invalid: {err}"),
        }
    }
}

impl Value {
    /// Exact type of an evaluated value.
    pub fn checked_type(&self) -> CheckedType {
        match self {
            Value::Tensor(t) => CheckedType::Tensor(t.tensor_type()),
            Value::Tuple(members) => {
                let mut types = Vec::with_capacity(members.len());
                for (index, member) in members.iter().enumerate() {
                    match member {
                        Value::Tensor(t) => types.push(t.tensor_type()),
                        Value::Tuple(_) => return CheckedType::Invalid(TypeError::NestedTuple { index }),
                    }
                }
                CheckedType::Tuple(types)
            }
        }
    }
}
