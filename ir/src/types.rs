//! Fundamental value and operator-kind definitions.
//!
//! [`ConstValue`] is the scalar element stored inside [`Tensor`](crate::Tensor)
//! data, while [`UnaryOp`], [`BinaryOp`] and [`ReduceOp`] select the arithmetic
//! performed by the corresponding [`Op`](crate::Op) variants.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::discriminant;

use tensorfold_dtype::DataType;

/// Scalar element of a constant tensor.
///
/// Every integer is stored widened to 64 bits and every float as `f64`; the
/// owning tensor's [`DataType`] decides the logical width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

/// Cast to target width and back to storage type (for proper truncation/extension).
macro_rules! cast_via {
    ($v:expr, $target:ty, $storage:ty) => {
        ($v as $target) as $storage
    };
}

#[inline]
fn cast_bool(v: bool, to: DataType) -> ConstValue {
    use DataType::*;
    match to {
        Bool => ConstValue::Bool(v),
        Int8 | Int16 | Int32 | Int64 => ConstValue::Int(v as i64),
        UInt8 | UInt16 | UInt32 | UInt64 => ConstValue::UInt(v as u64),
        Float16 | BFloat16 | Float32 | Float64 => ConstValue::Float(v as u8 as f64),
    }
}

#[inline]
fn cast_int(v: i64, to: DataType) -> ConstValue {
    use DataType::*;
    match to {
        Bool => ConstValue::Bool(v != 0),
        Int8 => ConstValue::Int(cast_via!(v, i8, i64)),
        Int16 => ConstValue::Int(cast_via!(v, i16, i64)),
        Int32 => ConstValue::Int(cast_via!(v, i32, i64)),
        Int64 => ConstValue::Int(v),
        UInt8 => ConstValue::UInt(cast_via!(v, u8, u64)),
        UInt16 => ConstValue::UInt(cast_via!(v, u16, u64)),
        UInt32 => ConstValue::UInt(cast_via!(v, u32, u64)),
        UInt64 => ConstValue::UInt(v as u64),
        Float32 => ConstValue::Float(cast_via!(v, f32, f64)),
        Float16 | BFloat16 | Float64 => ConstValue::Float(v as f64),
    }
}

#[inline]
fn cast_uint(v: u64, to: DataType) -> ConstValue {
    use DataType::*;
    match to {
        Bool => ConstValue::Bool(v != 0),
        Int8 => ConstValue::Int(cast_via!(v, i8, i64)),
        Int16 => ConstValue::Int(cast_via!(v, i16, i64)),
        Int32 => ConstValue::Int(cast_via!(v, i32, i64)),
        Int64 => ConstValue::Int(v as i64),
        UInt8 => ConstValue::UInt(cast_via!(v, u8, u64)),
        UInt16 => ConstValue::UInt(cast_via!(v, u16, u64)),
        UInt32 => ConstValue::UInt(cast_via!(v, u32, u64)),
        UInt64 => ConstValue::UInt(v),
        Float32 => ConstValue::Float(cast_via!(v, f32, f64)),
        Float16 | BFloat16 | Float64 => ConstValue::Float(v as f64),
    }
}

#[inline]
fn cast_float(v: f64, to: DataType) -> ConstValue {
    use DataType::*;
    match to {
        Bool => ConstValue::Bool(v != 0.0),
        Int8 => ConstValue::Int(cast_via!(v, i8, i64)),
        Int16 => ConstValue::Int(cast_via!(v, i16, i64)),
        Int32 => ConstValue::Int(cast_via!(v, i32, i64)),
        Int64 => ConstValue::Int(v as i64),
        // Float-to-unsigned goes through i64 so negative values wrap instead of saturating at zero.
        UInt8 => ConstValue::UInt(cast_via!(v as i64, u8, u64)),
        UInt16 => ConstValue::UInt(cast_via!(v as i64, u16, u64)),
        UInt32 => ConstValue::UInt(cast_via!(v as i64, u32, u64)),
        UInt64 => ConstValue::UInt((v as i64) as u64),
        Float32 => ConstValue::Float(cast_via!(v, f32, f64)),
        Float16 | BFloat16 | Float64 => ConstValue::Float(v),
    }
}

impl ConstValue {
    /// Natural storage dtype of the variant.
    pub const fn dtype(&self) -> DataType {
        match self {
            ConstValue::Int(_) => DataType::Int64,
            ConstValue::UInt(_) => DataType::UInt64,
            ConstValue::Float(_) => DataType::Float64,
            ConstValue::Bool(_) => DataType::Bool,
        }
    }

    pub const fn zero(dtype: DataType) -> Self {
        use DataType::*;
        match dtype {
            Bool => Self::Bool(false),
            Int8 | Int16 | Int32 | Int64 => Self::Int(0),
            UInt8 | UInt16 | UInt32 | UInt64 => Self::UInt(0),
            Float16 | BFloat16 | Float32 | Float64 => Self::Float(0.0),
        }
    }

    pub const fn one(dtype: DataType) -> Self {
        use DataType::*;
        match dtype {
            Bool => Self::Bool(true),
            Int8 | Int16 | Int32 | Int64 => Self::Int(1),
            UInt8 | UInt16 | UInt32 | UInt64 => Self::UInt(1),
            Float16 | BFloat16 | Float32 | Float64 => Self::Float(1.0),
        }
    }

    /// Cast this constant value to the target dtype.
    ///
    /// All casts are allowed, including lossy ones, and follow the semantics of
    /// Rust's `as`: narrowing truncates, unsigned overflow wraps and float to int
    /// truncates toward zero. Values are cast to the target width and then
    /// extended back to the storage type, so `Int(300).cast(Int8)` is `Int(44)`.
    ///
    /// `Float32` values are rounded to single precision. `Float16` and
    /// `BFloat16` keep double precision.
    pub fn cast(&self, dtype: DataType) -> Self {
        match *self {
            ConstValue::Bool(v) => cast_bool(v, dtype),
            ConstValue::Int(v) => cast_int(v, dtype),
            ConstValue::UInt(v) => cast_uint(v, dtype),
            ConstValue::Float(v) => cast_float(v, dtype),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            ConstValue::Int(v) => v as f64,
            ConstValue::UInt(v) => v as f64,
            ConstValue::Float(v) => v,
            ConstValue::Bool(v) => v as u8 as f64,
        }
    }

    pub fn as_i64(&self) -> i64 {
        match *self {
            ConstValue::Int(v) => v,
            ConstValue::UInt(v) => v as i64,
            ConstValue::Float(v) => v as i64,
            ConstValue::Bool(v) => v as i64,
        }
    }

    pub fn is_zero(&self) -> bool {
        match *self {
            ConstValue::Int(v) => v == 0,
            ConstValue::UInt(v) => v == 0,
            ConstValue::Float(v) => v == 0.0,
            ConstValue::Bool(v) => !v,
        }
    }

    pub fn is_one(&self) -> bool {
        match *self {
            ConstValue::Int(v) => v == 1,
            ConstValue::UInt(v) => v == 1,
            ConstValue::Float(v) => v == 1.0,
            ConstValue::Bool(v) => v,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::UInt(v) => write!(f, "{v}"),
            ConstValue::Float(v) => write!(f, "{v:?}"),
            ConstValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_from_primitive {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl From<$ty> for ConstValue {
                fn from(value: $ty) -> Self {
                    ConstValue::$variant(value.into())
                }
            }
        )+
    };
}

impl_from_primitive!(Int: i8, i16, i32, i64);
impl_from_primitive!(UInt: u8, u16, u32, u64);
impl_from_primitive!(Float: f32, f64);
impl_from_primitive!(Bool: bool);

/// Wrapper for ConstValue that implements Eq and Hash.
///
/// Floats compare by bit pattern, so NaN payloads with identical bits are equal
/// and `0.0` differs from `-0.0`.
#[derive(Debug, Clone, Copy)]
pub struct ConstValueHash(pub ConstValue);

impl PartialEq for ConstValueHash {
    fn eq(&self, other: &Self) -> bool {
        match (self.0, other.0) {
            (ConstValue::Int(a), ConstValue::Int(b)) => a == b,
            (ConstValue::UInt(a), ConstValue::UInt(b)) => a == b,
            (ConstValue::Float(a), ConstValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ConstValue::Bool(a), ConstValue::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ConstValueHash {}

impl Hash for ConstValueHash {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (discriminant(&self.0)).hash(state);
        match self.0 {
            ConstValue::Int(v) => v.hash(state),
            ConstValue::UInt(v) => v.hash(state),
            ConstValue::Float(v) => v.to_bits().hash(state),
            ConstValue::Bool(v) => v.hash(state),
        }
    }
}

/// Elementwise unary operators.
///
/// All unary operators preserve the input dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::VariantArray)]
pub enum UnaryOp {
    Abs,
    Neg,
    Ceil,
    Floor,
    Round,
    Sqrt,
    Exp,
    Log,
}

/// Elementwise binary operators with numpy broadcasting.
///
/// Both operands must share a dtype, which is also the result dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::VariantArray)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// Truncating division for integers, IEEE division for floats.
    Div,
    /// Remainder. Integers take the sign of the divisor, floats the sign of the dividend.
    Mod,
    Min,
    Max,
    Pow,
}

/// Reduction operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::VariantArray)]
pub enum ReduceOp {
    Sum,
    Mean,
    Max,
    Min,
    Prod,
}
