//! Host tensors used as constant payloads and evaluation results.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use smallvec::SmallVec;
use snafu::{OptionExt, ensure};
use tensorfold_dtype::DataType;
use tensorfold_dtype::ext::HasDataType;

use crate::error::{ElementCountOverflowSnafu, Result, TensorDataLengthSnafu};
use crate::shape::{Dim, Shape, checked_element_count};
use crate::ty::TensorType;
use crate::types::{ConstValue, ConstValueHash};

pub type Dims = SmallVec<[usize; 4]>;

/// Immutable dense tensor with row-major element data.
///
/// Elements are normalized to the width of `dtype` on construction, so two
/// tensors built from differently-typed sources compare equal when their
/// logical contents agree. Cloning is cheap: element storage is shared.
#[derive(Debug, Clone)]
pub struct Tensor {
    dtype: DataType,
    dims: Dims,
    data: Arc<[ConstValue]>,
}

impl Tensor {
    pub fn new(dtype: DataType, dims: impl Into<Dims>, data: impl IntoIterator<Item = ConstValue>) -> Result<Self> {
        let dims = dims.into();
        let expected = count_elements(&dims)?;
        let data: Arc<[ConstValue]> = data.into_iter().map(|v| v.cast(dtype)).collect();
        ensure!(
            data.len() == expected,
            TensorDataLengthSnafu { dims: dims.to_vec(), expected, actual: data.len() }
        );
        Ok(Self { dtype, dims, data })
    }

    pub fn from_slice<T>(dims: &[usize], data: &[T]) -> Result<Self>
    where
        T: HasDataType + Into<ConstValue> + Copy,
    {
        Self::new(T::DATA_TYPE, dims, data.iter().map(|&v| v.into()))
    }

    /// Rank-0 tensor.
    pub fn scalar<T>(value: T) -> Self
    where
        T: HasDataType + Into<ConstValue>,
    {
        let value: ConstValue = value.into();
        Self { dtype: T::DATA_TYPE, dims: Dims::new(), data: Arc::from([value.cast(T::DATA_TYPE)]) }
    }

    /// Tensor with every element set to `value` (cast to `dtype`).
    pub fn full(dtype: DataType, dims: &[usize], value: ConstValue) -> Result<Self> {
        let value = value.cast(dtype);
        let count = count_elements(dims)?;
        Ok(Self { dtype, dims: Dims::from_slice(dims), data: std::iter::repeat_n(value, count).collect() })
    }

    /// Rank-1 Int64 tensor, the canonical encoding of shapes and axis lists.
    pub fn from_i64s(values: &[i64]) -> Self {
        Self {
            dtype: DataType::Int64,
            dims: smallvec::smallvec![values.len()],
            data: values.iter().map(|&v| ConstValue::Int(v)).collect(),
        }
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn data(&self) -> &[ConstValue] {
        &self.data
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// The single element of a tensor holding exactly one value, whatever its rank.
    pub fn as_scalar(&self) -> Option<ConstValue> {
        match &*self.data {
            [v] => Some(*v),
            _ => None,
        }
    }

    /// Elements as signed integers. Only integer tensors qualify.
    pub fn to_i64_vec(&self) -> Option<Vec<i64>> {
        if !self.dtype.is_int() {
            return None;
        }
        Some(self.data.iter().map(ConstValue::as_i64).collect())
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.data.iter().map(ConstValue::as_f64).collect()
    }

    pub fn tensor_type(&self) -> TensorType {
        TensorType::new(self.dtype, Shape::Ranked(self.dims.iter().map(|&d| Dim::Fixed(d)).collect()))
    }

    pub fn cast(&self, dtype: DataType) -> Self {
        Self { dtype, dims: self.dims.clone(), data: self.data.iter().map(|v| v.cast(dtype)).collect() }
    }

    /// Same data under new dims. The element count must be unchanged.
    pub fn reshaped(&self, dims: &[usize]) -> Result<Self> {
        let expected = count_elements(dims)?;
        ensure!(
            expected == self.data.len(),
            TensorDataLengthSnafu { dims: dims.to_vec(), expected, actual: self.data.len() }
        );
        Ok(Self { dtype: self.dtype, dims: Dims::from_slice(dims), data: self.data.clone() })
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.dtype == other.dtype
            && self.dims == other.dims
            && (Arc::ptr_eq(&self.data, &other.data)
                || self.data.iter().zip(other.data.iter()).all(|(a, b)| ConstValueHash(*a) == ConstValueHash(*b)))
    }
}

impl Eq for Tensor {}

impl Hash for Tensor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dtype.hash(state);
        self.dims.hash(state);
        for v in self.data.iter() {
            ConstValueHash(*v).hash(state);
        }
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 8;

        write!(f, "{}{:?}", self.dtype, self.dims.as_slice())?;
        if self.is_scalar() {
            return write!(f, " {}", self.data[0]);
        }
        f.write_str(" {")?;
        for (i, v) in self.data.iter().take(PREVIEW).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        if self.data.len() > PREVIEW {
            f.write_str(", ...")?;
        }
        f.write_str("}")
    }
}

/// Result of evaluating an expression: a tensor or an ordered group of values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Tensor(Tensor),
    Tuple(Vec<Value>),
}

impl Value {
    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Value::Tensor(t) => Some(t),
            Value::Tuple(_) => None,
        }
    }
}

impl From<Tensor> for Value {
    fn from(tensor: Tensor) -> Self {
        Value::Tensor(tensor)
    }
}

fn count_elements(dims: &[usize]) -> Result<usize> {
    checked_element_count(dims).context(ElementCountOverflowSnafu { dims: dims.to_vec() })
}
