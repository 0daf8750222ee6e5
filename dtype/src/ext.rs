use super::*;

/// Rust primitives that have a tensor element type.
pub trait HasDataType {
    const DATA_TYPE: DataType;
}

macro_rules! impl_dtype_ext {
    ($($ty:ty => $dtype:expr),* $(,)?) => {
        $(impl HasDataType for $ty { const DATA_TYPE: DataType = $dtype; })*
    };
}

impl_dtype_ext! {
    bool => DataType::Bool,
    i8 => DataType::Int8, i16 => DataType::Int16, i32 => DataType::Int32, i64 => DataType::Int64,
    u8 => DataType::UInt8, u16 => DataType::UInt16, u32 => DataType::UInt32, u64 => DataType::UInt64,
    f32 => DataType::Float32, f64 => DataType::Float64,
}
