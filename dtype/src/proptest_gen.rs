use crate::*;
use proptest::prelude::*;

#[rustfmt::skip]
impl DataType {
    pub fn int_generator() -> impl Strategy<Value = Self> {
        prop_oneof![
            Just(DataType::Int8), Just(DataType::Int16), Just(DataType::Int32), Just(DataType::Int64),
            Just(DataType::UInt8), Just(DataType::UInt16), Just(DataType::UInt32), Just(DataType::UInt64),
        ]
    }

    pub fn float_generator() -> impl Strategy<Value = Self> {
        prop_oneof![
            Just(DataType::Float16), Just(DataType::BFloat16), Just(DataType::Float32), Just(DataType::Float64)
        ]
    }

    pub fn numeric_generator() -> impl Strategy<Value = Self> {
        prop_oneof![Self::int_generator(), Self::float_generator()]
    }
}
