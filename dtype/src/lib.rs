pub mod ext;

#[cfg(any(test, feature = "proptest"))]
pub mod proptest_gen;


/// Scalar element types of tensors.
///
/// Discriminants interleave signed and unsigned integers by width so that
/// ordering follows storage size.
#[derive(Debug, Hash, PartialOrd, Ord)]
#[derive(strum::EnumCount, strum::EnumIter, strum::VariantArray, strum::FromRepr, strum::Display)]
#[derive(enumset::EnumSetType)]
#[cfg_attr(any(test, feature = "proptest"), derive(proptest_derive::Arbitrary))]
#[enumset(repr = "u32")]
pub enum DataType {
    #[strum(serialize = "bool")]
    Bool = 0,

    #[strum(serialize = "i8")]
    Int8 = 1,
    #[strum(serialize = "u8")]
    UInt8 = 2,
    #[strum(serialize = "i16")]
    Int16 = 3,
    #[strum(serialize = "u16")]
    UInt16 = 4,
    #[strum(serialize = "i32")]
    Int32 = 5,
    #[strum(serialize = "u32")]
    UInt32 = 6,
    #[strum(serialize = "i64")]
    Int64 = 7,
    #[strum(serialize = "u64")]
    UInt64 = 8,

    #[strum(serialize = "f16")]
    Float16 = 9,
    #[strum(serialize = "bf16")]
    BFloat16 = 10,
    #[strum(serialize = "f32")]
    Float32 = 11,
    #[strum(serialize = "f64")]
    Float64 = 12,
}

impl DataType {
    pub const fn bytes(&self) -> usize {
        match self {
            Self::Bool => 1,
            Self::Int8 => 1,
            Self::Int16 => 2,
            Self::Int32 => 4,
            Self::Int64 => 8,
            Self::UInt8 => 1,
            Self::UInt16 => 2,
            Self::UInt32 => 4,
            Self::UInt64 => 8,
            Self::Float16 => 2,
            Self::BFloat16 => 2,
            Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub const fn is_unsigned(&self) -> bool {
        matches!(self, Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64)
    }

    pub const fn is_int(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float16 | Self::BFloat16 | Self::Float32 | Self::Float64)
    }

    /// Integer or float, i.e. anything arithmetic is defined on.
    pub const fn is_numeric(&self) -> bool {
        self.is_int() || self.is_float()
    }

    /// Bit width of the storage type.
    pub const fn bits(&self) -> u32 {
        (self.bytes() * 8) as u32
    }
}
