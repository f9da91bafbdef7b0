use crate::errors::{RasterError, Result};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Element types a band (or an external buffer) can hold.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum DataType {
    /// Eight bit unsigned integer, named `Byte` for GDAL compatibility.
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Float32,
    Float64,
}

impl DataType {
    /// All supported data types, ordered by GDAL ordinal.
    pub fn iter() -> impl Iterator<Item = DataType> {
        use DataType::*;
        [
            UInt8, Int8, UInt16, Int16, UInt32, Int32, UInt64, Int64, Float32, Float64,
        ]
        .into_iter()
    }

    /// GDAL name of the type, e.g. `Byte` or `Float32`.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::UInt8 => "Byte",
            DataType::Int8 => "Int8",
            DataType::UInt16 => "UInt16",
            DataType::Int16 => "Int16",
            DataType::UInt32 => "UInt32",
            DataType::Int32 => "Int32",
            DataType::UInt64 => "UInt64",
            DataType::Int64 => "Int64",
            DataType::Float32 => "Float32",
            DataType::Float64 => "Float64",
        }
    }

    /// Get the type size in **bytes**.
    pub fn bytes(&self) -> usize {
        match self {
            DataType::UInt8 | DataType::Int8 => 1,
            DataType::UInt16 | DataType::Int16 => 2,
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => 4,
            DataType::UInt64 | DataType::Int64 | DataType::Float64 => 8,
        }
    }

    /// Get the type size in **bits**.
    pub fn bits(&self) -> usize {
        self.bytes() * 8
    }

    /// Returns `true` if data type is integral (non-floating point)
    pub fn is_integer(&self) -> bool {
        !self.is_floating()
    }

    /// Returns `true` if data type is floating point (non-integral)
    pub fn is_floating(&self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    /// Returns `true` if data type supports negative values.
    pub fn is_signed(&self) -> bool {
        !matches!(
            self,
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64
        )
    }

    /// Decode one native-endian element from the start of `bytes`.
    pub(crate) fn read_sample(&self, bytes: &[u8]) -> Sample {
        macro_rules! decode {
            ($t:ty) => {{
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(&bytes[..std::mem::size_of::<$t>()]);
                <$t>::from_ne_bytes(raw).to_sample()
            }};
        }
        match self {
            DataType::UInt8 => decode!(u8),
            DataType::Int8 => decode!(i8),
            DataType::UInt16 => decode!(u16),
            DataType::Int16 => decode!(i16),
            DataType::UInt32 => decode!(u32),
            DataType::Int32 => decode!(i32),
            DataType::UInt64 => decode!(u64),
            DataType::Int64 => decode!(i64),
            DataType::Float32 => decode!(f32),
            DataType::Float64 => decode!(f64),
        }
    }

    /// Convert `sample` to this type and encode it at the start of `bytes`.
    pub(crate) fn write_sample(&self, sample: Sample, bytes: &mut [u8]) {
        macro_rules! encode {
            ($t:ty) => {{
                let raw = <$t>::from_sample(sample).to_ne_bytes();
                bytes[..raw.len()].copy_from_slice(&raw);
            }};
        }
        match self {
            DataType::UInt8 => encode!(u8),
            DataType::Int8 => encode!(i8),
            DataType::UInt16 => encode!(u16),
            DataType::Int16 => encode!(i16),
            DataType::UInt32 => encode!(u32),
            DataType::Int32 => encode!(i32),
            DataType::UInt64 => encode!(u64),
            DataType::Int64 => encode!(i64),
            DataType::Float32 => encode!(f32),
            DataType::Float64 => encode!(f64),
        }
    }

    /// Value conversion into this type, without encoding.
    pub(crate) fn convert(&self, sample: Sample) -> Sample {
        match self {
            DataType::UInt8 => u8::from_sample(sample).to_sample(),
            DataType::Int8 => i8::from_sample(sample).to_sample(),
            DataType::UInt16 => u16::from_sample(sample).to_sample(),
            DataType::Int16 => i16::from_sample(sample).to_sample(),
            DataType::UInt32 => u32::from_sample(sample).to_sample(),
            DataType::Int32 => i32::from_sample(sample).to_sample(),
            DataType::UInt64 => u64::from_sample(sample).to_sample(),
            DataType::Int64 => i64::from_sample(sample).to_sample(),
            DataType::Float32 => f32::from_sample(sample).to_sample(),
            DataType::Float64 => f64::from_sample(sample).to_sample(),
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self> {
        DataType::iter()
            .find(|dt| dt.name().eq_ignore_ascii_case(s))
            .or_else(|| s.eq_ignore_ascii_case("UInt8").then_some(DataType::UInt8))
            .ok_or_else(|| RasterError::UnknownDataType(s.to_string()))
    }
}

/// A single pixel value in transit between two element types.
///
/// Integers travel as `i128` so that every supported integer type,
/// including `u64`, converts without loss.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Sample {
    Int(i128),
    Float(f64),
}

impl Sample {
    pub fn as_f64(self) -> f64 {
        match self {
            Sample::Int(v) => v as f64,
            Sample::Float(v) => v,
        }
    }
}

/// Type-level constraint for limiting which primitive numeric values can be passed
/// to functions needing target data type.
pub trait RasterType: Copy + Default {
    fn datatype() -> DataType;
    fn to_sample(self) -> Sample;
    /// Saturating conversion; floats truncate toward zero, NaN becomes zero.
    fn from_sample(sample: Sample) -> Self;
}

macro_rules! impl_integer_type {
    ($t:ty, $dt:ident) => {
        impl RasterType for $t {
            fn datatype() -> DataType {
                DataType::$dt
            }
            fn to_sample(self) -> Sample {
                Sample::Int(self as i128)
            }
            fn from_sample(sample: Sample) -> Self {
                match sample {
                    Sample::Int(v) => v.clamp(<$t>::MIN as i128, <$t>::MAX as i128) as $t,
                    Sample::Float(v) => v as $t,
                }
            }
        }
    };
}

macro_rules! impl_float_type {
    ($t:ty, $dt:ident) => {
        impl RasterType for $t {
            fn datatype() -> DataType {
                DataType::$dt
            }
            fn to_sample(self) -> Sample {
                Sample::Float(self as f64)
            }
            fn from_sample(sample: Sample) -> Self {
                match sample {
                    Sample::Int(v) => v as $t,
                    Sample::Float(v) => v as $t,
                }
            }
        }
    };
}

impl_integer_type!(u8, UInt8);
impl_integer_type!(i8, Int8);
impl_integer_type!(u16, UInt16);
impl_integer_type!(i16, Int16);
impl_integer_type!(u32, UInt32);
impl_integer_type!(i32, Int32);
impl_integer_type!(u64, UInt64);
impl_integer_type!(i64, Int64);
impl_float_type!(f32, Float32);
impl_float_type!(f64, Float64);
