//! Data type tags for strided array storage.
//!
//! Every buffer carries exactly one [`DataType`], fixed at construction.
//! The tag decides how storage is allocated, which accessor reads a logical
//! element, and which kernel a dispatcher selects.

use std::fmt;
use std::str::FromStr;

/// Storage kind of a strided array.
///
/// Note the naming: `Complex128` is a complex number made of two `f64`
/// parts (`num_complex::Complex64`), `Complex64` is made of two `f32`
/// parts (`num_complex::Complex32`). The numeric suffix is the total bit
/// width, matching the dtype names used by the wider library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    Float64,
    Float32,
    Int32,
    Int16,
    Int8,
    Uint32,
    Uint16,
    Uint8,
    Complex128,
    Complex64,
    Bool,
    /// Boxed values of any kind.
    Generic,
    /// Raw bytes.
    Binary,
}

impl DataType {
    /// Every data type, in canonical order.
    pub const ALL: [DataType; 13] = [
        DataType::Float64,
        DataType::Float32,
        DataType::Int32,
        DataType::Int16,
        DataType::Int8,
        DataType::Uint32,
        DataType::Uint16,
        DataType::Uint8,
        DataType::Complex128,
        DataType::Complex64,
        DataType::Bool,
        DataType::Generic,
        DataType::Binary,
    ];

    /// Canonical lowercase name (e.g. `"float64"`).
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Float64 => "float64",
            DataType::Float32 => "float32",
            DataType::Int32 => "int32",
            DataType::Int16 => "int16",
            DataType::Int8 => "int8",
            DataType::Uint32 => "uint32",
            DataType::Uint16 => "uint16",
            DataType::Uint8 => "uint8",
            DataType::Complex128 => "complex128",
            DataType::Complex64 => "complex64",
            DataType::Bool => "bool",
            DataType::Generic => "generic",
            DataType::Binary => "binary",
        }
    }

    /// Single-character code used in kernel names (`d` for float64, `z` for
    /// complex128, ...).
    pub fn char_code(self) -> char {
        match self {
            DataType::Float64 => 'd',
            DataType::Float32 => 'f',
            DataType::Int32 => 'i',
            DataType::Int16 => 'k',
            DataType::Int8 => 's',
            DataType::Uint32 => 'u',
            DataType::Uint16 => 't',
            DataType::Uint8 => 'b',
            DataType::Complex128 => 'z',
            DataType::Complex64 => 'c',
            DataType::Bool => 'x',
            DataType::Generic => 'o',
            DataType::Binary => 'r',
        }
    }

    /// Inverse of [`DataType::char_code`].
    pub fn from_char_code(c: char) -> Option<Self> {
        DataType::ALL.into_iter().find(|dt| dt.char_code() == c)
    }

    /// Number of bytes occupied by one logical element.
    ///
    /// Returns `None` for [`DataType::Generic`], whose elements are boxed.
    pub fn bytes_per_element(self) -> Option<usize> {
        match self {
            DataType::Float64 => Some(8),
            DataType::Float32 => Some(4),
            DataType::Int32 | DataType::Uint32 => Some(4),
            DataType::Int16 | DataType::Uint16 => Some(2),
            DataType::Int8 | DataType::Uint8 => Some(1),
            DataType::Complex128 => Some(16),
            DataType::Complex64 => Some(8),
            DataType::Bool | DataType::Binary => Some(1),
            DataType::Generic => None,
        }
    }

    /// Number of physical storage slots per logical element (2 for complex
    /// dtypes stored as interleaved real/imaginary parts, 1 otherwise).
    pub fn slots_per_element(self) -> usize {
        if self.is_complex() {
            2
        } else {
            1
        }
    }

    pub fn is_real_floating_point(self) -> bool {
        matches!(self, DataType::Float64 | DataType::Float32)
    }

    pub fn is_complex(self) -> bool {
        matches!(self, DataType::Complex128 | DataType::Complex64)
    }

    pub fn is_floating_point(self) -> bool {
        self.is_real_floating_point() || self.is_complex()
    }

    pub fn is_signed_integer(self) -> bool {
        matches!(self, DataType::Int32 | DataType::Int16 | DataType::Int8)
    }

    pub fn is_unsigned_integer(self) -> bool {
        matches!(self, DataType::Uint32 | DataType::Uint16 | DataType::Uint8)
    }

    pub fn is_integer(self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    /// Real-valued numeric types (integers and real floating point).
    pub fn is_real(self) -> bool {
        self.is_integer() || self.is_real_floating_point()
    }

    pub fn is_numeric(self) -> bool {
        self.is_real() || self.is_complex()
    }

    /// Real floating point type of matching precision for a complex type
    /// (`complex128 -> float64`); `None` for non-complex types.
    pub fn real_counterpart(self) -> Option<DataType> {
        match self {
            DataType::Complex128 => Some(DataType::Float64),
            DataType::Complex64 => Some(DataType::Float32),
            _ => None,
        }
    }

    /// Complex type of matching precision for a real floating point type.
    pub fn complex_counterpart(self) -> Option<DataType> {
        match self {
            DataType::Float64 => Some(DataType::Complex128),
            DataType::Float32 => Some(DataType::Complex64),
            DataType::Complex128 | DataType::Complex64 => Some(self),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown data type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown data type: {0:?}")]
pub struct ParseDataTypeError(pub String);

impl FromStr for DataType {
    type Err = ParseDataTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|dt| dt.as_str() == s)
            .ok_or_else(|| ParseDataTypeError(s.to_string()))
    }
}
