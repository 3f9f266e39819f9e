//! Element type bounds and the boxed `Scalar` value.

use crate::dtype::DataType;
use num_complex::{Complex32, Complex64};
use std::fmt;

/// A dynamically typed element value.
///
/// This is the element type of `generic` arrays and the common currency of
/// the dynamic accessors, which read any buffer as a sequence of `Scalar`.
/// `Null` stands for a hole (a missing value).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex(Complex64),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Real value, if this is an integer or a real float.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Scalar::Int(v) => Some(v as f64),
            Scalar::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Integer value. Floats convert only when they hold an exact integer.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Scalar::Int(v) => Some(v),
            Scalar::Float(v) if v.fract() == 0.0 && v.abs() <= i64::MAX as f64 => Some(v as i64),
            _ => None,
        }
    }

    /// Complex value; real numbers get a zero imaginary part.
    pub fn as_complex(&self) -> Option<Complex64> {
        match *self {
            Scalar::Complex(c) => Some(c),
            _ => self.as_f64().map(|re| Complex64::new(re, 0.0)),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Scalar::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Complex(c) => write!(f, "{c}"),
        }
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<Complex64> for Scalar {
    fn from(v: Complex64) -> Self {
        Scalar::Complex(v)
    }
}

/// A Rust type that is the logical element of some [`DataType`].
pub trait Element: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// The data type whose logical elements are values of this type.
    const DTYPE: DataType;

    fn into_scalar(self) -> Scalar;

    /// Converts a boxed value, returning `None` when it cannot be
    /// represented in this type.
    fn from_scalar(value: Scalar) -> Option<Self>;
}

macro_rules! impl_element_float {
    ($($t:ty => $dtype:ident),*) => {
        $(
            impl Element for $t {
                const DTYPE: DataType = DataType::$dtype;

                #[inline]
                fn into_scalar(self) -> Scalar {
                    Scalar::Float(self as f64)
                }

                #[inline]
                fn from_scalar(value: Scalar) -> Option<Self> {
                    value.as_f64().map(|v| v as $t)
                }
            }
        )*
    };
}

macro_rules! impl_element_int {
    ($($t:ty => $dtype:ident),*) => {
        $(
            impl Element for $t {
                const DTYPE: DataType = DataType::$dtype;

                #[inline]
                fn into_scalar(self) -> Scalar {
                    Scalar::Int(self as i64)
                }

                #[inline]
                fn from_scalar(value: Scalar) -> Option<Self> {
                    value.as_i64().and_then(|v| <$t>::try_from(v).ok())
                }
            }
        )*
    };
}

impl_element_float!(f64 => Float64, f32 => Float32);

impl_element_int!(
    i32 => Int32, i16 => Int16, i8 => Int8,
    u32 => Uint32, u16 => Uint16, u8 => Uint8
);

impl Element for Complex64 {
    const DTYPE: DataType = DataType::Complex128;

    #[inline]
    fn into_scalar(self) -> Scalar {
        Scalar::Complex(self)
    }

    #[inline]
    fn from_scalar(value: Scalar) -> Option<Self> {
        value.as_complex()
    }
}

impl Element for Complex32 {
    const DTYPE: DataType = DataType::Complex64;

    #[inline]
    fn into_scalar(self) -> Scalar {
        Scalar::Complex(Complex64::new(self.re as f64, self.im as f64))
    }

    #[inline]
    fn from_scalar(value: Scalar) -> Option<Self> {
        value
            .as_complex()
            .map(|c| Complex32::new(c.re as f32, c.im as f32))
    }
}

impl Element for bool {
    const DTYPE: DataType = DataType::Bool;

    #[inline]
    fn into_scalar(self) -> Scalar {
        Scalar::Bool(self)
    }

    #[inline]
    fn from_scalar(value: Scalar) -> Option<Self> {
        value.as_bool()
    }
}

impl Element for Scalar {
    const DTYPE: DataType = DataType::Generic;

    #[inline]
    fn into_scalar(self) -> Scalar {
        self
    }

    #[inline]
    fn from_scalar(value: Scalar) -> Option<Self> {
        Some(value)
    }
}
