//! Typed array storage and accessor resolution.
//!
//! [`Buffer`] is the contiguous backing store of a strided array. It owns its
//! elements and carries exactly one [`DataType`]. Elements are reached in
//! one of two ways:
//!
//! - typed: [`BufferElement::reader`] / [`BufferElement::writer`] resolve
//!   the accessor for a Rust element type. Primitive dtypes get plain
//!   slices (direct indexing, no allocation); complex dtypes get
//!   [`ComplexRef`] / [`ComplexMut`], which pair two physical slots per
//!   logical element.
//! - dynamic: [`DynAccessor`] / [`DynAccessorMut`] read and write any buffer
//!   as a sequence of [`Scalar`] values.

use crate::complex::{complex128_as_interleaved, complex64_as_interleaved, ComplexMut, ComplexRef};
use crate::{Result, StridedError};
use num_complex::{Complex32, Complex64};
use strided_traits::{Accessor, AccessorMut, DataType, Element, Scalar};

/// Contiguous storage for one strided array.
///
/// Complex variants hold interleaved `[re, im, re, im, ...]` parts, so their
/// physical length is twice their logical length.
#[derive(Debug, Clone, PartialEq)]
pub enum Buffer {
    Float64(Vec<f64>),
    Float32(Vec<f32>),
    Int32(Vec<i32>),
    Int16(Vec<i16>),
    Int8(Vec<i8>),
    Uint32(Vec<u32>),
    Uint16(Vec<u16>),
    Uint8(Vec<u8>),
    Complex128(Vec<f64>),
    Complex64(Vec<f32>),
    Bool(Vec<bool>),
    Generic(Vec<Scalar>),
    Binary(Vec<u8>),
}

/// Allocate a zero-initialized buffer by dtype name.
///
/// Returns `None` for an unknown name, so callers can fall back to a
/// `generic` buffer.
pub fn allocate(dtype: &str, len: usize) -> Option<Buffer> {
    dtype.parse::<DataType>().ok().map(|dt| Buffer::zeros(dt, len))
}

impl Buffer {
    /// Zero-initialized storage for `len` logical elements.
    pub fn zeros(dtype: DataType, len: usize) -> Buffer {
        match dtype {
            DataType::Float64 => Buffer::Float64(vec![0.0; len]),
            DataType::Float32 => Buffer::Float32(vec![0.0; len]),
            DataType::Int32 => Buffer::Int32(vec![0; len]),
            DataType::Int16 => Buffer::Int16(vec![0; len]),
            DataType::Int8 => Buffer::Int8(vec![0; len]),
            DataType::Uint32 => Buffer::Uint32(vec![0; len]),
            DataType::Uint16 => Buffer::Uint16(vec![0; len]),
            DataType::Uint8 => Buffer::Uint8(vec![0; len]),
            DataType::Complex128 => Buffer::Complex128(vec![0.0; 2 * len]),
            DataType::Complex64 => Buffer::Complex64(vec![0.0; 2 * len]),
            DataType::Bool => Buffer::Bool(vec![false; len]),
            DataType::Generic => Buffer::Generic(vec![Scalar::Float(0.0); len]),
            DataType::Binary => Buffer::Binary(vec![0; len]),
        }
    }

    /// Build a complex128 buffer from complex values.
    pub fn from_complex128(values: &[Complex64]) -> Buffer {
        Buffer::Complex128(complex128_as_interleaved(values).to_vec())
    }

    /// Build a complex64 buffer from complex values.
    pub fn from_complex64(values: &[Complex32]) -> Buffer {
        Buffer::Complex64(complex64_as_interleaved(values).to_vec())
    }

    pub fn dtype(&self) -> DataType {
        match self {
            Buffer::Float64(_) => DataType::Float64,
            Buffer::Float32(_) => DataType::Float32,
            Buffer::Int32(_) => DataType::Int32,
            Buffer::Int16(_) => DataType::Int16,
            Buffer::Int8(_) => DataType::Int8,
            Buffer::Uint32(_) => DataType::Uint32,
            Buffer::Uint16(_) => DataType::Uint16,
            Buffer::Uint8(_) => DataType::Uint8,
            Buffer::Complex128(_) => DataType::Complex128,
            Buffer::Complex64(_) => DataType::Complex64,
            Buffer::Bool(_) => DataType::Bool,
            Buffer::Generic(_) => DataType::Generic,
            Buffer::Binary(_) => DataType::Binary,
        }
    }

    /// Number of logical elements.
    pub fn len(&self) -> usize {
        match self {
            Buffer::Float64(v) => v.len(),
            Buffer::Float32(v) => v.len(),
            Buffer::Int32(v) => v.len(),
            Buffer::Int16(v) => v.len(),
            Buffer::Int8(v) => v.len(),
            Buffer::Uint32(v) => v.len(),
            Buffer::Uint16(v) => v.len(),
            Buffer::Uint8(v) | Buffer::Binary(v) => v.len(),
            Buffer::Complex128(v) => v.len() / 2,
            Buffer::Complex64(v) => v.len() / 2,
            Buffer::Bool(v) => v.len(),
            Buffer::Generic(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes of fixed-width storage; `None` for `bool` and `generic`.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        let bytes: &[u8] = match self {
            Buffer::Float64(v) | Buffer::Complex128(v) => bytemuck::cast_slice(v),
            Buffer::Float32(v) | Buffer::Complex64(v) => bytemuck::cast_slice(v),
            Buffer::Int32(v) => bytemuck::cast_slice(v),
            Buffer::Int16(v) => bytemuck::cast_slice(v),
            Buffer::Int8(v) => bytemuck::cast_slice(v),
            Buffer::Uint32(v) => bytemuck::cast_slice(v),
            Buffer::Uint16(v) => bytemuck::cast_slice(v),
            Buffer::Uint8(v) | Buffer::Binary(v) => v,
            Buffer::Bool(_) | Buffer::Generic(_) => return None,
        };
        Some(bytes)
    }

    /// Typed read accessor, or `DataTypeMismatch` if `T` is not this
    /// buffer's element type.
    pub fn reader<T: BufferElement>(&self) -> Result<T::Reader<'_>> {
        T::reader(self).ok_or(StridedError::DataTypeMismatch {
            expected: T::DTYPE,
            found: self.dtype(),
        })
    }

    /// Typed write accessor, or `DataTypeMismatch` if `T` is not this
    /// buffer's element type.
    pub fn writer<T: BufferElement>(&mut self) -> Result<T::Writer<'_>> {
        let found = self.dtype();
        T::writer(self).ok_or(StridedError::DataTypeMismatch {
            expected: T::DTYPE,
            found,
        })
    }

    /// Read logical element `idx` as a boxed value.
    pub fn get_scalar(&self, idx: usize) -> Option<Scalar> {
        (idx < self.len()).then(|| self.scalar_at(idx))
    }

    /// Write logical element `idx` from a boxed value.
    ///
    /// Fails with `OutOfBounds` for a bad index and `ScalarConversion` when
    /// the value cannot be represented in this buffer's dtype.
    pub fn set_scalar(&mut self, idx: usize, value: Scalar) -> Result<()> {
        let len = self.len();
        if idx >= len {
            return Err(StridedError::OutOfBounds {
                index: idx as isize,
                len,
            });
        }
        self.store_scalar(idx, value)
    }

    /// Dynamic read accessor over any dtype.
    pub fn dyn_accessor(&self) -> DynAccessor<'_> {
        DynAccessor { buffer: self }
    }

    /// Dynamic write accessor over any dtype.
    pub fn dyn_accessor_mut(&mut self) -> DynAccessorMut<'_> {
        DynAccessorMut {
            buffer: self,
            error: None,
        }
    }

    fn scalar_at(&self, idx: usize) -> Scalar {
        match self {
            Buffer::Float64(v) => v[idx].into_scalar(),
            Buffer::Float32(v) => v[idx].into_scalar(),
            Buffer::Int32(v) => v[idx].into_scalar(),
            Buffer::Int16(v) => v[idx].into_scalar(),
            Buffer::Int8(v) => v[idx].into_scalar(),
            Buffer::Uint32(v) => v[idx].into_scalar(),
            Buffer::Uint16(v) => v[idx].into_scalar(),
            Buffer::Uint8(v) | Buffer::Binary(v) => v[idx].into_scalar(),
            Buffer::Complex128(v) => ComplexRef::new(v).get(idx).into_scalar(),
            Buffer::Complex64(v) => ComplexRef::new(v).get(idx).into_scalar(),
            Buffer::Bool(v) => v[idx].into_scalar(),
            Buffer::Generic(v) => v[idx],
        }
    }

    fn store_scalar(&mut self, idx: usize, value: Scalar) -> Result<()> {
        fn convert<T: Element>(value: Scalar, dtype: DataType) -> Result<T> {
            T::from_scalar(value).ok_or(StridedError::ScalarConversion { value, dtype })
        }

        let dtype = self.dtype();
        match self {
            Buffer::Float64(v) => v[idx] = convert(value, dtype)?,
            Buffer::Float32(v) => v[idx] = convert(value, dtype)?,
            Buffer::Int32(v) => v[idx] = convert(value, dtype)?,
            Buffer::Int16(v) => v[idx] = convert(value, dtype)?,
            Buffer::Int8(v) => v[idx] = convert(value, dtype)?,
            Buffer::Uint32(v) => v[idx] = convert(value, dtype)?,
            Buffer::Uint16(v) => v[idx] = convert(value, dtype)?,
            Buffer::Uint8(v) | Buffer::Binary(v) => v[idx] = convert(value, dtype)?,
            Buffer::Complex128(v) => {
                let z: Complex64 = convert(value, dtype)?;
                ComplexMut::new(v).set(idx, z);
            }
            Buffer::Complex64(v) => {
                let z: Complex32 = convert(value, dtype)?;
                ComplexMut::new(v).set(idx, z);
            }
            Buffer::Bool(v) => v[idx] = convert(value, dtype)?,
            Buffer::Generic(v) => v[idx] = value,
        }
        Ok(())
    }
}

macro_rules! impl_from_vec {
    ($($t:ty => $variant:ident),*) => {
        $(
            impl From<Vec<$t>> for Buffer {
                fn from(v: Vec<$t>) -> Self {
                    Buffer::$variant(v)
                }
            }
        )*
    };
}

impl_from_vec!(
    f64 => Float64, f32 => Float32,
    i32 => Int32, i16 => Int16, i8 => Int8,
    u32 => Uint32, u16 => Uint16, u8 => Uint8,
    bool => Bool, Scalar => Generic
);

impl From<Vec<Complex64>> for Buffer {
    fn from(v: Vec<Complex64>) -> Self {
        Buffer::from_complex128(&v)
    }
}

impl From<Vec<Complex32>> for Buffer {
    fn from(v: Vec<Complex32>) -> Self {
        Buffer::from_complex64(&v)
    }
}

/// An [`Element`] whose accessor can be resolved from a [`Buffer`].
pub trait BufferElement: Element {
    type Reader<'a>: Accessor<Value = Self>;
    type Writer<'a>: AccessorMut<Value = Self>;

    /// Read accessor, if `buffer` stores elements of this type.
    fn reader(buffer: &Buffer) -> Option<Self::Reader<'_>>;

    /// Write accessor, if `buffer` stores elements of this type.
    fn writer(buffer: &mut Buffer) -> Option<Self::Writer<'_>>;
}

macro_rules! impl_buffer_element_direct {
    ($($t:ty => $($variant:ident)|+;)*) => {
        $(
            impl BufferElement for $t {
                type Reader<'a> = &'a [$t];
                type Writer<'a> = &'a mut [$t];

                #[inline]
                fn reader(buffer: &Buffer) -> Option<Self::Reader<'_>> {
                    match buffer {
                        $(Buffer::$variant(v))|+ => Some(v.as_slice()),
                        _ => None,
                    }
                }

                #[inline]
                fn writer(buffer: &mut Buffer) -> Option<Self::Writer<'_>> {
                    match buffer {
                        $(Buffer::$variant(v))|+ => Some(v.as_mut_slice()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_buffer_element_direct!(
    f64 => Float64;
    f32 => Float32;
    i32 => Int32;
    i16 => Int16;
    i8 => Int8;
    u32 => Uint32;
    u16 => Uint16;
    u8 => Uint8 | Binary;
    bool => Bool;
    Scalar => Generic;
);

impl BufferElement for Complex64 {
    type Reader<'a> = ComplexRef<'a, f64>;
    type Writer<'a> = ComplexMut<'a, f64>;

    #[inline]
    fn reader(buffer: &Buffer) -> Option<Self::Reader<'_>> {
        match buffer {
            Buffer::Complex128(v) => Some(ComplexRef::new(v)),
            _ => None,
        }
    }

    #[inline]
    fn writer(buffer: &mut Buffer) -> Option<Self::Writer<'_>> {
        match buffer {
            Buffer::Complex128(v) => Some(ComplexMut::new(v)),
            _ => None,
        }
    }
}

impl BufferElement for Complex32 {
    type Reader<'a> = ComplexRef<'a, f32>;
    type Writer<'a> = ComplexMut<'a, f32>;

    #[inline]
    fn reader(buffer: &Buffer) -> Option<Self::Reader<'_>> {
        match buffer {
            Buffer::Complex64(v) => Some(ComplexRef::new(v)),
            _ => None,
        }
    }

    #[inline]
    fn writer(buffer: &mut Buffer) -> Option<Self::Writer<'_>> {
        match buffer {
            Buffer::Complex64(v) => Some(ComplexMut::new(v)),
            _ => None,
        }
    }
}

/// Reads any buffer as boxed [`Scalar`] values.
#[derive(Debug, Clone, Copy)]
pub struct DynAccessor<'a> {
    buffer: &'a Buffer,
}

impl Accessor for DynAccessor<'_> {
    type Value = Scalar;

    #[inline]
    fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    fn get(&self, idx: usize) -> Scalar {
        self.buffer.scalar_at(idx)
    }
}

/// Writes boxed [`Scalar`] values into any buffer.
///
/// A value that cannot be represented in the buffer's dtype leaves the
/// element untouched; the first such failure is kept and reported by
/// [`DynAccessorMut::finish`].
#[derive(Debug)]
pub struct DynAccessorMut<'a> {
    buffer: &'a mut Buffer,
    error: Option<StridedError>,
}

impl DynAccessorMut<'_> {
    /// Report the first conversion failure, if any.
    pub fn finish(self) -> Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Accessor for DynAccessorMut<'_> {
    type Value = Scalar;

    #[inline]
    fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    fn get(&self, idx: usize) -> Scalar {
        self.buffer.scalar_at(idx)
    }
}

impl AccessorMut for DynAccessorMut<'_> {
    #[inline]
    fn set(&mut self, idx: usize, value: Scalar) {
        if let Err(err) = self.buffer.store_scalar(idx, value) {
            self.error.get_or_insert(err);
        }
    }
}
