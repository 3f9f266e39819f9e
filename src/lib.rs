//! Strided array apply engine with multiple dispatch.
//!
//! This crate applies element-wise numeric callbacks across one-dimensional
//! strided arrays of heterogeneous data types. An array argument is a
//! [`Buffer`] plus a stride and an offset; logical element `i` lives at
//! physical index `offset + i * stride`, and strides may be negative or zero.
//!
//! # Layers
//!
//! - [`DataType`] and [`Buffer`]: typed storage. Complex dtypes keep
//!   interleaved real/imaginary parts and are read through accessors
//!   ([`ComplexRef`], [`ComplexMut`]) that build one complex value from two
//!   slots.
//! - [`StridedView`] and the [`apply`] engine: `nullary` through `quinary`
//!   loops written once against the [`Accessor`] protocol.
//! - [`apply_by`]: accessor-callback and masked variants.
//! - [`Dispatcher`]: picks a [`Kernel`] by the exact dtype tuple of a call,
//!   with in-place and accessor-callback (`_by`) entry points.
//! - [`blas`]: level 1 routines with loop-unrolled unit-stride paths.
//!
//! # Example
//!
//! ```rust
//! use stdlib_strided::{kernel_data, Buffer, DataType, Dispatcher, Kernel};
//!
//! let abs = Dispatcher::new(
//!     vec![Kernel::unary::<f64, f64>(), Kernel::unary::<f32, f32>()],
//!     vec![
//!         DataType::Float64, DataType::Float64,
//!         DataType::Float32, DataType::Float32,
//!     ],
//!     Some(vec![
//!         kernel_data(f64::abs as fn(f64) -> f64),
//!         kernel_data(f32::abs as fn(f32) -> f32),
//!     ]),
//!     5,
//!     1,
//!     1,
//! )
//! .unwrap();
//!
//! let x = Buffer::from(vec![-1.0f32, 2.0, -3.0]);
//! let mut y = Buffer::zeros(DataType::Float32, 3);
//! // Negative stride: read x back to front.
//! abs.call(3, &[(&x, -1)], &mut [(&mut y, 1)]).unwrap();
//! assert_eq!(y, Buffer::Float32(vec![3.0, 2.0, 1.0]));
//! ```
//!
//! # Logging
//!
//! Dispatch decisions are logged at `debug` level and fast-path selection
//! in [`blas`] at `trace` level through the [`log`] facade.

pub mod apply;
pub mod apply_by;
pub mod blas;
mod buffer;
mod complex;
pub mod config;
mod dispatch;
mod kernel;
pub mod ops;
mod poly;
pub mod promote;
mod view;

pub use buffer::{allocate, Buffer, BufferElement, DynAccessor, DynAccessorMut};
pub use complex::{
    cabs, cabs1, cabs1f, cabsf, cadd, caddf, cmul, cmulf, complex128_as_interleaved,
    complex128_as_interleaved_mut, complex64_as_interleaved, complex64_as_interleaved_mut, csub,
    csubf, interleaved_as_complex128, interleaved_as_complex64, ComplexMut, ComplexRef,
};
pub use config::{DtypeKind, DtypeRegistry, DtypeRegistryBuilder};
pub use dispatch::{Convention, Dispatcher, KernelSet};
pub use kernel::{
    kernel_data, AccessorCallback, Kernel, KernelData, Operand, OperandMut, StridedCall,
};
pub use poly::evalpoly;
pub use promote::{promote, promote_all, OutputPolicy};
pub use view::{stride_to_offset, validate_bounds, StridedView};

pub use strided_traits::{
    Accessor, AccessorMut, AccessorPair, DataType, Element, ParseDataTypeError, ReadAccessor,
    Scalar,
};

// ============================================================================
// Error types
// ============================================================================

fn join_dtypes(dtypes: &[DataType]) -> String {
    dtypes
        .iter()
        .map(|dt| dt.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_position(position: &Option<usize>) -> String {
    match position {
        Some(p) => format!("; no kernel accepts argument {p}"),
        None => String::new(),
    }
}

/// Errors that can occur while configuring or running strided operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StridedError {
    /// A dispatcher was given an empty kernel list.
    #[error("kernel list must not be empty")]
    EmptyKernelList,

    #[error("kernel data must have one entry per kernel: {kernels} kernels, {data} data")]
    KernelDataLengthMismatch { kernels: usize, data: usize },

    /// `nargs` must be positive.
    #[error("number of arguments must be positive")]
    InvalidArgumentCount,

    #[error("operation must take at least one array argument")]
    NoArrayArguments,

    /// `nargs` fits neither calling convention.
    #[error("nargs={nargs} is incompatible with nin={nin} and nout={nout}")]
    IncompatibleArgumentCount { nargs: usize, nin: usize, nout: usize },

    #[error("signature table has {found} data types, expected {expected}")]
    SignatureLengthMismatch { expected: usize, found: usize },

    /// No signature row matches the argument dtypes.
    #[error("no kernel for data types ({}){}", join_dtypes(.dtypes), describe_position(.position))]
    UnsupportedDataTypes {
        dtypes: Vec<DataType>,
        position: Option<usize>,
    },

    #[error("expected {expected} {role} arrays, found {found}")]
    ArrayCountMismatch {
        role: &'static str,
        expected: usize,
        found: usize,
    },

    /// An index outside a buffer of `len` logical elements.
    #[error("index {index} out of bounds for length {len}")]
    OutOfBounds { index: isize, len: usize },

    /// Array argument `position` is too short for its access pattern.
    #[error("array argument {position}: index {index} out of bounds for length {len}")]
    ArgumentOutOfBounds {
        position: usize,
        index: isize,
        len: usize,
    },

    #[error("expected a {expected} buffer, found {found}")]
    DataTypeMismatch { expected: DataType, found: DataType },

    /// The kernel's row data is absent or not the callback type it expects.
    #[error("kernel data missing or of the wrong type")]
    MissingKernelData,

    #[error("value {value} cannot be represented as {dtype}")]
    ScalarConversion { value: Scalar, dtype: DataType },

    /// The resolved kernel does not route elements through an accessor
    /// callback.
    #[error("kernel does not accept an accessor callback")]
    CallbackUnsupported,

    #[error("in-place call needs an input and an output, got nin={nin} nout={nout}")]
    InPlaceUnsupported { nin: usize, nout: usize },
}

/// Result type for strided array operations.
pub type Result<T> = std::result::Result<T, StridedError>;
