//! Shared traits for the stdlib-strided ecosystem.
//!
//! This crate provides the leaf definitions shared by the buffer layer, the
//! apply engine and the dispatch front end:
//!
//! - [`DataType`]: the storage-kind registry
//! - [`Element`]: the element type bound, and [`Scalar`], the boxed value
//!   of `generic` arrays
//! - [`Accessor`] / [`AccessorMut`]: the element access protocol, with
//!   [`AccessorPair`] and [`ReadAccessor`] for caller-defined access
//!
//! External crates can depend on `strided-traits` to implement these traits
//! for their own storage without orphan rule violations.

pub mod accessor;
pub mod dtype;
pub mod scalar;

pub use accessor::{Accessor, AccessorMut, AccessorPair, ReadAccessor};
pub use dtype::{DataType, ParseDataTypeError};
pub use scalar::{Element, Scalar};
