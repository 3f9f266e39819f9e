//! One-dimensional strided views over an accessor.
//!
//! A [`StridedView`] maps logical index `i` in `0..len` to the physical index
//! `offset + i * stride` of its accessor. Strides may be negative or zero; the
//! offset of a view built with [`StridedView::from_stride`] points at the
//! first logical element, which for a negative stride is the last physical
//! one.

use crate::{Result, StridedError};
use strided_traits::{Accessor, AccessorMut};

/// A strided view over an accessor `A`.
///
/// The same type serves both directions: a view over a read accessor
/// supports [`get`](StridedView::get), a view over a write accessor also
/// supports [`set`](StridedView::set).
#[derive(Debug, Clone, Copy)]
pub struct StridedView<A> {
    data: A,
    len: usize,
    stride: isize,
    offset: usize,
}

impl<A: Accessor> StridedView<A> {
    /// Create a new strided view.
    ///
    /// # Errors
    /// Returns `OutOfBounds` if some logical element would fall outside the
    /// accessor.
    pub fn new(data: A, len: usize, stride: isize, offset: usize) -> Result<Self> {
        validate_bounds(data.len(), len, stride, offset)?;
        Ok(Self {
            data,
            len,
            stride,
            offset,
        })
    }

    /// Create a view whose offset is derived from the stride.
    pub fn from_stride(data: A, len: usize, stride: isize) -> Result<Self> {
        Self::new(data, len, stride, stride_to_offset(len, stride))
    }

    /// Create a view without bounds checking.
    ///
    /// Out-of-range elements are still caught by the accessor, which panics
    /// on access.
    pub fn new_unchecked(data: A, len: usize, stride: isize, offset: usize) -> Self {
        Self {
            data,
            len,
            stride,
            offset,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn stride(&self) -> isize {
        self.stride
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The underlying accessor.
    #[inline]
    pub fn data(&self) -> &A {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut A {
        &mut self.data
    }

    pub fn into_inner(self) -> A {
        self.data
    }

    /// Physical index of logical element `i`.
    #[inline(always)]
    pub fn physical_index(&self, i: usize) -> usize {
        (self.offset as isize + i as isize * self.stride) as usize
    }

    #[inline(always)]
    pub fn get(&self, i: usize) -> A::Value {
        self.data.get(self.physical_index(i))
    }

    /// The same elements in reverse logical order.
    pub fn reversed(self) -> Self {
        if self.len == 0 {
            return self;
        }
        let offset = self.physical_index(self.len - 1);
        Self {
            data: self.data,
            len: self.len,
            stride: -self.stride,
            offset,
        }
    }

    /// Copy the logical elements out in order.
    pub fn to_vec(&self) -> Vec<A::Value> {
        (0..self.len).map(|i| self.get(i)).collect()
    }
}

impl<A: AccessorMut> StridedView<A> {
    #[inline(always)]
    pub fn set(&mut self, i: usize, value: A::Value) {
        let idx = self.physical_index(i);
        self.data.set(idx, value);
    }
}

/// Offset of the first logical element for a view addressed only by stride.
///
/// Zero for non-negative strides, `(1 - n) * stride` for negative ones.
#[inline]
pub fn stride_to_offset(n: usize, stride: isize) -> usize {
    if stride < 0 && n > 0 {
        (1 - n as isize).wrapping_mul(stride) as usize
    } else {
        0
    }
}

/// Check that `n` elements at `offset + i * stride` fit in `data_len` slots.
pub fn validate_bounds(data_len: usize, n: usize, stride: isize, offset: usize) -> Result<()> {
    if n == 0 {
        return Ok(());
    }

    let base = offset as isize;
    let span = (n as isize - 1)
        .checked_mul(stride)
        .and_then(|s| s.checked_add(base))
        .ok_or(StridedError::OutOfBounds {
            index: isize::MAX,
            len: data_len,
        })?;
    let (min_offset, max_offset) = if stride < 0 { (span, base) } else { (base, span) };

    if min_offset < 0 {
        return Err(StridedError::OutOfBounds {
            index: min_offset,
            len: data_len,
        });
    }
    if max_offset as usize >= data_len {
        return Err(StridedError::OutOfBounds {
            index: max_offset,
            len: data_len,
        });
    }
    Ok(())
}
