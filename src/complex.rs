//! Complex numbers over interleaved real storage.
//!
//! Complex buffers keep their elements as `[re0, im0, re1, im1, ...]`. Logical
//! element `i` occupies physical slots `2*i` and `2*i + 1`, so reading one
//! element builds a `Complex` value from two slots ([`ComplexRef`]) and
//! writing one splits it back ([`ComplexMut`]).

use num_complex::{Complex, Complex32, Complex64};
use strided_traits::{Accessor, AccessorMut};

/// Reinterpret a slice of `Complex64` as interleaved `f64` parts.
pub fn complex128_as_interleaved(src: &[Complex64]) -> &[f64] {
    bytemuck::cast_slice(src)
}

/// Mutable variant of [`complex128_as_interleaved`].
pub fn complex128_as_interleaved_mut(dst: &mut [Complex64]) -> &mut [f64] {
    bytemuck::cast_slice_mut(dst)
}

/// Reinterpret interleaved `f64` parts as `Complex64` values.
///
/// Returns `None` if `src` has an odd length.
pub fn interleaved_as_complex128(src: &[f64]) -> Option<&[Complex64]> {
    bytemuck::try_cast_slice(src).ok()
}

/// Reinterpret a slice of `Complex32` as interleaved `f32` parts.
pub fn complex64_as_interleaved(src: &[Complex32]) -> &[f32] {
    bytemuck::cast_slice(src)
}

/// Mutable variant of [`complex64_as_interleaved`].
pub fn complex64_as_interleaved_mut(dst: &mut [Complex32]) -> &mut [f32] {
    bytemuck::cast_slice_mut(dst)
}

/// Reinterpret interleaved `f32` parts as `Complex32` values.
///
/// Returns `None` if `src` has an odd length.
pub fn interleaved_as_complex64(src: &[f32]) -> Option<&[Complex32]> {
    bytemuck::try_cast_slice(src).ok()
}

/// Read accessor over interleaved complex storage.
#[derive(Debug, Clone, Copy)]
pub struct ComplexRef<'a, F> {
    data: &'a [F],
}

impl<'a, F: Copy> ComplexRef<'a, F> {
    pub fn new(data: &'a [F]) -> Self {
        Self { data }
    }

    /// The interleaved real storage.
    pub fn as_parts(&self) -> &'a [F] {
        self.data
    }
}

impl<F: Copy> Accessor for ComplexRef<'_, F> {
    type Value = Complex<F>;

    #[inline]
    fn len(&self) -> usize {
        self.data.len() / 2
    }

    #[inline]
    fn get(&self, idx: usize) -> Complex<F> {
        Complex::new(self.data[2 * idx], self.data[2 * idx + 1])
    }
}

/// Read/write accessor over interleaved complex storage.
#[derive(Debug)]
pub struct ComplexMut<'a, F> {
    data: &'a mut [F],
}

impl<'a, F: Copy> ComplexMut<'a, F> {
    pub fn new(data: &'a mut [F]) -> Self {
        Self { data }
    }

    pub fn as_parts(&self) -> &[F] {
        &*self.data
    }

    pub fn as_parts_mut(&mut self) -> &mut [F] {
        &mut *self.data
    }
}

impl<F: Copy> Accessor for ComplexMut<'_, F> {
    type Value = Complex<F>;

    #[inline]
    fn len(&self) -> usize {
        self.data.len() / 2
    }

    #[inline]
    fn get(&self, idx: usize) -> Complex<F> {
        Complex::new(self.data[2 * idx], self.data[2 * idx + 1])
    }
}

impl<F: Copy> AccessorMut for ComplexMut<'_, F> {
    #[inline]
    fn set(&mut self, idx: usize, value: Complex<F>) {
        self.data[2 * idx] = value.re;
        self.data[2 * idx + 1] = value.im;
    }
}

/// Double-precision complex multiplication.
#[inline]
pub fn cmul(a: Complex64, b: Complex64) -> Complex64 {
    Complex64::new(a.re * b.re - a.im * b.im, a.re * b.im + a.im * b.re)
}

/// Single-precision complex multiplication.
///
/// Every product and sum is an `f32` operation, so each intermediate is
/// rounded to single precision before it is used.
#[inline]
pub fn cmulf(a: Complex32, b: Complex32) -> Complex32 {
    let rr: f32 = a.re * b.re;
    let ii: f32 = a.im * b.im;
    let ri: f32 = a.re * b.im;
    let ir: f32 = a.im * b.re;
    Complex32::new(rr - ii, ri + ir)
}

#[inline]
pub fn cadd(a: Complex64, b: Complex64) -> Complex64 {
    Complex64::new(a.re + b.re, a.im + b.im)
}

#[inline]
pub fn caddf(a: Complex32, b: Complex32) -> Complex32 {
    Complex32::new(a.re + b.re, a.im + b.im)
}

#[inline]
pub fn csub(a: Complex64, b: Complex64) -> Complex64 {
    Complex64::new(a.re - b.re, a.im - b.im)
}

#[inline]
pub fn csubf(a: Complex32, b: Complex32) -> Complex32 {
    Complex32::new(a.re - b.re, a.im - b.im)
}

/// Modulus `|z|`, computed without undue overflow.
#[inline]
pub fn cabs(z: Complex64) -> f64 {
    z.re.hypot(z.im)
}

#[inline]
pub fn cabsf(z: Complex32) -> f32 {
    z.re.hypot(z.im)
}

/// `|re| + |im|`, the cheap magnitude used to skip no-op updates.
#[inline]
pub fn cabs1(z: Complex64) -> f64 {
    z.re.abs() + z.im.abs()
}

#[inline]
pub fn cabs1f(z: Complex32) -> f32 {
    z.re.abs() + z.im.abs()
}
