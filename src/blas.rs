//! BLAS-style level 1 routines with loop-unrolled fast paths.
//!
//! Every routine comes in two forms: the plain form derives the offset of
//! each array from the sign of its stride, the `_ndarray` form takes it
//! explicitly. Strides and offsets are in logical elements; complex routines
//! operate on interleaved `[re, im, ...]` storage.
//!
//! Unrolled paths apply only to unit strides. The `n % M` clean-up elements
//! are handled first, then blocks of `M`. Any other stride, including zero,
//! runs the single-element loop of the apply engine.
//!
//! # Panics
//! Like the apply engine, these routines do not validate their arguments.
//! An access pattern that leaves the slice panics.

use crate::apply;
use crate::complex::{cabs1, cabs1f, cadd, caddf, cmul, cmulf, ComplexMut, ComplexRef};
use crate::view::{stride_to_offset, StridedView};
use log::trace;
use num_complex::{Complex, Complex32, Complex64};
use num_traits::Float;
use strided_traits::{Accessor, AccessorMut};

const FILL_UNROLL: usize = 8;
const COPY_UNROLL: usize = 8;
const AXPY_UNROLL: usize = 4;
const SCAL_UNROLL: usize = 5;
const SWAP_UNROLL: usize = 3;

/// `y[i] = f(x[i], y[i])` with running indices.
#[inline]
fn update<X, Y, F>(n: usize, x: &StridedView<X>, y: &mut StridedView<Y>, f: F)
where
    X: Accessor,
    Y: AccessorMut,
    F: Fn(X::Value, Y::Value) -> Y::Value,
{
    let sx = x.stride();
    let sy = y.stride();
    let mut ix = x.offset() as isize;
    let mut iy = y.offset() as isize;
    let src = x.data();
    let out = y.data_mut();
    for _ in 0..n {
        let idx = iy as usize;
        let v = f(src.get(ix as usize), out.get(idx));
        out.set(idx, v);
        ix += sx;
        iy += sy;
    }
}

// ============================================================================
// Real kernels, shared by the double and single precision entry points
// ============================================================================

fn fill_real<T: Copy>(name: &str, n: usize, alpha: T, x: &mut [T], stride: isize, offset: usize) {
    if n == 0 {
        return;
    }
    if stride == 1 {
        trace!("{}: unrolled, n={}", name, n);
        let m = n % FILL_UNROLL;
        let x = &mut x[offset..offset + n];
        let (head, tail) = x.split_at_mut(m);
        head.fill(alpha);
        for c in tail.chunks_exact_mut(FILL_UNROLL) {
            c[0] = alpha;
            c[1] = alpha;
            c[2] = alpha;
            c[3] = alpha;
            c[4] = alpha;
            c[5] = alpha;
            c[6] = alpha;
            c[7] = alpha;
        }
        return;
    }
    trace!("{}: strided, n={} stride={}", name, n, stride);
    let mut view = StridedView::new_unchecked(x, n, stride, offset);
    apply::nullary(n, &mut view, || alpha);
}

#[allow(clippy::too_many_arguments)]
fn copy_real<T: Copy>(
    name: &str,
    n: usize,
    x: &[T],
    stride_x: isize,
    offset_x: usize,
    y: &mut [T],
    stride_y: isize,
    offset_y: usize,
) {
    if n == 0 {
        return;
    }
    if stride_x == 1 && stride_y == 1 {
        trace!("{}: unrolled, n={}", name, n);
        let m = n % COPY_UNROLL;
        let src = &x[offset_x..offset_x + n];
        let dst = &mut y[offset_y..offset_y + n];
        dst[..m].copy_from_slice(&src[..m]);
        for (d, s) in dst[m..]
            .chunks_exact_mut(COPY_UNROLL)
            .zip(src[m..].chunks_exact(COPY_UNROLL))
        {
            d[0] = s[0];
            d[1] = s[1];
            d[2] = s[2];
            d[3] = s[3];
            d[4] = s[4];
            d[5] = s[5];
            d[6] = s[6];
            d[7] = s[7];
        }
        return;
    }
    trace!("{}: strided, n={}", name, n);
    let xv = StridedView::new_unchecked(x, n, stride_x, offset_x);
    let mut yv = StridedView::new_unchecked(y, n, stride_y, offset_y);
    apply::unary(n, &xv, &mut yv, |v| v);
}

#[allow(clippy::too_many_arguments)]
fn axpy_real<T: Float>(
    name: &str,
    n: usize,
    alpha: T,
    x: &[T],
    stride_x: isize,
    offset_x: usize,
    y: &mut [T],
    stride_y: isize,
    offset_y: usize,
) {
    if n == 0 || alpha == T::zero() {
        return;
    }
    if stride_x == 1 && stride_y == 1 {
        trace!("{}: unrolled, n={}", name, n);
        let m = n % AXPY_UNROLL;
        let src = &x[offset_x..offset_x + n];
        let dst = &mut y[offset_y..offset_y + n];
        for i in 0..m {
            dst[i] = dst[i] + alpha * src[i];
        }
        for (d, s) in dst[m..]
            .chunks_exact_mut(AXPY_UNROLL)
            .zip(src[m..].chunks_exact(AXPY_UNROLL))
        {
            d[0] = d[0] + alpha * s[0];
            d[1] = d[1] + alpha * s[1];
            d[2] = d[2] + alpha * s[2];
            d[3] = d[3] + alpha * s[3];
        }
        return;
    }
    trace!("{}: strided, n={}", name, n);
    let xv = StridedView::new_unchecked(x, n, stride_x, offset_x);
    let mut yv = StridedView::new_unchecked(y, n, stride_y, offset_y);
    update(n, &xv, &mut yv, |a, b| b + alpha * a);
}

fn scal_real<T: Float>(name: &str, n: usize, alpha: T, x: &mut [T], stride: isize, offset: usize) {
    if n == 0 {
        return;
    }
    if stride == 1 {
        trace!("{}: unrolled, n={}", name, n);
        let m = n % SCAL_UNROLL;
        let x = &mut x[offset..offset + n];
        let (head, tail) = x.split_at_mut(m);
        for v in head {
            *v = alpha * *v;
        }
        for c in tail.chunks_exact_mut(SCAL_UNROLL) {
            c[0] = alpha * c[0];
            c[1] = alpha * c[1];
            c[2] = alpha * c[2];
            c[3] = alpha * c[3];
            c[4] = alpha * c[4];
        }
        return;
    }
    trace!("{}: strided, n={} stride={}", name, n, stride);
    let mut view = StridedView::new_unchecked(x, n, stride, offset);
    apply::unary_in_place(n, &mut view, |v| alpha * v);
}

#[allow(clippy::too_many_arguments)]
fn swap_real<T: Copy>(
    name: &str,
    n: usize,
    x: &mut [T],
    stride_x: isize,
    offset_x: usize,
    y: &mut [T],
    stride_y: isize,
    offset_y: usize,
) {
    if n == 0 {
        return;
    }
    if stride_x == 1 && stride_y == 1 {
        trace!("{}: unrolled, n={}", name, n);
        let m = n % SWAP_UNROLL;
        let a = &mut x[offset_x..offset_x + n];
        let b = &mut y[offset_y..offset_y + n];
        let (a_head, a_tail) = a.split_at_mut(m);
        let (b_head, b_tail) = b.split_at_mut(m);
        a_head.swap_with_slice(b_head);
        for (p, q) in a_tail
            .chunks_exact_mut(SWAP_UNROLL)
            .zip(b_tail.chunks_exact_mut(SWAP_UNROLL))
        {
            std::mem::swap(&mut p[0], &mut q[0]);
            std::mem::swap(&mut p[1], &mut q[1]);
            std::mem::swap(&mut p[2], &mut q[2]);
        }
        return;
    }
    trace!("{}: strided, n={}", name, n);
    let mut ix = offset_x as isize;
    let mut iy = offset_y as isize;
    for _ in 0..n {
        std::mem::swap(&mut x[ix as usize], &mut y[iy as usize]);
        ix += stride_x;
        iy += stride_y;
    }
}

// ============================================================================
// Complex kernels over interleaved storage
// ============================================================================

fn fill_complex<F: Float>(
    name: &str,
    n: usize,
    alpha: Complex<F>,
    x: &mut [F],
    stride: isize,
    offset: usize,
) {
    if n == 0 {
        return;
    }
    let physical_stride = 2 * stride;
    if physical_stride == 2 {
        trace!("{}: unrolled, n={}", name, n);
        let (re, im) = (alpha.re, alpha.im);
        let m = n % FILL_UNROLL;
        let parts = &mut x[2 * offset..2 * (offset + n)];
        let (head, tail) = parts.split_at_mut(2 * m);
        for pair in head.chunks_exact_mut(2) {
            pair[0] = re;
            pair[1] = im;
        }
        for c in tail.chunks_exact_mut(2 * FILL_UNROLL) {
            c[0] = re;
            c[1] = im;
            c[2] = re;
            c[3] = im;
            c[4] = re;
            c[5] = im;
            c[6] = re;
            c[7] = im;
            c[8] = re;
            c[9] = im;
            c[10] = re;
            c[11] = im;
            c[12] = re;
            c[13] = im;
            c[14] = re;
            c[15] = im;
        }
        return;
    }
    trace!("{}: strided, n={} stride={}", name, n, stride);
    let mut view = StridedView::new_unchecked(ComplexMut::new(x), n, stride, offset);
    apply::nullary(n, &mut view, || alpha);
}

fn copy_complex<F: Float>(
    n: usize,
    x: &[F],
    stride_x: isize,
    offset_x: usize,
    y: &mut [F],
    stride_y: isize,
    offset_y: usize,
) {
    let xv = StridedView::new_unchecked(ComplexRef::new(x), n, stride_x, offset_x);
    let mut yv = StridedView::new_unchecked(ComplexMut::new(y), n, stride_y, offset_y);
    apply::unary(n, &xv, &mut yv, |v| v);
}

// ============================================================================
// fill
// ============================================================================

/// Fill a double-precision strided array with `alpha`.
pub fn dfill(n: usize, alpha: f64, x: &mut [f64], stride: isize) {
    dfill_ndarray(n, alpha, x, stride, stride_to_offset(n, stride));
}

pub fn dfill_ndarray(n: usize, alpha: f64, x: &mut [f64], stride: isize, offset: usize) {
    fill_real("dfill", n, alpha, x, stride, offset);
}

/// Fill a single-precision strided array with `alpha`.
pub fn sfill(n: usize, alpha: f32, x: &mut [f32], stride: isize) {
    sfill_ndarray(n, alpha, x, stride, stride_to_offset(n, stride));
}

pub fn sfill_ndarray(n: usize, alpha: f32, x: &mut [f32], stride: isize, offset: usize) {
    fill_real("sfill", n, alpha, x, stride, offset);
}

/// Fill a double-precision complex strided array with `alpha`.
pub fn zfill(n: usize, alpha: Complex64, x: &mut [f64], stride: isize) {
    zfill_ndarray(n, alpha, x, stride, stride_to_offset(n, stride));
}

pub fn zfill_ndarray(n: usize, alpha: Complex64, x: &mut [f64], stride: isize, offset: usize) {
    fill_complex("zfill", n, alpha, x, stride, offset);
}

/// Fill a single-precision complex strided array with `alpha`.
pub fn cfill(n: usize, alpha: Complex32, x: &mut [f32], stride: isize) {
    cfill_ndarray(n, alpha, x, stride, stride_to_offset(n, stride));
}

pub fn cfill_ndarray(n: usize, alpha: Complex32, x: &mut [f32], stride: isize, offset: usize) {
    fill_complex("cfill", n, alpha, x, stride, offset);
}

/// Fill any accessor with `alpha`, one element at a time.
pub fn gfill<A: AccessorMut>(n: usize, alpha: A::Value, x: A, stride: isize) {
    gfill_ndarray(n, alpha, x, stride, stride_to_offset(n, stride));
}

pub fn gfill_ndarray<A: AccessorMut>(
    n: usize,
    alpha: A::Value,
    x: A,
    stride: isize,
    offset: usize,
) {
    let mut view = StridedView::new_unchecked(x, n, stride, offset);
    apply::nullary(n, &mut view, || alpha);
}

// ============================================================================
// copy
// ============================================================================

pub fn dcopy(n: usize, x: &[f64], stride_x: isize, y: &mut [f64], stride_y: isize) {
    dcopy_ndarray(
        n,
        x,
        stride_x,
        stride_to_offset(n, stride_x),
        y,
        stride_y,
        stride_to_offset(n, stride_y),
    );
}

pub fn dcopy_ndarray(
    n: usize,
    x: &[f64],
    stride_x: isize,
    offset_x: usize,
    y: &mut [f64],
    stride_y: isize,
    offset_y: usize,
) {
    copy_real("dcopy", n, x, stride_x, offset_x, y, stride_y, offset_y);
}

pub fn scopy(n: usize, x: &[f32], stride_x: isize, y: &mut [f32], stride_y: isize) {
    scopy_ndarray(
        n,
        x,
        stride_x,
        stride_to_offset(n, stride_x),
        y,
        stride_y,
        stride_to_offset(n, stride_y),
    );
}

pub fn scopy_ndarray(
    n: usize,
    x: &[f32],
    stride_x: isize,
    offset_x: usize,
    y: &mut [f32],
    stride_y: isize,
    offset_y: usize,
) {
    copy_real("scopy", n, x, stride_x, offset_x, y, stride_y, offset_y);
}

pub fn zcopy(n: usize, x: &[f64], stride_x: isize, y: &mut [f64], stride_y: isize) {
    zcopy_ndarray(
        n,
        x,
        stride_x,
        stride_to_offset(n, stride_x),
        y,
        stride_y,
        stride_to_offset(n, stride_y),
    );
}

pub fn zcopy_ndarray(
    n: usize,
    x: &[f64],
    stride_x: isize,
    offset_x: usize,
    y: &mut [f64],
    stride_y: isize,
    offset_y: usize,
) {
    copy_complex(n, x, stride_x, offset_x, y, stride_y, offset_y);
}

pub fn ccopy(n: usize, x: &[f32], stride_x: isize, y: &mut [f32], stride_y: isize) {
    ccopy_ndarray(
        n,
        x,
        stride_x,
        stride_to_offset(n, stride_x),
        y,
        stride_y,
        stride_to_offset(n, stride_y),
    );
}

pub fn ccopy_ndarray(
    n: usize,
    x: &[f32],
    stride_x: isize,
    offset_x: usize,
    y: &mut [f32],
    stride_y: isize,
    offset_y: usize,
) {
    copy_complex(n, x, stride_x, offset_x, y, stride_y, offset_y);
}

// ============================================================================
// axpy
// ============================================================================

/// `y = alpha * x + y` in double precision.
pub fn daxpy(n: usize, alpha: f64, x: &[f64], stride_x: isize, y: &mut [f64], stride_y: isize) {
    daxpy_ndarray(
        n,
        alpha,
        x,
        stride_x,
        stride_to_offset(n, stride_x),
        y,
        stride_y,
        stride_to_offset(n, stride_y),
    );
}

#[allow(clippy::too_many_arguments)]
pub fn daxpy_ndarray(
    n: usize,
    alpha: f64,
    x: &[f64],
    stride_x: isize,
    offset_x: usize,
    y: &mut [f64],
    stride_y: isize,
    offset_y: usize,
) {
    axpy_real("daxpy", n, alpha, x, stride_x, offset_x, y, stride_y, offset_y);
}

/// `y = alpha * x + y` in single precision.
pub fn saxpy(n: usize, alpha: f32, x: &[f32], stride_x: isize, y: &mut [f32], stride_y: isize) {
    saxpy_ndarray(
        n,
        alpha,
        x,
        stride_x,
        stride_to_offset(n, stride_x),
        y,
        stride_y,
        stride_to_offset(n, stride_y),
    );
}

#[allow(clippy::too_many_arguments)]
pub fn saxpy_ndarray(
    n: usize,
    alpha: f32,
    x: &[f32],
    stride_x: isize,
    offset_x: usize,
    y: &mut [f32],
    stride_y: isize,
    offset_y: usize,
) {
    axpy_real("saxpy", n, alpha, x, stride_x, offset_x, y, stride_y, offset_y);
}

/// `y = alpha * x + y` over double-precision complex storage.
pub fn zaxpy(
    n: usize,
    alpha: Complex64,
    x: &[f64],
    stride_x: isize,
    y: &mut [f64],
    stride_y: isize,
) {
    zaxpy_ndarray(
        n,
        alpha,
        x,
        stride_x,
        stride_to_offset(n, stride_x),
        y,
        stride_y,
        stride_to_offset(n, stride_y),
    );
}

#[allow(clippy::too_many_arguments)]
pub fn zaxpy_ndarray(
    n: usize,
    alpha: Complex64,
    x: &[f64],
    stride_x: isize,
    offset_x: usize,
    y: &mut [f64],
    stride_y: isize,
    offset_y: usize,
) {
    if n == 0 || cabs1(alpha) == 0.0 {
        return;
    }
    let xv = StridedView::new_unchecked(ComplexRef::new(x), n, stride_x, offset_x);
    let mut yv = StridedView::new_unchecked(ComplexMut::new(y), n, stride_y, offset_y);
    update(n, &xv, &mut yv, |a, b| cadd(cmul(alpha, a), b));
}

/// `y = alpha * x + y` over single-precision complex storage.
///
/// Every intermediate is rounded to `f32`.
pub fn caxpy(
    n: usize,
    alpha: Complex32,
    x: &[f32],
    stride_x: isize,
    y: &mut [f32],
    stride_y: isize,
) {
    caxpy_ndarray(
        n,
        alpha,
        x,
        stride_x,
        stride_to_offset(n, stride_x),
        y,
        stride_y,
        stride_to_offset(n, stride_y),
    );
}

#[allow(clippy::too_many_arguments)]
pub fn caxpy_ndarray(
    n: usize,
    alpha: Complex32,
    x: &[f32],
    stride_x: isize,
    offset_x: usize,
    y: &mut [f32],
    stride_y: isize,
    offset_y: usize,
) {
    if n == 0 || cabs1f(alpha) == 0.0 {
        return;
    }
    let xv = StridedView::new_unchecked(ComplexRef::new(x), n, stride_x, offset_x);
    let mut yv = StridedView::new_unchecked(ComplexMut::new(y), n, stride_y, offset_y);
    update(n, &xv, &mut yv, |a, b| caddf(cmulf(alpha, a), b));
}

// ============================================================================
// scal
// ============================================================================

/// `x = alpha * x` in double precision.
pub fn dscal(n: usize, alpha: f64, x: &mut [f64], stride: isize) {
    dscal_ndarray(n, alpha, x, stride, stride_to_offset(n, stride));
}

pub fn dscal_ndarray(n: usize, alpha: f64, x: &mut [f64], stride: isize, offset: usize) {
    scal_real("dscal", n, alpha, x, stride, offset);
}

/// `x = alpha * x` in single precision.
pub fn sscal(n: usize, alpha: f32, x: &mut [f32], stride: isize) {
    sscal_ndarray(n, alpha, x, stride, stride_to_offset(n, stride));
}

pub fn sscal_ndarray(n: usize, alpha: f32, x: &mut [f32], stride: isize, offset: usize) {
    scal_real("sscal", n, alpha, x, stride, offset);
}

pub fn zscal(n: usize, alpha: Complex64, x: &mut [f64], stride: isize) {
    zscal_ndarray(n, alpha, x, stride, stride_to_offset(n, stride));
}

pub fn zscal_ndarray(n: usize, alpha: Complex64, x: &mut [f64], stride: isize, offset: usize) {
    let mut view = StridedView::new_unchecked(ComplexMut::new(x), n, stride, offset);
    apply::unary_in_place(n, &mut view, |v| cmul(alpha, v));
}

pub fn cscal(n: usize, alpha: Complex32, x: &mut [f32], stride: isize) {
    cscal_ndarray(n, alpha, x, stride, stride_to_offset(n, stride));
}

pub fn cscal_ndarray(n: usize, alpha: Complex32, x: &mut [f32], stride: isize, offset: usize) {
    let mut view = StridedView::new_unchecked(ComplexMut::new(x), n, stride, offset);
    apply::unary_in_place(n, &mut view, |v| cmulf(alpha, v));
}

// ============================================================================
// swap
// ============================================================================

/// Exchange two double-precision strided arrays.
pub fn dswap(n: usize, x: &mut [f64], stride_x: isize, y: &mut [f64], stride_y: isize) {
    dswap_ndarray(
        n,
        x,
        stride_x,
        stride_to_offset(n, stride_x),
        y,
        stride_y,
        stride_to_offset(n, stride_y),
    );
}

pub fn dswap_ndarray(
    n: usize,
    x: &mut [f64],
    stride_x: isize,
    offset_x: usize,
    y: &mut [f64],
    stride_y: isize,
    offset_y: usize,
) {
    swap_real("dswap", n, x, stride_x, offset_x, y, stride_y, offset_y);
}

/// Exchange two single-precision strided arrays.
pub fn sswap(n: usize, x: &mut [f32], stride_x: isize, y: &mut [f32], stride_y: isize) {
    sswap_ndarray(
        n,
        x,
        stride_x,
        stride_to_offset(n, stride_x),
        y,
        stride_y,
        stride_to_offset(n, stride_y),
    );
}

pub fn sswap_ndarray(
    n: usize,
    x: &mut [f32],
    stride_x: isize,
    offset_x: usize,
    y: &mut [f32],
    stride_y: isize,
    offset_y: usize,
) {
    swap_real("sswap", n, x, stride_x, offset_x, y, stride_y, offset_y);
}
