//! Apply routines with an accessor callback or a mask.
//!
//! The `*_by` variants route every element through a caller callback before
//! the kernel runs. The callback sees the value, the logical index and the
//! physical index of each array; returning `None` marks the element as a
//! hole and leaves the output untouched.
//!
//! The `mask_*` variants take an extra `u8` array: a non-zero mask element
//! means "masked" and the corresponding output element is left untouched.

use crate::view::StridedView;
use strided_traits::{Accessor, AccessorMut};

/// Fill `y` from `f`, passing each produced value through `clbk`.
///
/// `clbk(value, i, [iy])` returns the value to store, or `None` to skip.
pub fn nullary_by<Y, F, C>(n: usize, y: &mut StridedView<Y>, mut f: F, mut clbk: C)
where
    Y: AccessorMut,
    F: FnMut() -> Y::Value,
    C: FnMut(Y::Value, usize, [usize; 1]) -> Option<Y::Value>,
{
    let sy = y.stride();
    let mut iy = y.offset() as isize;
    let out = y.data_mut();
    for i in 0..n {
        if let Some(v) = clbk(f(), i, [iy as usize]) {
            out.set(iy as usize, v);
        }
        iy += sy;
    }
}

/// `y[i] = f(clbk(x[i], i, [ix, iy]))`, skipping holes.
pub fn unary_by<X, Y, F, C>(
    n: usize,
    x: &StridedView<X>,
    y: &mut StridedView<Y>,
    mut f: F,
    mut clbk: C,
) where
    X: Accessor,
    Y: AccessorMut,
    F: FnMut(X::Value) -> Y::Value,
    C: FnMut(X::Value, usize, [usize; 2]) -> Option<X::Value>,
{
    let sx = x.stride();
    let sy = y.stride();
    let mut ix = x.offset() as isize;
    let mut iy = y.offset() as isize;
    let src = x.data();
    let out = y.data_mut();
    for i in 0..n {
        let (px, py) = (ix as usize, iy as usize);
        if let Some(v) = clbk(src.get(px), i, [px, py]) {
            out.set(py, f(v));
        }
        ix += sx;
        iy += sy;
    }
}

/// `z[i] = f(clbk((x[i], y[i]), i, [ix, iy, iz]))`, skipping holes.
pub fn binary_by<X, Y, Z, F, C>(
    n: usize,
    x: &StridedView<X>,
    y: &StridedView<Y>,
    z: &mut StridedView<Z>,
    mut f: F,
    mut clbk: C,
) where
    X: Accessor,
    Y: Accessor,
    Z: AccessorMut,
    F: FnMut(X::Value, Y::Value) -> Z::Value,
    C: FnMut((X::Value, Y::Value), usize, [usize; 3]) -> Option<(X::Value, Y::Value)>,
{
    let sx = x.stride();
    let sy = y.stride();
    let sz = z.stride();
    let mut ix = x.offset() as isize;
    let mut iy = y.offset() as isize;
    let mut iz = z.offset() as isize;
    let (a, b) = (x.data(), y.data());
    let out = z.data_mut();
    for i in 0..n {
        let (px, py, pz) = (ix as usize, iy as usize, iz as usize);
        if let Some((u, v)) = clbk((a.get(px), b.get(py)), i, [px, py, pz]) {
            out.set(pz, f(u, v));
        }
        ix += sx;
        iy += sy;
        iz += sz;
    }
}

/// `y[i] = f(x[i])` wherever `mask[i] == 0`.
pub fn mask_unary<X, M, Y, F>(
    n: usize,
    x: &StridedView<X>,
    mask: &StridedView<M>,
    y: &mut StridedView<Y>,
    mut f: F,
) where
    X: Accessor,
    M: Accessor<Value = u8>,
    Y: AccessorMut,
    F: FnMut(X::Value) -> Y::Value,
{
    let sx = x.stride();
    let sm = mask.stride();
    let sy = y.stride();
    let mut ix = x.offset() as isize;
    let mut im = mask.offset() as isize;
    let mut iy = y.offset() as isize;
    let (src, m) = (x.data(), mask.data());
    let out = y.data_mut();
    for _ in 0..n {
        if m.get(im as usize) == 0 {
            out.set(iy as usize, f(src.get(ix as usize)));
        }
        ix += sx;
        im += sm;
        iy += sy;
    }
}

/// `z[i] = f(x[i], y[i])` wherever `mask[i] == 0`.
pub fn mask_binary<X, Y, M, Z, F>(
    n: usize,
    x: &StridedView<X>,
    y: &StridedView<Y>,
    mask: &StridedView<M>,
    z: &mut StridedView<Z>,
    mut f: F,
) where
    X: Accessor,
    Y: Accessor,
    M: Accessor<Value = u8>,
    Z: AccessorMut,
    F: FnMut(X::Value, Y::Value) -> Z::Value,
{
    let sx = x.stride();
    let sy = y.stride();
    let sm = mask.stride();
    let sz = z.stride();
    let mut ix = x.offset() as isize;
    let mut iy = y.offset() as isize;
    let mut im = mask.offset() as isize;
    let mut iz = z.offset() as isize;
    let (a, b, m) = (x.data(), y.data(), mask.data());
    let out = z.data_mut();
    for _ in 0..n {
        if m.get(im as usize) == 0 {
            out.set(iz as usize, f(a.get(ix as usize), b.get(iy as usize)));
        }
        ix += sx;
        iy += sy;
        im += sm;
        iz += sz;
    }
}
