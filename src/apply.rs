//! The strided apply engine.
//!
//! Every routine here walks `n` logical elements in ascending order, keeping
//! one running physical index per array that starts at the view's offset and
//! advances by its stride. Inputs are only read and outputs only written;
//! `n == 0` returns without invoking the callback.
//!
//! The engine does not validate lengths. A view whose `(offset, stride)`
//! leaves its accessor makes the accessor panic on the first bad index.

use crate::view::StridedView;
use strided_traits::{Accessor, AccessorMut};

/// Running physical index into one input view.
struct Cursor<'v, A> {
    view: &'v StridedView<A>,
    idx: isize,
}

impl<'v, A: Accessor> Cursor<'v, A> {
    #[inline(always)]
    fn new(view: &'v StridedView<A>) -> Self {
        Self {
            view,
            idx: view.offset() as isize,
        }
    }

    #[inline(always)]
    fn next(&mut self) -> A::Value {
        let v = self.view.data().get(self.idx as usize);
        self.idx += self.view.stride();
        v
    }
}

/// Fill `n` elements of `y` with values produced by `f`.
pub fn nullary<Y, F>(n: usize, y: &mut StridedView<Y>, mut f: F)
where
    Y: AccessorMut,
    F: FnMut() -> Y::Value,
{
    let sy = y.stride();
    let mut iy = y.offset() as isize;
    let out = y.data_mut();
    for _ in 0..n {
        out.set(iy as usize, f());
        iy += sy;
    }
}

/// `y[i] = f(x[i])` for `i` in `0..n`.
pub fn unary<X, Y, F>(n: usize, x: &StridedView<X>, y: &mut StridedView<Y>, mut f: F)
where
    X: Accessor,
    Y: AccessorMut,
    F: FnMut(X::Value) -> Y::Value,
{
    let sx = x.stride();
    let sy = y.stride();
    let mut ix = x.offset() as isize;
    let mut iy = y.offset() as isize;
    let src = x.data();
    let out = y.data_mut();
    for _ in 0..n {
        out.set(iy as usize, f(src.get(ix as usize)));
        ix += sx;
        iy += sy;
    }
}

/// `x[i] = f(x[i])` for `i` in `0..n`, reading each element before it is
/// overwritten.
pub fn unary_in_place<X, F>(n: usize, x: &mut StridedView<X>, mut f: F)
where
    X: AccessorMut,
    F: FnMut(X::Value) -> X::Value,
{
    let sx = x.stride();
    let mut ix = x.offset() as isize;
    let data = x.data_mut();
    for _ in 0..n {
        let idx = ix as usize;
        let v = f(data.get(idx));
        data.set(idx, v);
        ix += sx;
    }
}

/// `z[i] = f(x[i], y[i])` for `i` in `0..n`.
pub fn binary<X, Y, Z, F>(
    n: usize,
    x: &StridedView<X>,
    y: &StridedView<Y>,
    z: &mut StridedView<Z>,
    mut f: F,
) where
    X: Accessor,
    Y: Accessor,
    Z: AccessorMut,
    F: FnMut(X::Value, Y::Value) -> Z::Value,
{
    let sx = x.stride();
    let sy = y.stride();
    let sz = z.stride();
    let mut ix = x.offset() as isize;
    let mut iy = y.offset() as isize;
    let mut iz = z.offset() as isize;
    let (a, b) = (x.data(), y.data());
    let out = z.data_mut();
    for _ in 0..n {
        out.set(iz as usize, f(a.get(ix as usize), b.get(iy as usize)));
        ix += sx;
        iy += sy;
        iz += sz;
    }
}

macro_rules! impl_apply_n {
    ($(#[$meta:meta])* $name:ident => $($x:ident: $X:ident),+) => {
        $(#[$meta])*
        #[allow(clippy::too_many_arguments)]
        pub fn $name<$($X,)+ Out, F>(
            n: usize,
            $($x: &StridedView<$X>,)+
            out: &mut StridedView<Out>,
            mut f: F,
        ) where
            $($X: Accessor,)+
            Out: AccessorMut,
            F: FnMut($($X::Value),+) -> Out::Value,
        {
            $(let mut $x = Cursor::new($x);)+
            let so = out.stride();
            let mut io = out.offset() as isize;
            let dst = out.data_mut();
            for _ in 0..n {
                let v = f($($x.next()),+);
                dst.set(io as usize, v);
                io += so;
            }
        }
    };
}

impl_apply_n!(
    /// `out[i] = f(x[i], y[i], z[i])` for `i` in `0..n`.
    ternary => x: X, y: Y, z: Z
);

impl_apply_n!(
    /// Four inputs, one output.
    quaternary => x: X, y: Y, z: Z, w: W
);

impl_apply_n!(
    /// Five inputs, one output.
    quinary => x: X, y: Y, z: Z, w: W, u: U
);
