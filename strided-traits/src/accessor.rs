//! The accessor protocol for reading and writing logical array elements.
//!
//! Most storage maps one logical element to one physical slot and is read
//! by direct indexing (slices implement [`Accessor`] that way). Composite
//! storage, such as complex numbers kept as interleaved real/imaginary
//! pairs, or arrays with caller-defined read/write behaviour go through the
//! same trait, so strided loops are written once against [`Accessor`] and
//! [`AccessorMut`].

use std::marker::PhantomData;

/// Read access to logical elements by physical index.
pub trait Accessor {
    type Value: Copy;

    /// Number of addressable logical elements.
    fn len(&self) -> usize;

    /// Reads the element at `idx`.
    ///
    /// # Panics
    /// May panic if `idx >= self.len()`.
    fn get(&self, idx: usize) -> Self::Value;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Write access to logical elements by physical index.
pub trait AccessorMut: Accessor {
    /// Writes `value` at `idx`.
    ///
    /// # Panics
    /// May panic if `idx >= self.len()`.
    fn set(&mut self, idx: usize, value: Self::Value);
}

impl<T: Copy> Accessor for [T] {
    type Value = T;

    #[inline(always)]
    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    #[inline(always)]
    fn get(&self, idx: usize) -> T {
        self[idx]
    }
}

impl<T: Copy> AccessorMut for [T] {
    #[inline(always)]
    fn set(&mut self, idx: usize, value: T) {
        self[idx] = value;
    }
}

impl<T: Copy> Accessor for Vec<T> {
    type Value = T;

    #[inline(always)]
    fn len(&self) -> usize {
        Vec::len(self)
    }

    #[inline(always)]
    fn get(&self, idx: usize) -> T {
        self[idx]
    }
}

impl<T: Copy> AccessorMut for Vec<T> {
    #[inline(always)]
    fn set(&mut self, idx: usize, value: T) {
        self[idx] = value;
    }
}

impl<A: Accessor + ?Sized> Accessor for &A {
    type Value = A::Value;

    #[inline(always)]
    fn len(&self) -> usize {
        (**self).len()
    }

    #[inline(always)]
    fn get(&self, idx: usize) -> A::Value {
        (**self).get(idx)
    }
}

impl<A: Accessor + ?Sized> Accessor for &mut A {
    type Value = A::Value;

    #[inline(always)]
    fn len(&self) -> usize {
        (**self).len()
    }

    #[inline(always)]
    fn get(&self, idx: usize) -> A::Value {
        (**self).get(idx)
    }
}

impl<A: AccessorMut + ?Sized> AccessorMut for &mut A {
    #[inline(always)]
    fn set(&mut self, idx: usize, value: A::Value) {
        (**self).set(idx, value)
    }
}

/// A `(get, set)` function pair over a caller-owned buffer.
///
/// `get(buffer, idx)` builds one logical value, `set(buffer, idx, value)`
/// stores one. `len` is the number of logical elements the pair can
/// address.
pub struct AccessorPair<'a, B: ?Sized, V, G, S> {
    buffer: &'a mut B,
    len: usize,
    getter: G,
    setter: S,
    _value: PhantomData<fn() -> V>,
}

impl<'a, B, V, G, S> AccessorPair<'a, B, V, G, S>
where
    B: ?Sized,
    V: Copy,
    G: Fn(&B, usize) -> V,
    S: FnMut(&mut B, usize, V),
{
    pub fn new(buffer: &'a mut B, len: usize, getter: G, setter: S) -> Self {
        Self {
            buffer,
            len,
            getter,
            setter,
            _value: PhantomData,
        }
    }

    /// Returns the underlying buffer.
    pub fn into_inner(self) -> &'a mut B {
        self.buffer
    }
}

impl<B, V, G, S> Accessor for AccessorPair<'_, B, V, G, S>
where
    B: ?Sized,
    V: Copy,
    G: Fn(&B, usize) -> V,
{
    type Value = V;

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn get(&self, idx: usize) -> V {
        (self.getter)(self.buffer, idx)
    }
}

impl<B, V, G, S> AccessorMut for AccessorPair<'_, B, V, G, S>
where
    B: ?Sized,
    V: Copy,
    G: Fn(&B, usize) -> V,
    S: FnMut(&mut B, usize, V),
{
    #[inline]
    fn set(&mut self, idx: usize, value: V) {
        (self.setter)(self.buffer, idx, value)
    }
}

/// A read-only accessor built from a getter over a borrowed buffer.
pub struct ReadAccessor<'a, B: ?Sized, V, G> {
    buffer: &'a B,
    len: usize,
    getter: G,
    _value: PhantomData<fn() -> V>,
}

impl<'a, B, V, G> ReadAccessor<'a, B, V, G>
where
    B: ?Sized,
    V: Copy,
    G: Fn(&B, usize) -> V,
{
    pub fn new(buffer: &'a B, len: usize, getter: G) -> Self {
        Self {
            buffer,
            len,
            getter,
            _value: PhantomData,
        }
    }
}

impl<B, V, G> Accessor for ReadAccessor<'_, B, V, G>
where
    B: ?Sized,
    V: Copy,
    G: Fn(&B, usize) -> V,
{
    type Value = V;

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn get(&self, idx: usize) -> V {
        (self.getter)(self.buffer, idx)
    }
}
