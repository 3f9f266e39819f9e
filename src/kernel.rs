//! Type-erased kernels and the operands they receive.
//!
//! A [`Kernel`] is what a dispatcher stores per signature row. When a call
//! resolves to a row, the kernel gets a [`StridedCall`] holding the element
//! count and one [`Operand`] per input / [`OperandMut`] per output, plus the
//! row's optional [`KernelData`]. Kernels turn operands into typed
//! [`StridedView`]s and run the apply engine over them.
//!
//! A call may also carry an [`AccessorCallback`]. The fn-pointer and closure
//! kernels of arity two or less, and [`Kernel::map_scalar`], route every
//! element through it; the wider kernels refuse it.

use crate::apply;
use crate::apply_by;
use crate::buffer::{Buffer, BufferElement, DynAccessor, DynAccessorMut};
use crate::view::StridedView;
use crate::{Result, StridedError};
use smallvec::SmallVec;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use strided_traits::{DataType, Element, Scalar};

/// Per-row payload handed to a kernel, typically the scalar callback.
pub type KernelData = Arc<dyn Any + Send + Sync>;

/// Wrap a value as [`KernelData`].
pub fn kernel_data<T: Any + Send + Sync>(value: T) -> KernelData {
    Arc::new(value)
}

/// One input array argument: a buffer with its stride and offset.
#[derive(Debug, Clone, Copy)]
pub struct Operand<'b> {
    buffer: &'b Buffer,
    stride: isize,
    offset: usize,
}

impl<'b> Operand<'b> {
    pub fn new(buffer: &'b Buffer, stride: isize, offset: usize) -> Self {
        Self {
            buffer,
            stride,
            offset,
        }
    }

    pub fn buffer(&self) -> &'b Buffer {
        self.buffer
    }

    pub fn dtype(&self) -> DataType {
        self.buffer.dtype()
    }

    pub fn stride(&self) -> isize {
        self.stride
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Typed view of `n` elements.
    pub fn view<T: BufferElement>(&self, n: usize) -> Result<StridedView<T::Reader<'b>>> {
        StridedView::new(self.buffer.reader::<T>()?, n, self.stride, self.offset)
    }

    /// Boxed-value view of `n` elements, valid for any dtype.
    pub fn dyn_view(&self, n: usize) -> Result<StridedView<DynAccessor<'b>>> {
        StridedView::new(self.buffer.dyn_accessor(), n, self.stride, self.offset)
    }
}

/// One output array argument.
#[derive(Debug)]
pub struct OperandMut<'b> {
    buffer: &'b mut Buffer,
    stride: isize,
    offset: usize,
}

impl<'b> OperandMut<'b> {
    pub fn new(buffer: &'b mut Buffer, stride: isize, offset: usize) -> Self {
        Self {
            buffer,
            stride,
            offset,
        }
    }

    pub fn dtype(&self) -> DataType {
        self.buffer.dtype()
    }

    pub fn stride(&self) -> isize {
        self.stride
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn view_mut<T: BufferElement>(&mut self, n: usize) -> Result<StridedView<T::Writer<'_>>> {
        let (stride, offset) = (self.stride, self.offset);
        StridedView::new(self.buffer.writer::<T>()?, n, stride, offset)
    }

    pub fn dyn_view_mut(&mut self, n: usize) -> Result<StridedView<DynAccessorMut<'_>>> {
        let (stride, offset) = (self.stride, self.offset);
        StridedView::new(self.buffer.dyn_accessor_mut(), n, stride, offset)
    }
}

/// Accessor callback forwarded to a kernel for one call.
///
/// Receives the values read at one iteration (one per input, or the produced
/// value for a nullary kernel), the iteration index and the physical index
/// of every array. Rewriting a value changes what the kernel consumes.
/// Returning `false` skips the element and leaves the output untouched.
pub type AccessorCallback<'f> = dyn FnMut(&mut [Scalar], usize, &[usize]) -> bool + 'f;

/// Arguments of one resolved kernel invocation.
pub struct StridedCall<'c, 'b> {
    pub n: usize,
    pub inputs: &'c [Operand<'b>],
    pub outputs: &'c mut [OperandMut<'b>],
    pub clbk: Option<&'c mut AccessorCallback<'c>>,
}

impl fmt::Debug for StridedCall<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StridedCall")
            .field("n", &self.n)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("clbk", &self.clbk.is_some())
            .finish()
    }
}

impl<'c, 'b> StridedCall<'c, 'b> {
    /// Fail if the call carries an accessor callback.
    pub fn reject_callback(&self) -> Result<()> {
        match self.clbk {
            Some(_) => Err(StridedError::CallbackUnsupported),
            None => Ok(()),
        }
    }

    /// Typed view of input `k`.
    ///
    /// The view borrows the input buffer, not the call, so output views can
    /// be taken while it is alive.
    pub fn input<T: BufferElement>(&self, k: usize) -> Result<StridedView<T::Reader<'b>>> {
        let op = self.inputs.get(k).ok_or(StridedError::ArrayCountMismatch {
            role: "input",
            expected: k + 1,
            found: self.inputs.len(),
        })?;
        op.view::<T>(self.n)
    }

    /// Typed view of output `k`.
    pub fn output<T: BufferElement>(&mut self, k: usize) -> Result<StridedView<T::Writer<'_>>> {
        let n = self.n;
        let found = self.outputs.len();
        let op = self
            .outputs
            .get_mut(k)
            .ok_or(StridedError::ArrayCountMismatch {
                role: "output",
                expected: k + 1,
                found,
            })?;
        op.view_mut::<T>(n)
    }
}

type KernelFn = dyn Fn(&mut StridedCall<'_, '_>, Option<&KernelData>) -> Result<()> + Send + Sync;

/// A type-erased strided kernel.
///
/// Cloning is cheap; clones share the same function.
#[derive(Clone)]
pub struct Kernel(Arc<KernelFn>);

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Kernel(..)")
    }
}

/// Fetch the scalar callback stored as kernel data.
fn callback<F: Copy + 'static>(data: Option<&KernelData>) -> Result<F> {
    data.and_then(|d| (**d).downcast_ref::<F>())
        .copied()
        .ok_or(StridedError::MissingKernelData)
}

/// Convert a value handed back by an accessor callback, remembering the
/// first one that does not fit `T`.
fn accessed<T: Element>(value: Scalar, failed: &mut Option<StridedError>) -> Option<T> {
    let v = T::from_scalar(value);
    if v.is_none() && failed.is_none() {
        *failed = Some(StridedError::ScalarConversion {
            value,
            dtype: T::DTYPE,
        });
    }
    v
}

fn run_nullary<Y, F>(call: &mut StridedCall<'_, '_>, f: F) -> Result<()>
where
    Y: BufferElement,
    F: Fn() -> Y,
{
    let n = call.n;
    let clbk = call.clbk.take();
    let mut y = call.output::<Y>(0)?;
    let Some(clbk) = clbk else {
        apply::nullary(n, &mut y, f);
        return Ok(());
    };
    let mut failed = None;
    apply_by::nullary_by(n, &mut y, f, |v, i, idx| {
        let mut vals = [v.into_scalar()];
        if !clbk(&mut vals[..], i, &idx[..]) {
            return None;
        }
        accessed::<Y>(vals[0], &mut failed)
    });
    failed.map_or(Ok(()), Err)
}

fn run_unary<X, Y, F>(call: &mut StridedCall<'_, '_>, f: F) -> Result<()>
where
    X: BufferElement,
    Y: BufferElement,
    F: Fn(X) -> Y,
{
    let n = call.n;
    let clbk = call.clbk.take();
    let x = call.input::<X>(0)?;
    let mut y = call.output::<Y>(0)?;
    let Some(clbk) = clbk else {
        apply::unary(n, &x, &mut y, f);
        return Ok(());
    };
    let mut failed = None;
    apply_by::unary_by(n, &x, &mut y, f, |v, i, idx| {
        let mut vals = [v.into_scalar()];
        if !clbk(&mut vals[..], i, &idx[..]) {
            return None;
        }
        accessed::<X>(vals[0], &mut failed)
    });
    failed.map_or(Ok(()), Err)
}

fn run_binary<X1, X2, Y, F>(call: &mut StridedCall<'_, '_>, f: F) -> Result<()>
where
    X1: BufferElement,
    X2: BufferElement,
    Y: BufferElement,
    F: Fn(X1, X2) -> Y,
{
    let n = call.n;
    let clbk = call.clbk.take();
    let x1 = call.input::<X1>(0)?;
    let x2 = call.input::<X2>(1)?;
    let mut y = call.output::<Y>(0)?;
    let Some(clbk) = clbk else {
        apply::binary(n, &x1, &x2, &mut y, f);
        return Ok(());
    };
    let mut failed = None;
    apply_by::binary_by(n, &x1, &x2, &mut y, f, |(a, b), i, idx| {
        let mut vals = [a.into_scalar(), b.into_scalar()];
        if !clbk(&mut vals[..], i, &idx[..]) {
            return None;
        }
        let a = accessed::<X1>(vals[0], &mut failed)?;
        let b = accessed::<X2>(vals[1], &mut failed)?;
        Some((a, b))
    });
    failed.map_or(Ok(()), Err)
}

impl Kernel {
    /// Wrap a kernel function. A function that does not consume
    /// `call.clbk` should refuse it with [`StridedCall::reject_callback`].
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut StridedCall<'_, '_>, Option<&KernelData>) -> Result<()> + Send + Sync + 'static,
    {
        Kernel(Arc::new(f))
    }

    pub fn invoke(&self, call: &mut StridedCall<'_, '_>, data: Option<&KernelData>) -> Result<()> {
        (self.0)(call, data)
    }

    /// Nullary kernel whose callback is a `fn() -> Y` in the row data.
    pub fn nullary<Y: BufferElement>() -> Self {
        Kernel::new(|call, data| {
            let f = callback::<fn() -> Y>(data)?;
            run_nullary(call, f)
        })
    }

    /// Unary kernel whose callback is a `fn(X) -> Y` in the row data.
    pub fn unary<X: BufferElement, Y: BufferElement>() -> Self {
        Kernel::new(|call, data| {
            let f = callback::<fn(X) -> Y>(data)?;
            run_unary(call, f)
        })
    }

    /// Binary kernel whose callback is a `fn(X1, X2) -> Y` in the row data.
    pub fn binary<X1, X2, Y>() -> Self
    where
        X1: BufferElement,
        X2: BufferElement,
        Y: BufferElement,
    {
        Kernel::new(|call, data| {
            let f = callback::<fn(X1, X2) -> Y>(data)?;
            run_binary(call, f)
        })
    }

    pub fn ternary<X1, X2, X3, Y>() -> Self
    where
        X1: BufferElement,
        X2: BufferElement,
        X3: BufferElement,
        Y: BufferElement,
    {
        Kernel::new(|call, data| {
            call.reject_callback()?;
            let f = callback::<fn(X1, X2, X3) -> Y>(data)?;
            let n = call.n;
            let x1 = call.input::<X1>(0)?;
            let x2 = call.input::<X2>(1)?;
            let x3 = call.input::<X3>(2)?;
            let mut y = call.output::<Y>(0)?;
            apply::ternary(n, &x1, &x2, &x3, &mut y, f);
            Ok(())
        })
    }

    pub fn quaternary<X1, X2, X3, X4, Y>() -> Self
    where
        X1: BufferElement,
        X2: BufferElement,
        X3: BufferElement,
        X4: BufferElement,
        Y: BufferElement,
    {
        Kernel::new(|call, data| {
            call.reject_callback()?;
            let f = callback::<fn(X1, X2, X3, X4) -> Y>(data)?;
            let n = call.n;
            let x1 = call.input::<X1>(0)?;
            let x2 = call.input::<X2>(1)?;
            let x3 = call.input::<X3>(2)?;
            let x4 = call.input::<X4>(3)?;
            let mut y = call.output::<Y>(0)?;
            apply::quaternary(n, &x1, &x2, &x3, &x4, &mut y, f);
            Ok(())
        })
    }

    pub fn quinary<X1, X2, X3, X4, X5, Y>() -> Self
    where
        X1: BufferElement,
        X2: BufferElement,
        X3: BufferElement,
        X4: BufferElement,
        X5: BufferElement,
        Y: BufferElement,
    {
        Kernel::new(|call, data| {
            call.reject_callback()?;
            let f = callback::<fn(X1, X2, X3, X4, X5) -> Y>(data)?;
            let n = call.n;
            let x1 = call.input::<X1>(0)?;
            let x2 = call.input::<X2>(1)?;
            let x3 = call.input::<X3>(2)?;
            let x4 = call.input::<X4>(3)?;
            let x5 = call.input::<X5>(4)?;
            let mut y = call.output::<Y>(0)?;
            apply::quinary(n, &x1, &x2, &x3, &x4, &x5, &mut y, f);
            Ok(())
        })
    }

    /// Nullary kernel over a captured closure; row data is ignored.
    pub fn fill<Y, F>(f: F) -> Self
    where
        Y: BufferElement,
        F: Fn() -> Y + Send + Sync + 'static,
    {
        Kernel::new(move |call, _| run_nullary::<Y, _>(call, &f))
    }

    /// Unary kernel over a captured closure; row data is ignored.
    pub fn map<X, Y, F>(f: F) -> Self
    where
        X: BufferElement,
        Y: BufferElement,
        F: Fn(X) -> Y + Send + Sync + 'static,
    {
        Kernel::new(move |call, _| run_unary::<X, Y, _>(call, &f))
    }

    pub fn map2<X1, X2, Y, F>(f: F) -> Self
    where
        X1: BufferElement,
        X2: BufferElement,
        Y: BufferElement,
        F: Fn(X1, X2) -> Y + Send + Sync + 'static,
    {
        Kernel::new(move |call, _| run_binary::<X1, X2, Y, _>(call, &f))
    }

    pub fn map3<X1, X2, X3, Y, F>(f: F) -> Self
    where
        X1: BufferElement,
        X2: BufferElement,
        X3: BufferElement,
        Y: BufferElement,
        F: Fn(X1, X2, X3) -> Y + Send + Sync + 'static,
    {
        Kernel::new(move |call, _| {
            call.reject_callback()?;
            let n = call.n;
            let x1 = call.input::<X1>(0)?;
            let x2 = call.input::<X2>(1)?;
            let x3 = call.input::<X3>(2)?;
            let mut y = call.output::<Y>(0)?;
            apply::ternary(n, &x1, &x2, &x3, &mut y, &f);
            Ok(())
        })
    }

    /// Kernel over boxed values, usable on any dtype row.
    ///
    /// `f` receives one [`Scalar`] per input and returns the value for the
    /// first output. A result the output dtype cannot hold fails the call
    /// with `ScalarConversion` after the loop completes. An accessor
    /// callback sees the input values before `f` does.
    pub fn map_scalar<F>(f: F) -> Self
    where
        F: Fn(&[Scalar]) -> Scalar + Send + Sync + 'static,
    {
        Kernel::new(move |call, _| {
            let n = call.n;
            let mut clbk = call.clbk.take();
            let xs = call
                .inputs
                .iter()
                .map(|op| op.dyn_view(n))
                .collect::<Result<SmallVec<[_; 4]>>>()?;
            let out = call.outputs.first_mut().ok_or(StridedError::ArrayCountMismatch {
                role: "output",
                expected: 1,
                found: 0,
            })?;
            let mut y = out.dyn_view_mut(n)?;
            let mut args: SmallVec<[Scalar; 4]> = SmallVec::with_capacity(xs.len());
            let mut indices: SmallVec<[usize; 5]> = SmallVec::with_capacity(xs.len() + 1);
            for i in 0..n {
                args.clear();
                args.extend(xs.iter().map(|x| x.get(i)));
                if let Some(clbk) = clbk.as_mut() {
                    indices.clear();
                    indices.extend(xs.iter().map(|x| x.physical_index(i)));
                    indices.push(y.physical_index(i));
                    if !clbk(args.as_mut_slice(), i, indices.as_slice()) {
                        continue;
                    }
                }
                y.set(i, f(args.as_slice()));
            }
            y.into_inner().finish()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn run(
        kernel: &Kernel,
        data: Option<&KernelData>,
        n: usize,
        inputs: &[&Buffer],
        output: &mut Buffer,
    ) -> Result<()> {
        let ops: Vec<Operand<'_>> = inputs.iter().map(|b| Operand::new(b, 1, 0)).collect();
        let mut outs = [OperandMut::new(output, 1, 0)];
        let mut call = StridedCall {
            n,
            inputs: &ops,
            outputs: &mut outs,
            clbk: None,
        };
        kernel.invoke(&mut call, data)
    }

    fn run_with_callback(
        kernel: &Kernel,
        data: Option<&KernelData>,
        n: usize,
        inputs: &[&Buffer],
        output: &mut Buffer,
        clbk: &mut AccessorCallback<'_>,
    ) -> Result<()> {
        let ops: Vec<Operand<'_>> = inputs.iter().map(|b| Operand::new(b, 1, 0)).collect();
        let mut outs = [OperandMut::new(output, 1, 0)];
        let mut call = StridedCall {
            n,
            inputs: &ops,
            outputs: &mut outs,
            clbk: Some(clbk),
        };
        kernel.invoke(&mut call, data)
    }

    #[test]
    fn test_unary_fn_pointer_kernel() {
        let x = Buffer::from(vec![-1.0, 2.0, -3.0]);
        let mut y = Buffer::zeros(DataType::Float64, 3);
        let data = kernel_data(f64::abs as fn(f64) -> f64);
        run(&Kernel::unary::<f64, f64>(), Some(&data), 3, &[&x], &mut y).unwrap();
        assert_eq!(y, Buffer::Float64(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_missing_or_wrong_data() {
        let x = Buffer::from(vec![1.0]);
        let mut y = Buffer::zeros(DataType::Float64, 1);
        let k = Kernel::unary::<f64, f64>();
        assert_eq!(
            run(&k, None, 1, &[&x], &mut y),
            Err(StridedError::MissingKernelData)
        );
        let wrong = kernel_data(f32::abs as fn(f32) -> f32);
        assert_eq!(
            run(&k, Some(&wrong), 1, &[&x], &mut y),
            Err(StridedError::MissingKernelData)
        );
    }

    #[test]
    fn test_dtype_mismatch() {
        let x = Buffer::from(vec![1.0f32]);
        let mut y = Buffer::zeros(DataType::Float64, 1);
        let k = Kernel::map(|v: f64| v);
        assert_eq!(
            run(&k, None, 1, &[&x], &mut y),
            Err(StridedError::DataTypeMismatch {
                expected: DataType::Float64,
                found: DataType::Float32
            })
        );
    }

    #[test]
    fn test_map_complex_to_real() {
        let x = Buffer::from(vec![Complex64::new(3.0, 4.0), Complex64::new(0.0, -2.0)]);
        let mut y = Buffer::zeros(DataType::Float64, 2);
        let k = Kernel::map(|z: Complex64| z.norm());
        run(&k, None, 2, &[&x], &mut y).unwrap();
        assert_eq!(y, Buffer::Float64(vec![5.0, 2.0]));
    }

    #[test]
    fn test_map2_and_fill() {
        let a = Buffer::from(vec![1i32, 2, 3]);
        let b = Buffer::from(vec![4i32, 5, 6]);
        let mut y = Buffer::zeros(DataType::Int32, 3);
        run(&Kernel::map2(|p: i32, q: i32| p * q), None, 3, &[&a, &b], &mut y).unwrap();
        assert_eq!(y, Buffer::Int32(vec![4, 10, 18]));

        run(&Kernel::fill(|| 9u8), None, 2, &[], &mut Buffer::zeros(DataType::Uint8, 2)).unwrap();
    }

    #[test]
    fn test_quinary_fn_pointer() {
        fn sum5(a: f64, b: f64, c: f64, d: f64, e: f64) -> f64 {
            a + b + c + d + e
        }
        let bufs: Vec<Buffer> = (1..=5).map(|k| Buffer::from(vec![k as f64; 2])).collect();
        let refs: Vec<&Buffer> = bufs.iter().collect();
        let mut y = Buffer::zeros(DataType::Float64, 2);
        let data = kernel_data(sum5 as fn(f64, f64, f64, f64, f64) -> f64);
        run(&Kernel::quinary::<f64, f64, f64, f64, f64, f64>(), Some(&data), 2, &refs, &mut y)
            .unwrap();
        assert_eq!(y, Buffer::Float64(vec![15.0, 15.0]));
    }

    #[test]
    fn test_map_scalar_any_dtype() {
        let x = Buffer::from(vec![1i16, -2, 3]);
        let mut y = Buffer::zeros(DataType::Generic, 3);
        let k = Kernel::map_scalar(|args| match args[0] {
            Scalar::Int(v) => Scalar::Int(v * v),
            other => other,
        });
        run(&k, None, 3, &[&x], &mut y).unwrap();
        assert_eq!(
            y,
            Buffer::Generic(vec![Scalar::Int(1), Scalar::Int(4), Scalar::Int(9)])
        );

        let mut small = Buffer::zeros(DataType::Int8, 3);
        let k = Kernel::map_scalar(|_| Scalar::Int(1000));
        assert!(matches!(
            run(&k, None, 3, &[&x], &mut small),
            Err(StridedError::ScalarConversion { .. })
        ));
    }

    #[test]
    fn test_output_index_checked() {
        let mut call = StridedCall {
            n: 0,
            inputs: &[],
            outputs: &mut [],
            clbk: None,
        };
        assert!(matches!(
            call.output::<f64>(0),
            Err(StridedError::ArrayCountMismatch { role: "output", .. })
        ));
        assert!(call.input::<f64>(1).is_err());
    }

    #[test]
    fn test_unary_callback_rewrites_and_skips() {
        let x = Buffer::from(vec![1.0, -2.0, 3.0, -4.0]);
        let mut y = Buffer::from(vec![9.0; 4]);
        let data = kernel_data(f64::abs as fn(f64) -> f64);
        let mut seen = Vec::new();
        let mut clbk = |vals: &mut [Scalar], i: usize, idx: &[usize]| {
            seen.push((i, idx.to_vec()));
            if i == 2 {
                return false;
            }
            if let Scalar::Float(v) = vals[0] {
                vals[0] = Scalar::Float(v * 10.0);
            }
            true
        };
        let k = Kernel::unary::<f64, f64>();
        run_with_callback(&k, Some(&data), 4, &[&x], &mut y, &mut clbk).unwrap();
        assert_eq!(y, Buffer::Float64(vec![10.0, 20.0, 9.0, 40.0]));
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[3], (3, vec![3, 3]));
    }

    #[test]
    fn test_binary_and_fill_callbacks() {
        let a = Buffer::from(vec![1i32, 2, 3]);
        let b = Buffer::from(vec![10i32, 20, 30]);
        let mut y = Buffer::zeros(DataType::Int32, 3);
        let mut swap = |vals: &mut [Scalar], _: usize, idx: &[usize]| {
            assert_eq!(idx.len(), 3);
            vals.swap(0, 1);
            true
        };
        let k = Kernel::map2(|p: i32, q: i32| p - q);
        run_with_callback(&k, None, 3, &[&a, &b], &mut y, &mut swap).unwrap();
        assert_eq!(y, Buffer::Int32(vec![9, 18, 27]));

        let mut y = Buffer::zeros(DataType::Uint8, 3);
        let mut odd_only = |_: &mut [Scalar], i: usize, _: &[usize]| i % 2 == 1;
        run_with_callback(&Kernel::fill(|| 7u8), None, 3, &[], &mut y, &mut odd_only).unwrap();
        assert_eq!(y, Buffer::Uint8(vec![0, 7, 0]));
    }

    #[test]
    fn test_callback_value_must_fit_input_dtype() {
        let x = Buffer::from(vec![1i8, 2]);
        let mut y = Buffer::zeros(DataType::Int8, 2);
        let data = kernel_data(identity_i8 as fn(i8) -> i8);
        let mut widen = |vals: &mut [Scalar], _: usize, _: &[usize]| {
            vals[0] = Scalar::Int(500);
            true
        };
        let k = Kernel::unary::<i8, i8>();
        assert_eq!(
            run_with_callback(&k, Some(&data), 2, &[&x], &mut y, &mut widen),
            Err(StridedError::ScalarConversion {
                value: Scalar::Int(500),
                dtype: DataType::Int8
            })
        );
    }

    fn identity_i8(v: i8) -> i8 {
        v
    }

    #[test]
    fn test_wide_kernels_refuse_callbacks() {
        let bufs: Vec<Buffer> = (0..3).map(|_| Buffer::from(vec![1.0])).collect();
        let refs: Vec<&Buffer> = bufs.iter().collect();
        let mut y = Buffer::zeros(DataType::Float64, 1);
        let mut keep = |_: &mut [Scalar], _: usize, _: &[usize]| true;
        let k = Kernel::map3(|a: f64, b: f64, c: f64| a + b + c);
        assert_eq!(
            run_with_callback(&k, None, 1, &refs, &mut y, &mut keep),
            Err(StridedError::CallbackUnsupported)
        );
    }

    #[test]
    fn test_map_scalar_with_callback() {
        let x = Buffer::Generic(vec![Scalar::Int(1), Scalar::Null, Scalar::Int(3)]);
        let mut y = Buffer::zeros(DataType::Generic, 3);
        let mut skip_holes = |vals: &mut [Scalar], _: usize, _: &[usize]| !vals[0].is_null();
        let k = Kernel::map_scalar(|args| args[0]);
        run_with_callback(&k, None, 3, &[&x], &mut y, &mut skip_holes).unwrap();
        assert_eq!(
            y,
            Buffer::Generic(vec![Scalar::Int(1), Scalar::Float(0.0), Scalar::Int(3)])
        );
    }
}
