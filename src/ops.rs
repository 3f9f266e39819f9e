//! Dispatched element-wise operations.
//!
//! Each operation owns one lazily built [`Dispatcher`] whose rows pair a
//! dtype signature with a typed kernel and its scalar callback. Every entry
//! point of an operation (strided, ndarray, in-place, `_by`) shares it.

use crate::apply;
use crate::apply_by;
use crate::buffer::Buffer;
use crate::complex::{cabs, cabsf, cadd, caddf, cmul, cmulf};
use crate::dispatch::Dispatcher;
use crate::kernel::{kernel_data, Kernel, KernelData};
use crate::view::{stride_to_offset, StridedView};
use crate::Result;
use num_complex::{Complex32, Complex64};
use std::sync::OnceLock;
use strided_traits::{DataType, Scalar};

static ABS: Table = OnceLock::new();
static CBRT: Table = OnceLock::new();

type Table = OnceLock<Result<Dispatcher>>;

fn cached(table: &'static Table, build: fn() -> Result<Dispatcher>) -> Result<&'static Dispatcher> {
    table.get_or_init(build).as_ref().map_err(Clone::clone)
}

fn identity<T>(v: T) -> T {
    v
}

fn generic_abs(args: &[Scalar]) -> Scalar {
    match args[0] {
        Scalar::Int(v) => Scalar::Int(v.wrapping_abs()),
        Scalar::Float(v) => Scalar::Float(v.abs()),
        Scalar::Complex(z) => Scalar::Float(cabs(z)),
        other => other,
    }
}

fn build_abs() -> Result<Dispatcher> {
    let mut kernels: Vec<Kernel> = Vec::new();
    let mut data: Vec<KernelData> = Vec::new();
    let mut types: Vec<DataType> = Vec::new();

    macro_rules! row {
        ($x:ty => $y:ty, $f:expr, $tx:ident => $ty:ident) => {
            kernels.push(Kernel::unary::<$x, $y>());
            data.push(kernel_data($f as fn($x) -> $y));
            types.extend([DataType::$tx, DataType::$ty]);
        };
    }

    row!(f64 => f64, f64::abs, Float64 => Float64);
    row!(f32 => f32, f32::abs, Float32 => Float32);
    row!(i32 => i32, i32::wrapping_abs, Int32 => Int32);
    row!(i16 => i16, i16::wrapping_abs, Int16 => Int16);
    row!(i8 => i8, i8::wrapping_abs, Int8 => Int8);
    row!(u32 => u32, identity::<u32>, Uint32 => Uint32);
    row!(u16 => u16, identity::<u16>, Uint16 => Uint16);
    row!(u8 => u8, identity::<u8>, Uint8 => Uint8);
    row!(Complex64 => f64, cabs, Complex128 => Float64);
    row!(Complex32 => f32, cabsf, Complex64 => Float32);

    kernels.push(Kernel::map_scalar(generic_abs));
    data.push(kernel_data(()));
    types.extend([DataType::Generic, DataType::Generic]);

    Dispatcher::new(kernels, types, Some(data), 5, 1, 1)
}

/// Absolute value of each element of `x`, written to `y`.
///
/// Complex inputs produce their modulus in the real type of matching
/// precision. Signed integers wrap at their minimum value.
pub fn abs(n: usize, x: &Buffer, stride_x: isize, y: &mut Buffer, stride_y: isize) -> Result<()> {
    cached(&ABS, build_abs)?.call(n, &[(x, stride_x)], &mut [(y, stride_y)])
}

pub fn abs_ndarray(
    n: usize,
    x: &Buffer,
    stride_x: isize,
    offset_x: usize,
    y: &mut Buffer,
    stride_y: isize,
    offset_y: usize,
) -> Result<()> {
    cached(&ABS, build_abs)?.ndarray(
        n,
        &[(x, stride_x, offset_x)],
        &mut [(y, stride_y, offset_y)],
    )
}

/// Replace each element of `x` with its absolute value.
///
/// Only dtypes whose absolute value keeps the dtype qualify; complex
/// arrays fail with `UnsupportedDataTypes`.
pub fn abs_in_place(n: usize, x: &mut Buffer, stride_x: isize) -> Result<()> {
    cached(&ABS, build_abs)?.call_in_place(n, (x, stride_x), &[], &mut [])
}

pub fn abs_in_place_ndarray(
    n: usize,
    x: &mut Buffer,
    stride_x: isize,
    offset_x: usize,
) -> Result<()> {
    cached(&ABS, build_abs)?.ndarray_in_place(n, (x, stride_x, offset_x), &[], &mut [])
}

/// Rows for a binary operation over float64, float32, int32, complex128
/// and complex64, all three arguments of the same dtype.
fn build_binary(
    f64_op: fn(f64, f64) -> f64,
    f32_op: fn(f32, f32) -> f32,
    i32_op: fn(i32, i32) -> i32,
    z_op: fn(Complex64, Complex64) -> Complex64,
    c_op: fn(Complex32, Complex32) -> Complex32,
) -> Result<Dispatcher> {
    let kernels = vec![
        Kernel::binary::<f64, f64, f64>(),
        Kernel::binary::<f32, f32, f32>(),
        Kernel::binary::<i32, i32, i32>(),
        Kernel::binary::<Complex64, Complex64, Complex64>(),
        Kernel::binary::<Complex32, Complex32, Complex32>(),
    ];
    let data = vec![
        kernel_data(f64_op),
        kernel_data(f32_op),
        kernel_data(i32_op),
        kernel_data(z_op),
        kernel_data(c_op),
    ];
    let types = [
        DataType::Float64,
        DataType::Float32,
        DataType::Int32,
        DataType::Complex128,
        DataType::Complex64,
    ]
    .iter()
    .flat_map(|&dt| [dt, dt, dt])
    .collect();
    Dispatcher::new(kernels, types, Some(data), 7, 2, 1)
}

fn build_add() -> Result<Dispatcher> {
    build_binary(|a, b| a + b, |a, b| a + b, i32::wrapping_add, cadd, caddf)
}

fn build_mul() -> Result<Dispatcher> {
    build_binary(|a, b| a * b, |a, b| a * b, i32::wrapping_mul, cmul, cmulf)
}

/// Element-wise `z = x + y`.
pub fn add(
    n: usize,
    x: &Buffer,
    stride_x: isize,
    y: &Buffer,
    stride_y: isize,
    z: &mut Buffer,
    stride_z: isize,
) -> Result<()> {
    static TABLE: Table = OnceLock::new();
    cached(&TABLE, build_add)?.call(n, &[(x, stride_x), (y, stride_y)], &mut [(z, stride_z)])
}

/// Element-wise `z = x * y`. Single-precision complex products round every
/// intermediate to `f32`.
pub fn mul(
    n: usize,
    x: &Buffer,
    stride_x: isize,
    y: &Buffer,
    stride_y: isize,
    z: &mut Buffer,
    stride_z: isize,
) -> Result<()> {
    static TABLE: Table = OnceLock::new();
    cached(&TABLE, build_mul)?.call(n, &[(x, stride_x), (y, stride_y)], &mut [(z, stride_z)])
}

fn generic_cbrt(args: &[Scalar]) -> Scalar {
    match args[0].as_f64() {
        Some(v) => Scalar::Float(v.cbrt()),
        None => args[0],
    }
}

fn build_cbrt() -> Result<Dispatcher> {
    let kernels = vec![
        Kernel::unary::<f64, f64>(),
        Kernel::unary::<f32, f32>(),
        Kernel::map_scalar(generic_cbrt),
    ];
    let data = vec![
        kernel_data(f64::cbrt as fn(f64) -> f64),
        kernel_data(f32::cbrt as fn(f32) -> f32),
        kernel_data(()),
    ];
    let types = vec![
        DataType::Float64,
        DataType::Float64,
        DataType::Float32,
        DataType::Float32,
        DataType::Generic,
        DataType::Generic,
    ];
    Dispatcher::new(kernels, types, Some(data), 5, 1, 1)
}

/// Cube root of each element of a float64, float32 or generic array.
pub fn cbrt(n: usize, x: &Buffer, stride_x: isize, y: &mut Buffer, stride_y: isize) -> Result<()> {
    cached(&CBRT, build_cbrt)?.call(n, &[(x, stride_x)], &mut [(y, stride_y)])
}

/// Cube root of the values an accessor callback extracts from `x`.
///
/// `clbk(values, i, [ix, iy])` may rewrite `values[0]`; returning `false`
/// leaves `y` untouched at that element.
pub fn cbrt_by<C>(
    n: usize,
    x: &Buffer,
    stride_x: isize,
    y: &mut Buffer,
    stride_y: isize,
    clbk: C,
) -> Result<()>
where
    C: FnMut(&mut [Scalar], usize, &[usize]) -> bool,
{
    cached(&CBRT, build_cbrt)?.call_by(n, &[(x, stride_x)], &mut [(y, stride_y)], clbk)
}

#[allow(clippy::too_many_arguments)]
pub fn cbrt_by_ndarray<C>(
    n: usize,
    x: &Buffer,
    stride_x: isize,
    offset_x: usize,
    y: &mut Buffer,
    stride_y: isize,
    offset_y: usize,
    clbk: C,
) -> Result<()>
where
    C: FnMut(&mut [Scalar], usize, &[usize]) -> bool,
{
    cached(&CBRT, build_cbrt)?.ndarray_by(
        n,
        &[(x, stride_x, offset_x)],
        &mut [(y, stride_y, offset_y)],
        clbk,
    )
}

/// Cube root of a double-precision strided array.
pub fn dcbrt(n: usize, x: &[f64], stride_x: isize, y: &mut [f64], stride_y: isize) {
    dcbrt_ndarray(
        n,
        x,
        stride_x,
        stride_to_offset(n, stride_x),
        y,
        stride_y,
        stride_to_offset(n, stride_y),
    );
}

pub fn dcbrt_ndarray(
    n: usize,
    x: &[f64],
    stride_x: isize,
    offset_x: usize,
    y: &mut [f64],
    stride_y: isize,
    offset_y: usize,
) {
    let xv = StridedView::new_unchecked(x, n, stride_x, offset_x);
    let mut yv = StridedView::new_unchecked(y, n, stride_y, offset_y);
    apply::unary(n, &xv, &mut yv, f64::cbrt);
}

/// Cube root of the values an accessor callback extracts from `x`.
///
/// `clbk(value, i, [ix, iy])` returns the value to take the root of, or
/// `None` to leave `y` untouched at that element.
pub fn dcbrt_by<C>(n: usize, x: &[f64], stride_x: isize, y: &mut [f64], stride_y: isize, clbk: C)
where
    C: FnMut(f64, usize, [usize; 2]) -> Option<f64>,
{
    dcbrt_by_ndarray(
        n,
        x,
        stride_x,
        stride_to_offset(n, stride_x),
        y,
        stride_y,
        stride_to_offset(n, stride_y),
        clbk,
    );
}

#[allow(clippy::too_many_arguments)]
pub fn dcbrt_by_ndarray<C>(
    n: usize,
    x: &[f64],
    stride_x: isize,
    offset_x: usize,
    y: &mut [f64],
    stride_y: isize,
    offset_y: usize,
    clbk: C,
) where
    C: FnMut(f64, usize, [usize; 2]) -> Option<f64>,
{
    let xv = StridedView::new_unchecked(x, n, stride_x, offset_x);
    let mut yv = StridedView::new_unchecked(y, n, stride_y, offset_y);
    apply_by::unary_by(n, &xv, &mut yv, f64::cbrt, clbk);
}
