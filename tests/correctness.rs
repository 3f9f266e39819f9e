use approx::assert_relative_eq;
use num_complex::{Complex32, Complex64};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stdlib_strided::apply::{binary, nullary, unary, unary_in_place};
use stdlib_strided::blas::{
    caxpy, daxpy, daxpy_ndarray, dcopy, dfill, dscal, dswap, gfill_ndarray, saxpy, zfill,
    zfill_ndarray,
};
use stdlib_strided::ops::{abs, abs_in_place, add, cbrt, cbrt_by, dcbrt_by};
use stdlib_strided::{
    cmulf, kernel_data, Buffer, ComplexMut, DataType, Dispatcher, DtypeRegistry, Kernel,
    OutputPolicy, Scalar, StridedError, StridedView,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn random_vec(rng: &mut StdRng, len: usize) -> Vec<f64> {
    (0..len).map(|_| rng.gen_range(-10.0..10.0)).collect()
}

#[test]
fn test_callback_runs_exactly_n_times() {
    init_logger();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let kernel = Kernel::map(move |v: f64| {
        counter.fetch_add(1, Ordering::Relaxed);
        v + 1.0
    });
    let d = Dispatcher::new(kernel, vec![DataType::Float64, DataType::Float64], None, 5, 1, 1)
        .unwrap();

    let x = Buffer::from(vec![0.0; 12]);
    let mut y = Buffer::zeros(DataType::Float64, 12);
    d.call(4, &[(&x, 3)], &mut [(&mut y, -2)]).unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), 4);

    // Only the strided positions of y were written.
    let Buffer::Float64(out) = &y else {
        panic!("output dtype changed");
    };
    let written: Vec<usize> = (0..12).filter(|&i| out[i] != 0.0).collect();
    assert_eq!(written, vec![0, 2, 4, 6]);
}

#[test]
fn test_negative_stride_reverses() {
    let x = vec![1.0, 2.0, 3.0, 4.0];
    let mut y = vec![0.0; 4];
    let xv = StridedView::from_stride(&x[..], 4, -1).unwrap();
    let mut yv = StridedView::from_stride(&mut y[..], 4, 1).unwrap();
    unary(4, &xv, &mut yv, |v: f64| v);
    assert_eq!(y, vec![4.0, 3.0, 2.0, 1.0]);

    let mut z = vec![0.0; 4];
    dcopy(4, &x, -1, &mut z, 1);
    assert_eq!(z, y);
}

#[test]
fn test_zero_length_is_noop() {
    init_logger();
    let kernel = Kernel::map(|_: f64| -> f64 { panic!("kernel callback must not run") });
    let d = Dispatcher::new(kernel, vec![DataType::Float64, DataType::Float64], None, 5, 1, 1)
        .unwrap();
    let x = Buffer::from(vec![5.0]);
    let mut y = Buffer::from(vec![7.0]);
    d.call(0, &[(&x, 1)], &mut [(&mut y, 1)]).unwrap();
    assert_eq!(y, Buffer::Float64(vec![7.0]));

    let mut raw = vec![7.0; 3];
    let mut v = StridedView::from_stride(&mut raw[..], 0, 1).unwrap();
    nullary(0, &mut v, || -> f64 { panic!("callback must not run") });
    dfill(0, 1.0, &mut raw, 1);
    daxpy(0, 2.0, &[1.0], 1, &mut raw, 1);
    assert_eq!(raw, vec![7.0; 3]);
}

#[test]
fn test_dispatch_exact_match_only() {
    init_logger();
    let d = Dispatcher::new(
        vec![Kernel::binary::<f64, f64, f64>(), Kernel::binary::<f32, f32, f32>()],
        vec![
            DataType::Float64,
            DataType::Float64,
            DataType::Float64,
            DataType::Float32,
            DataType::Float32,
            DataType::Float32,
        ],
        Some(vec![
            kernel_data((|a: f64, b: f64| a + b) as fn(f64, f64) -> f64),
            kernel_data((|a: f32, b: f32| a + b) as fn(f32, f32) -> f32),
        ]),
        7,
        2,
        1,
    )
    .unwrap();

    let a = Buffer::from(vec![1.0, 2.0]);
    let b = Buffer::from(vec![10.0f32, 20.0]);
    let mut out = Buffer::zeros(DataType::Float64, 2);
    match d.call(2, &[(&a, 1), (&b, 1)], &mut [(&mut out, 1)]) {
        Err(StridedError::UnsupportedDataTypes { dtypes, position }) => {
            assert_eq!(
                dtypes,
                vec![DataType::Float64, DataType::Float32, DataType::Float64]
            );
            assert_eq!(position, None);
        }
        other => panic!("expected a resolution error, got {other:?}"),
    }

    assert_eq!(
        d.resolve(&[DataType::Float64, DataType::Float64, DataType::Float64]),
        Some(0)
    );
    let b = Buffer::from(vec![10.0, 20.0]);
    d.call(2, &[(&a, 1), (&b, 1)], &mut [(&mut out, 1)]).unwrap();
    assert_eq!(out, Buffer::Float64(vec![11.0, 22.0]));
}

#[test]
fn test_zfill_unrolled_fill() {
    let mut x = vec![0.0; 10];
    zfill_ndarray(5, Complex64::new(10.0, 10.0), &mut x, 1, 0);
    assert_eq!(x, vec![10.0; 10]);
}

#[test]
fn test_fast_paths_match_generic_path() {
    let mut rng = StdRng::seed_from_u64(42);
    for n in [1usize, 3, 4, 5, 8, 9, 16, 31, 100] {
        // fill
        let alpha: f64 = rng.gen_range(-5.0..5.0);
        let mut fast = random_vec(&mut rng, n + 3);
        let mut slow = fast.clone();
        dfill(n, alpha, &mut fast, 1);
        gfill_ndarray(n, alpha, &mut slow[..], 1, 0);
        assert_eq!(fast, slow, "dfill n={n}");

        // complex fill against the accessor path
        let z = Complex64::new(rng.gen(), rng.gen());
        let mut fast = random_vec(&mut rng, 2 * n);
        let mut slow = fast.clone();
        zfill(n, z, &mut fast, 1);
        gfill_ndarray(n, z, ComplexMut::new(&mut slow), 1, 0);
        assert_eq!(fast, slow, "zfill n={n}");

        // axpy against a scalar loop
        let x = random_vec(&mut rng, n);
        let y0 = random_vec(&mut rng, n);
        let mut fast = y0.clone();
        daxpy(n, alpha, &x, 1, &mut fast, 1);
        let mut slow = y0.clone();
        for i in 0..n {
            slow[i] += alpha * x[i];
        }
        for i in 0..n {
            assert_relative_eq!(fast[i], slow[i], epsilon = 1e-12);
        }

        // Same values through the strided fallback (stride 2).
        let mut wide_x = vec![0.0; 2 * n];
        let mut wide_y = vec![0.0; 2 * n];
        for i in 0..n {
            wide_x[2 * i] = x[i];
            wide_y[2 * i] = y0[i];
        }
        daxpy_ndarray(n, alpha, &wide_x, 2, 0, &mut wide_y, 2, 0);
        for i in 0..n {
            assert_eq!(wide_y[2 * i], fast[i]);
        }

        // scal
        let mut fast = random_vec(&mut rng, n);
        let mut slow = fast.clone();
        dscal(n, alpha, &mut fast, 1);
        let mut v = StridedView::from_stride(&mut slow[..], n, 1).unwrap();
        unary_in_place(n, &mut v, |e| alpha * e);
        assert_eq!(fast, slow, "dscal n={n}");

        // swap
        let mut a = random_vec(&mut rng, n);
        let mut b = random_vec(&mut rng, n);
        let (a0, b0) = (a.clone(), b.clone());
        dswap(n, &mut a, 1, &mut b, 1);
        assert_eq!((a, b), (b0, a0));
    }
}

#[test]
fn test_single_precision_fast_paths() {
    let x = vec![0.25f32; 13];
    let mut y = vec![1.0f32; 13];
    saxpy(13, 4.0, &x, 1, &mut y, 1);
    assert!(y.iter().all(|&v| v == 2.0));

    let x = vec![5.0f32, 3.0, 5.0, 3.0];
    let mut y = vec![0.0f32; 4];
    caxpy(2, Complex32::new(-2.0, 1.0), &x, -1, &mut y, 1);
    assert_eq!(y, vec![-13.0, -1.0, -13.0, -1.0]);
}

#[test]
fn test_in_place_matches_out_of_place() {
    let mut rng = StdRng::seed_from_u64(7);
    let data = random_vec(&mut rng, 33);

    let mut out = vec![0.0; 11];
    let xv = StridedView::from_stride(&data[..], 11, -3).unwrap();
    let mut ov = StridedView::from_stride(&mut out[..], 11, 1).unwrap();
    unary(11, &xv, &mut ov, |v: f64| v * v - 1.0);

    let mut in_place = data.clone();
    let mut v = StridedView::from_stride(&mut in_place[..], 11, -3).unwrap();
    unary_in_place(11, &mut v, |v: f64| v * v - 1.0);
    let got = StridedView::from_stride(&in_place[..], 11, -3).unwrap().to_vec();
    assert_eq!(got, out);

    // Untouched slots keep their values.
    for i in (0..33).filter(|i| i % 3 != 0) {
        assert_eq!(in_place[i], data[i]);
    }
}

#[test]
fn test_binary_reads_inputs_before_writing() {
    let x = vec![1.0, 2.0, 3.0];
    let y = vec![4.0, 5.0, 6.0];
    let mut z = vec![0.0; 3];
    let xv = StridedView::from_stride(&x[..], 3, 1).unwrap();
    let yv = StridedView::from_stride(&y[..], 3, -1).unwrap();
    let mut zv = StridedView::from_stride(&mut z[..], 3, 1).unwrap();
    binary(3, &xv, &yv, &mut zv, |a: f64, b: f64| a * b);
    assert_eq!(z, vec![6.0, 10.0, 12.0]);
}

#[test]
fn test_cmulf_single_precision() {
    let z = cmulf(Complex32::new(5.0, 3.0), Complex32::new(-2.0, 1.0));
    assert_eq!(z, Complex32::new(-13.0, -1.0));
}

#[test]
fn test_dcbrt_by_end_to_end() {
    let x = vec![1.0, 9.0, -27.0, 81.0, -125.0];
    let mut y = vec![0.0; 5];
    dcbrt_by(5, &x, 1, &mut y, 1, |v, _, _| Some(v));
    let expected = [1.0, 2.080083823051904, -3.0, 4.326748710922225, -5.0];
    for (got, want) in y.iter().zip(expected) {
        assert_relative_eq!(*got, want, max_relative = 1e-12);
    }
}

#[test]
fn test_abs_dispatch_with_offsets() {
    init_logger();
    let x = Buffer::from_complex128(&[
        Complex64::new(3.0, 4.0),
        Complex64::new(-5.0, 12.0),
        Complex64::new(8.0, -15.0),
    ]);
    let mut y = Buffer::zeros(DataType::Float64, 3);
    abs(3, &x, 1, &mut y, -1).unwrap();
    assert_eq!(y, Buffer::Float64(vec![17.0, 13.0, 5.0]));

    let mut short = Buffer::zeros(DataType::Float64, 2);
    assert!(matches!(
        abs(3, &x, 1, &mut short, 1),
        Err(StridedError::ArgumentOutOfBounds { position: 1, .. })
    ));
}

#[test]
fn test_output_dtype_resolved_before_dispatch() {
    init_logger();
    let registry = DtypeRegistry::default();

    // |z| lands in the real counterpart of the complex input.
    let x = Buffer::from_complex128(&[Complex64::new(3.0, 4.0), Complex64::new(0.0, -2.0)]);
    let dt = OutputPolicy::RealFloatingPoint
        .resolve(&[x.dtype()], &registry)
        .unwrap();
    assert_eq!(dt, DataType::Float64);
    let mut y = registry.allocate(dt, 2).unwrap();
    abs(2, &x, 1, &mut y, 1).unwrap();
    assert_eq!(y, Buffer::Float64(vec![5.0, 2.0]));

    let a = Buffer::from(vec![1i32, 2, 3]);
    let b = Buffer::from(vec![4i32, 5, 6]);
    let dt = OutputPolicy::Promoted
        .resolve(&[a.dtype(), b.dtype()], &registry)
        .unwrap();
    let mut c = registry.allocate(dt, 3).unwrap();
    add(3, &a, 1, &b, 1, &mut c, 1).unwrap();
    assert_eq!(c, Buffer::Int32(vec![5, 7, 9]));

    // A policy that widens past every kernel row is caught by dispatch.
    let dt = OutputPolicy::FloatingPoint
        .resolve(&[a.dtype(), b.dtype()], &registry)
        .unwrap();
    let mut c = registry.allocate(dt, 3).unwrap();
    assert!(matches!(
        add(3, &a, 1, &b, 1, &mut c, 1),
        Err(StridedError::UnsupportedDataTypes { .. })
    ));
}

#[test]
fn test_registry_default_real_drives_output() {
    let registry = DtypeRegistry::builder()
        .default_real(DataType::Float32)
        .build();
    let dt = OutputPolicy::Default.resolve(&[], &registry).unwrap();
    let x = registry.allocate(dt, 2).unwrap();
    let mut y = registry.allocate(dt, 2).unwrap();
    cbrt(2, &x, 1, &mut y, 1).unwrap();
    assert_eq!(y, Buffer::Float32(vec![0.0, 0.0]));
}

#[test]
fn test_abs_in_place_on_strided_buffer() {
    let mut rng = StdRng::seed_from_u64(7);
    let values = random_vec(&mut rng, 9);
    let x = Buffer::from(values.clone());
    let mut expected = x.clone();
    abs(3, &x, -3, &mut expected, -3).unwrap();

    let mut inout = Buffer::from(values);
    abs_in_place(3, &mut inout, -3).unwrap();
    assert_eq!(inout, expected);
}

#[test]
fn test_cbrt_by_counts_holes() {
    let x = Buffer::from(vec![1.0, 8.0, 27.0, 64.0]);
    let mut y = Buffer::from(vec![-1.0; 4]);
    let mut holes = 0;
    cbrt_by(4, &x, 1, &mut y, 1, |vals, _, _| match vals[0] {
        Scalar::Float(v) if v > 10.0 => {
            holes += 1;
            false
        }
        _ => true,
    })
    .unwrap();
    assert_eq!(holes, 2);
    let Buffer::Float64(out) = &y else {
        panic!("expected float64 output");
    };
    assert_relative_eq!(out[0], 1.0);
    assert_relative_eq!(out[1], 2.0);
    assert_eq!(&out[2..], &[-1.0, -1.0]);
}
