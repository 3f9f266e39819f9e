//! Multiple dispatch over data type signatures.
//!
//! A [`Dispatcher`] is built once per exported operation from a kernel list,
//! a flat signature table and optional per-row kernel data. At call time it
//! reads the dtype of every array argument, finds the first signature row
//! that matches the tuple exactly, and runs that row's kernel through the
//! strided apply engine.
//!
//! Two calling conventions are accepted. [`Dispatcher::call`] takes
//! `(buffer, stride)` pairs and derives each offset from the sign of its
//! stride; [`Dispatcher::ndarray`] takes explicit `(buffer, stride, offset)`
//! triples.
//!
//! Each convention also has an in-place form, where the first input and the
//! first output are the same array, and a `_by` form that forwards an
//! [`AccessorCallback`] to the kernel.

use crate::buffer::Buffer;
use crate::kernel::{AccessorCallback, Kernel, KernelData, Operand, OperandMut, StridedCall};
use crate::view::{stride_to_offset, validate_bounds};
use crate::{Result, StridedError};
use log::debug;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::iter;
use strided_traits::{DataType, Scalar};

type Signature = SmallVec<[DataType; 8]>;

/// The kernels of a dispatcher.
#[derive(Debug, Clone)]
pub enum KernelSet {
    /// One kernel shared by every signature row; rows differ only by data.
    Single(Kernel),
    /// One kernel per signature row.
    Multiple(Vec<Kernel>),
}

impl From<Kernel> for KernelSet {
    fn from(k: Kernel) -> Self {
        KernelSet::Single(k)
    }
}

impl From<Vec<Kernel>> for KernelSet {
    fn from(v: Vec<Kernel>) -> Self {
        KernelSet::Multiple(v)
    }
}

/// Calling convention implied by a dispatcher's argument count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// `N` followed by `(array, stride)` per array.
    Strided,
    /// `N` followed by `(array, stride, offset)` per array.
    Ndarray,
}

/// Immutable dispatch table for one operation.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    kernels: KernelSet,
    types: Vec<DataType>,
    data: Option<Vec<KernelData>>,
    nargs: usize,
    nin: usize,
    nout: usize,
    nrows: usize,
    convention: Convention,
    index: HashMap<Signature, usize>,
}

impl Dispatcher {
    /// Build a dispatcher.
    ///
    /// - `fcns`: one kernel for all rows, or one kernel per row.
    /// - `types`: flat signature table, `nin + nout` dtypes per row.
    /// - `data`: optional per-row payload passed to the kernel.
    /// - `nargs`: total argument count of the calling convention, either
    ///   `1 + 2*(nin+nout)` or `1 + 3*(nin+nout)`.
    ///
    /// # Errors
    /// Any inconsistency among these is reported here, never at call time.
    pub fn new(
        fcns: impl Into<KernelSet>,
        types: Vec<DataType>,
        data: Option<Vec<KernelData>>,
        nargs: usize,
        nin: usize,
        nout: usize,
    ) -> Result<Self> {
        let kernels = fcns.into();
        if let KernelSet::Multiple(v) = &kernels {
            if v.is_empty() {
                return Err(StridedError::EmptyKernelList);
            }
            if let Some(d) = &data {
                if d.len() != v.len() {
                    return Err(StridedError::KernelDataLengthMismatch {
                        kernels: v.len(),
                        data: d.len(),
                    });
                }
            }
        }
        if nargs == 0 {
            return Err(StridedError::InvalidArgumentCount);
        }
        let narrays = nin + nout;
        if narrays == 0 {
            return Err(StridedError::NoArrayArguments);
        }
        let convention = if nargs == 1 + 2 * narrays {
            Convention::Strided
        } else if nargs == 1 + 3 * narrays {
            Convention::Ndarray
        } else {
            return Err(StridedError::IncompatibleArgumentCount { nargs, nin, nout });
        };

        let nrows = match (&kernels, &data) {
            (KernelSet::Multiple(v), _) => v.len(),
            (KernelSet::Single(_), Some(d)) => d.len(),
            (KernelSet::Single(_), None) => (types.len() / narrays).max(1),
        };
        if nrows == 0 {
            return Err(StridedError::SignatureLengthMismatch {
                expected: narrays,
                found: types.len(),
            });
        }
        if types.len() != nrows * narrays {
            return Err(StridedError::SignatureLengthMismatch {
                expected: nrows * narrays,
                found: types.len(),
            });
        }

        let mut index = HashMap::with_capacity(nrows);
        for (row, sig) in types.chunks(narrays).enumerate() {
            // First row wins, as in a linear scan.
            index.entry(Signature::from_slice(sig)).or_insert(row);
        }

        debug!(
            "dispatcher: nin={} nout={} rows={} convention={:?}",
            nin, nout, nrows, convention
        );

        Ok(Self {
            kernels,
            types,
            data,
            nargs,
            nin,
            nout,
            nrows,
            convention,
            index,
        })
    }

    pub fn nargs(&self) -> usize {
        self.nargs
    }

    pub fn nin(&self) -> usize {
        self.nin
    }

    pub fn nout(&self) -> usize {
        self.nout
    }

    /// Number of signature rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// The convention implied by `nargs`. Both [`call`](Self::call) and
    /// [`ndarray`](Self::ndarray) are available regardless.
    pub fn convention(&self) -> Convention {
        self.convention
    }

    /// Dtypes of signature row `row`.
    pub fn signature(&self, row: usize) -> Option<&[DataType]> {
        let k = self.nin + self.nout;
        self.types.get(row * k..(row + 1) * k)
    }

    /// Index of the first row matching `dtypes` exactly.
    pub fn resolve(&self, dtypes: &[DataType]) -> Option<usize> {
        self.index.get(dtypes).copied()
    }

    /// Call with offsets derived from stride signs.
    pub fn call(
        &self,
        n: usize,
        inputs: &[(&Buffer, isize)],
        outputs: &mut [(&mut Buffer, isize)],
    ) -> Result<()> {
        let ins: SmallVec<[Operand<'_>; 4]> = inputs
            .iter()
            .map(|&(b, s)| Operand::new(b, s, stride_to_offset(n, s)))
            .collect();
        let mut outs: SmallVec<[OperandMut<'_>; 2]> = outputs
            .iter_mut()
            .map(|(b, s)| OperandMut::new(&mut **b, *s, stride_to_offset(n, *s)))
            .collect();
        self.apply(n, &ins, &mut outs)
    }

    /// Call with explicit offsets.
    pub fn ndarray(
        &self,
        n: usize,
        inputs: &[(&Buffer, isize, usize)],
        outputs: &mut [(&mut Buffer, isize, usize)],
    ) -> Result<()> {
        let ins: SmallVec<[Operand<'_>; 4]> = inputs
            .iter()
            .map(|&(b, s, o)| Operand::new(b, s, o))
            .collect();
        let mut outs: SmallVec<[OperandMut<'_>; 2]> = outputs
            .iter_mut()
            .map(|(b, s, o)| OperandMut::new(&mut **b, *s, *o))
            .collect();
        self.apply(n, &ins, &mut outs)
    }

    /// Like [`call`](Self::call), with an accessor callback applied to the
    /// values of every element before the kernel sees them.
    pub fn call_by<C>(
        &self,
        n: usize,
        inputs: &[(&Buffer, isize)],
        outputs: &mut [(&mut Buffer, isize)],
        mut clbk: C,
    ) -> Result<()>
    where
        C: FnMut(&mut [Scalar], usize, &[usize]) -> bool,
    {
        let ins: SmallVec<[Operand<'_>; 4]> = inputs
            .iter()
            .map(|&(b, s)| Operand::new(b, s, stride_to_offset(n, s)))
            .collect();
        let mut outs: SmallVec<[OperandMut<'_>; 2]> = outputs
            .iter_mut()
            .map(|(b, s)| OperandMut::new(&mut **b, *s, stride_to_offset(n, *s)))
            .collect();
        self.run(n, &ins, &mut outs, Some(&mut clbk))
    }

    pub fn ndarray_by<C>(
        &self,
        n: usize,
        inputs: &[(&Buffer, isize, usize)],
        outputs: &mut [(&mut Buffer, isize, usize)],
        mut clbk: C,
    ) -> Result<()>
    where
        C: FnMut(&mut [Scalar], usize, &[usize]) -> bool,
    {
        let ins: SmallVec<[Operand<'_>; 4]> = inputs
            .iter()
            .map(|&(b, s, o)| Operand::new(b, s, o))
            .collect();
        let mut outs: SmallVec<[OperandMut<'_>; 2]> = outputs
            .iter_mut()
            .map(|(b, s, o)| OperandMut::new(&mut **b, *s, *o))
            .collect();
        self.run(n, &ins, &mut outs, Some(&mut clbk))
    }

    /// Call with the first input and the first output being `inout`.
    ///
    /// `inputs` and `outputs` hold the remaining arguments, if any.
    pub fn call_in_place(
        &self,
        n: usize,
        inout: (&mut Buffer, isize),
        inputs: &[(&Buffer, isize)],
        outputs: &mut [(&mut Buffer, isize)],
    ) -> Result<()> {
        let (buffer, stride) = inout;
        let ins: SmallVec<[(&Buffer, isize, usize); 4]> = inputs
            .iter()
            .map(|&(b, s)| (b, s, stride_to_offset(n, s)))
            .collect();
        let mut outs: SmallVec<[(&mut Buffer, isize, usize); 2]> = outputs
            .iter_mut()
            .map(|(b, s)| (&mut **b, *s, stride_to_offset(n, *s)))
            .collect();
        self.ndarray_in_place(
            n,
            (buffer, stride, stride_to_offset(n, stride)),
            &ins,
            &mut outs,
        )
    }

    /// In-place form of [`ndarray`](Self::ndarray).
    ///
    /// The kernel reads input 0 from a copy of `inout` taken before it runs.
    /// Input and output share one stride and offset, so each element is
    /// read and written at the same position and the result equals the
    /// out-of-place call.
    pub fn ndarray_in_place(
        &self,
        n: usize,
        inout: (&mut Buffer, isize, usize),
        inputs: &[(&Buffer, isize, usize)],
        outputs: &mut [(&mut Buffer, isize, usize)],
    ) -> Result<()> {
        if self.nin == 0 || self.nout == 0 {
            return Err(StridedError::InPlaceUnsupported {
                nin: self.nin,
                nout: self.nout,
            });
        }
        let (buffer, stride, offset) = inout;
        let source = buffer.clone();
        let ins: SmallVec<[Operand<'_>; 4]> = iter::once(Operand::new(&source, stride, offset))
            .chain(inputs.iter().map(|&(b, s, o)| Operand::new(b, s, o)))
            .collect();
        let mut outs: SmallVec<[OperandMut<'_>; 2]> =
            iter::once(OperandMut::new(buffer, stride, offset))
                .chain(
                    outputs
                        .iter_mut()
                        .map(|(b, s, o)| OperandMut::new(&mut **b, *s, *o)),
                )
                .collect();
        self.apply(n, &ins, &mut outs)
    }

    /// Validate operands, resolve a kernel and run it.
    pub fn apply<'b>(
        &self,
        n: usize,
        inputs: &[Operand<'b>],
        outputs: &mut [OperandMut<'b>],
    ) -> Result<()> {
        self.run(n, inputs, outputs, None)
    }

    fn run<'c, 'b>(
        &self,
        n: usize,
        inputs: &'c [Operand<'b>],
        outputs: &'c mut [OperandMut<'b>],
        clbk: Option<&'c mut AccessorCallback<'c>>,
    ) -> Result<()> {
        if inputs.len() != self.nin {
            return Err(StridedError::ArrayCountMismatch {
                role: "input",
                expected: self.nin,
                found: inputs.len(),
            });
        }
        if outputs.len() != self.nout {
            return Err(StridedError::ArrayCountMismatch {
                role: "output",
                expected: self.nout,
                found: outputs.len(),
            });
        }

        let layouts = inputs
            .iter()
            .map(|op| (op.buffer().len(), op.stride(), op.offset()))
            .chain(outputs.iter().map(|op| (op.buffer_len(), op.stride(), op.offset())));
        for (position, (len, stride, offset)) in layouts.enumerate() {
            validate_bounds(len, n, stride, offset).map_err(|err| match err {
                StridedError::OutOfBounds { index, len } => StridedError::ArgumentOutOfBounds {
                    position,
                    index,
                    len,
                },
                other => other,
            })?;
        }

        let dtypes: Signature = inputs
            .iter()
            .map(Operand::dtype)
            .chain(outputs.iter().map(OperandMut::dtype))
            .collect();
        let Some(row) = self.resolve(&dtypes) else {
            let position = self.first_unsupported(&dtypes);
            debug!("dispatch rejected: types={:?} position={:?}", dtypes, position);
            return Err(StridedError::UnsupportedDataTypes {
                dtypes: dtypes.into_vec(),
                position,
            });
        };
        debug!("dispatch: n={} types={:?} -> row {}", n, dtypes, row);

        let kernel = match &self.kernels {
            KernelSet::Single(k) => k,
            KernelSet::Multiple(v) => &v[row],
        };
        let data = self.data.as_ref().and_then(|d| d.get(row));
        let mut call = StridedCall {
            n,
            inputs,
            outputs,
            clbk,
        };
        kernel.invoke(&mut call, data)
    }

    /// First argument position whose dtype appears in no row at that
    /// position.
    fn first_unsupported(&self, dtypes: &[DataType]) -> Option<usize> {
        let k = self.nin + self.nout;
        (0..k).find(|&p| !self.types.chunks(k).any(|row| row[p] == dtypes[p]))
    }

    #[cfg(test)]
    fn resolve_linear(&self, dtypes: &[DataType]) -> Option<usize> {
        self.types
            .chunks(self.nin + self.nout)
            .position(|row| row == dtypes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::kernel_data;
    use DataType::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn abs_f64() -> Dispatcher {
        Dispatcher::new(
            Kernel::unary::<f64, f64>(),
            vec![Float64, Float64],
            Some(vec![kernel_data(f64::abs as fn(f64) -> f64)]),
            5,
            1,
            1,
        )
        .unwrap()
    }

    #[test]
    fn test_configuration_errors() {
        let k = Kernel::unary::<f64, f64>();
        assert_eq!(
            Dispatcher::new(Vec::<Kernel>::new(), vec![], None, 5, 1, 1).unwrap_err(),
            StridedError::EmptyKernelList
        );
        assert_eq!(
            Dispatcher::new(
                vec![k.clone()],
                vec![Float64, Float64],
                Some(vec![kernel_data(1u8), kernel_data(2u8)]),
                5,
                1,
                1
            )
            .unwrap_err(),
            StridedError::KernelDataLengthMismatch {
                kernels: 1,
                data: 2
            }
        );
        assert_eq!(
            Dispatcher::new(k.clone(), vec![Float64, Float64], None, 0, 1, 1).unwrap_err(),
            StridedError::InvalidArgumentCount
        );
        assert_eq!(
            Dispatcher::new(k.clone(), vec![], None, 1, 0, 0).unwrap_err(),
            StridedError::NoArrayArguments
        );
        assert_eq!(
            Dispatcher::new(k.clone(), vec![Float64, Float64], None, 4, 1, 1).unwrap_err(),
            StridedError::IncompatibleArgumentCount {
                nargs: 4,
                nin: 1,
                nout: 1
            }
        );
        assert_eq!(
            Dispatcher::new(vec![k.clone(), k.clone()], vec![Float64, Float64], None, 5, 1, 1)
                .unwrap_err(),
            StridedError::SignatureLengthMismatch {
                expected: 4,
                found: 2
            }
        );
        // Empty row data leaves a single kernel with no signature rows.
        assert_eq!(
            Dispatcher::new(k, vec![], Some(vec![]), 5, 1, 1).unwrap_err(),
            StridedError::SignatureLengthMismatch {
                expected: 2,
                found: 0
            }
        );
    }

    #[test]
    fn test_conventions() {
        let d = abs_f64();
        assert_eq!(d.convention(), Convention::Strided);
        let d = Dispatcher::new(Kernel::unary::<f64, f64>(), vec![Float64, Float64], None, 7, 1, 1)
            .unwrap();
        assert_eq!(d.convention(), Convention::Ndarray);
        assert_eq!(d.nrows(), 1);
    }

    #[test]
    fn test_call_and_ndarray() {
        init_logger();
        let d = abs_f64();
        let x = Buffer::from(vec![-1.0, -2.0, -3.0]);
        let mut y = Buffer::zeros(Float64, 3);
        d.call(3, &[(&x, -1)], &mut [(&mut y, 1)]).unwrap();
        assert_eq!(y, Buffer::Float64(vec![3.0, 2.0, 1.0]));

        let mut y = Buffer::zeros(Float64, 4);
        d.ndarray(2, &[(&x, 1, 1)], &mut [(&mut y, 2, 1)]).unwrap();
        assert_eq!(y, Buffer::Float64(vec![0.0, 2.0, 0.0, 3.0]));
    }

    #[test]
    fn test_first_match_wins() {
        let first = Kernel::map(|v: f64| v + 1.0);
        let second = Kernel::map(|v: f64| v + 2.0);
        let d = Dispatcher::new(
            vec![first, second],
            vec![Float64, Float64, Float64, Float64],
            None,
            5,
            1,
            1,
        )
        .unwrap();
        assert_eq!(d.resolve(&[Float64, Float64]), Some(0));
        assert_eq!(d.resolve_linear(&[Float64, Float64]), Some(0));

        let x = Buffer::from(vec![1.0]);
        let mut y = Buffer::zeros(Float64, 1);
        d.call(1, &[(&x, 1)], &mut [(&mut y, 1)]).unwrap();
        assert_eq!(y, Buffer::Float64(vec![2.0]));
    }

    #[test]
    fn test_hash_index_matches_linear_scan() {
        let types = vec![
            Float64, Float64, Float32, Float32, Int32, Float64, Float32, Float32, Int8, Int8,
        ];
        let d = Dispatcher::new(Kernel::map(|v: f64| v), types, None, 5, 1, 1).unwrap();
        for a in DataType::ALL {
            for b in DataType::ALL {
                assert_eq!(d.resolve(&[a, b]), d.resolve_linear(&[a, b]));
            }
        }
        assert_eq!(d.resolve(&[Float32, Float32]), Some(1));
        assert_eq!(d.resolve(&[Float64]), None);
    }

    #[test]
    fn test_unsupported_types() {
        let d = abs_f64();
        let x = Buffer::from(vec![1.0f32]);
        let mut y = Buffer::zeros(Float64, 1);
        let err = d.call(1, &[(&x, 1)], &mut [(&mut y, 1)]).unwrap_err();
        assert_eq!(
            err,
            StridedError::UnsupportedDataTypes {
                dtypes: vec![Float32, Float64],
                position: Some(0)
            }
        );
        assert_eq!(
            err.to_string(),
            "no kernel for data types (float32, float64); no kernel accepts argument 0"
        );
    }

    #[test]
    fn test_argument_validation() {
        let d = abs_f64();
        let x = Buffer::from(vec![1.0, 2.0]);
        let mut y = Buffer::zeros(Float64, 3);
        assert_eq!(
            d.call(3, &[(&x, 1)], &mut [(&mut y, 1)]).unwrap_err(),
            StridedError::ArgumentOutOfBounds {
                position: 0,
                index: 2,
                len: 2
            }
        );
        assert!(matches!(
            d.call(1, &[], &mut [(&mut y, 1)]),
            Err(StridedError::ArrayCountMismatch { role: "input", .. })
        ));
    }

    #[test]
    fn test_zero_length_still_resolves() {
        let d = abs_f64();
        let x = Buffer::from(Vec::<f64>::new());
        let mut y = Buffer::from(Vec::<f64>::new());
        d.call(0, &[(&x, 1)], &mut [(&mut y, 1)]).unwrap();

        let mut bad = Buffer::from(Vec::<i8>::new());
        assert!(d.call(0, &[(&x, 1)], &mut [(&mut bad, 1)]).is_err());
    }

    #[test]
    fn test_in_place_matches_out_of_place() {
        let d = abs_f64();
        let x = Buffer::from(vec![-1.0, 5.0, -2.0, 6.0, -3.0]);
        let mut expected = x.clone();
        d.call(3, &[(&x, -2)], &mut [(&mut expected, -2)]).unwrap();

        let mut inout = x.clone();
        d.call_in_place(3, (&mut inout, -2), &[], &mut []).unwrap();
        assert_eq!(inout, expected);
        assert_eq!(inout, Buffer::Float64(vec![1.0, 5.0, 2.0, 6.0, 3.0]));

        let mut inout = x;
        d.ndarray_in_place(2, (&mut inout, 2, 1), &[], &mut []).unwrap();
        assert_eq!(inout, Buffer::Float64(vec![-1.0, 5.0, -2.0, 6.0, -3.0]));
        d.ndarray_in_place(2, (&mut inout, 2, 0), &[], &mut []).unwrap();
        assert_eq!(inout, Buffer::Float64(vec![1.0, 5.0, 2.0, 6.0, -3.0]));
    }

    #[test]
    fn test_in_place_binary_and_errors() {
        let d = Dispatcher::new(
            Kernel::map2(|a: f64, b: f64| a * b),
            vec![Float64, Float64, Float64],
            None,
            7,
            2,
            1,
        )
        .unwrap();
        let mut x = Buffer::from(vec![1.0, 2.0, 3.0]);
        let y = Buffer::from(vec![4.0, 5.0, 6.0]);
        d.call_in_place(3, (&mut x, 1), &[(&y, -1)], &mut []).unwrap();
        assert_eq!(x, Buffer::Float64(vec![6.0, 10.0, 12.0]));

        let mut short = Buffer::from(vec![1.0]);
        assert_eq!(
            d.call_in_place(3, (&mut short, 1), &[(&y, 1)], &mut []).unwrap_err(),
            StridedError::ArgumentOutOfBounds {
                position: 0,
                index: 2,
                len: 1
            }
        );

        let fill = Dispatcher::new(Kernel::fill(|| 1.0f64), vec![Float64], None, 3, 0, 1).unwrap();
        assert_eq!(
            fill.call_in_place(1, (&mut x, 1), &[], &mut []).unwrap_err(),
            StridedError::InPlaceUnsupported { nin: 0, nout: 1 }
        );
    }

    #[test]
    fn test_call_by_forwards_callback() {
        init_logger();
        let d = abs_f64();
        let x = Buffer::from(vec![-1.0, -2.0, -3.0, -4.0]);
        let mut y = Buffer::zeros(Float64, 4);
        let mut visited = Vec::new();
        d.call_by(4, &[(&x, 1)], &mut [(&mut y, -1)], |vals, i, idx| {
            visited.push([idx[0], idx[1]]);
            if let Scalar::Float(v) = vals[0] {
                vals[0] = Scalar::Float(v - 1.0);
            }
            i != 1
        })
        .unwrap();
        assert_eq!(y, Buffer::Float64(vec![5.0, 4.0, 0.0, 2.0]));
        assert_eq!(visited, vec![[0, 3], [1, 2], [2, 1], [3, 0]]);

        let mut y = Buffer::zeros(Float64, 3);
        d.ndarray_by(2, &[(&x, 2, 1)], &mut [(&mut y, 1, 1)], |_, _, _| true)
            .unwrap();
        assert_eq!(y, Buffer::Float64(vec![0.0, 2.0, 4.0]));
    }

    #[test]
    fn test_call_by_rejected_before_kernel_runs() {
        let d = abs_f64();
        let x = Buffer::from(vec![1.0f32]);
        let mut y = Buffer::zeros(Float64, 1);
        let mut calls = 0;
        let err = d
            .call_by(1, &[(&x, 1)], &mut [(&mut y, 1)], |_, _, _| {
                calls += 1;
                true
            })
            .unwrap_err();
        assert!(matches!(err, StridedError::UnsupportedDataTypes { .. }));
        assert_eq!(calls, 0);
    }
}
