//! Data type promotion and output dtype policies.

use crate::config::DtypeRegistry;
use strided_traits::DataType;

/// Signedness and bit width of an integer dtype.
fn int_info(dt: DataType) -> Option<(bool, u32)> {
    match dt {
        DataType::Int8 => Some((true, 8)),
        DataType::Int16 => Some((true, 16)),
        DataType::Int32 => Some((true, 32)),
        DataType::Uint8 => Some((false, 8)),
        DataType::Uint16 => Some((false, 16)),
        DataType::Uint32 => Some((false, 32)),
        _ => None,
    }
}

fn int_dtype(signed: bool, bits: u32) -> DataType {
    match (signed, bits) {
        (true, 8) => DataType::Int8,
        (true, 16) => DataType::Int16,
        (true, 32) => DataType::Int32,
        (false, 8) => DataType::Uint8,
        (false, 16) => DataType::Uint16,
        (false, 32) => DataType::Uint32,
        _ => DataType::Float64,
    }
}

fn promote_int((sa, ba): (bool, u32), (sb, bb): (bool, u32)) -> DataType {
    if sa == sb {
        return int_dtype(sa, ba.max(bb));
    }
    let (sbits, ubits) = if sa { (ba, bb) } else { (bb, ba) };
    // Smallest signed type holding every value of both.
    let bits = if sbits > ubits { sbits } else { sbits.max(2 * ubits) };
    if bits > 32 {
        DataType::Float64
    } else {
        int_dtype(true, bits)
    }
}

/// Promotion of two real numeric dtypes.
fn promote_real(a: DataType, b: DataType) -> DataType {
    match (int_info(a), int_info(b)) {
        (Some(ia), Some(ib)) => promote_int(ia, ib),
        _ => {
            // float32 only holds integers up to 16 bits exactly.
            let wide = |dt: DataType| {
                dt == DataType::Float64 || int_info(dt).map_or(false, |(_, bits)| bits >= 32)
            };
            if wide(a) || wide(b) {
                DataType::Float64
            } else {
                DataType::Float32
            }
        }
    }
}

/// The smallest dtype both `a` and `b` convert to without loss, if any.
///
/// `generic` absorbs every numeric and boolean dtype. `bool` and `binary`
/// only promote with themselves.
pub fn promote(a: DataType, b: DataType) -> Option<DataType> {
    if a == b {
        return Some(a);
    }
    match (a, b) {
        (DataType::Binary, _) | (_, DataType::Binary) => None,
        (DataType::Generic, _) | (_, DataType::Generic) => Some(DataType::Generic),
        (DataType::Bool, _) | (_, DataType::Bool) => None,
        _ if a.is_complex() || b.is_complex() => {
            let ra = a.real_counterpart().unwrap_or(a);
            let rb = b.real_counterpart().unwrap_or(b);
            promote_real(ra, rb).complex_counterpart()
        }
        _ => Some(promote_real(a, b)),
    }
}

/// Fold [`promote`] over a list; `None` for an empty list.
pub fn promote_all(dtypes: &[DataType]) -> Option<DataType> {
    let (&first, rest) = dtypes.split_first()?;
    rest.iter().try_fold(first, |acc, &dt| promote(acc, dt))
}

/// How an operation picks its output dtype from its input dtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPolicy {
    /// Same as the first input.
    Same,
    /// Promotion of all inputs.
    Promoted,
    /// Promoted; non-floating results use the default real (or complex)
    /// floating point dtype.
    FloatingPoint,
    RealFloatingPoint,
    ComplexFloatingPoint,
    /// Promoted; complex results drop to their real counterpart.
    Real,
    Bool,
    /// The registry's default real dtype.
    Default,
}

impl OutputPolicy {
    /// Output dtype for `inputs`, or `None` if the inputs do not promote or
    /// the registry does not support the result.
    pub fn resolve(self, inputs: &[DataType], registry: &DtypeRegistry) -> Option<DataType> {
        let out = match self {
            OutputPolicy::Same => inputs.first().copied()?,
            OutputPolicy::Bool => DataType::Bool,
            OutputPolicy::Default => registry.default_real(),
            policy => {
                let p = promote_all(inputs)?;
                if p == DataType::Generic {
                    DataType::Generic
                } else if p == DataType::Binary {
                    return None;
                } else {
                    policy.narrow(p, registry)?
                }
            }
        };
        registry.supports(out).then_some(out)
    }

    fn narrow(self, p: DataType, registry: &DtypeRegistry) -> Option<DataType> {
        let out = match self {
            OutputPolicy::Promoted => p,
            OutputPolicy::FloatingPoint if p.is_floating_point() => p,
            OutputPolicy::FloatingPoint => registry.default_real(),
            OutputPolicy::RealFloatingPoint if p.is_real_floating_point() => p,
            OutputPolicy::RealFloatingPoint => {
                p.real_counterpart().unwrap_or(registry.default_real())
            }
            OutputPolicy::ComplexFloatingPoint => p
                .complex_counterpart()
                .unwrap_or(registry.default_complex()),
            OutputPolicy::Real if p.is_real() => p,
            OutputPolicy::Real => p.real_counterpart().unwrap_or(registry.default_real()),
            OutputPolicy::Same | OutputPolicy::Bool | OutputPolicy::Default => return None,
        };
        Some(out)
    }
}
