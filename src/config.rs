//! Data type configuration.
//!
//! [`DtypeRegistry`] records which dtypes are supported, the default dtype of
//! each kind, and the dtype lists per kind. A registry is immutable once
//! built; [`DtypeRegistry::shared`] hands out one process-wide instance.
//!
//! Environment:
//! - `STRIDED_DEFAULT_DTYPE`: default real floating point dtype used by
//!   [`DtypeRegistry::from_env`] (and therefore by the shared registry).

use crate::buffer::Buffer;
use log::{trace, warn};
use std::sync::OnceLock;
use strided_traits::DataType;

/// Environment variable overriding the default real dtype.
pub const ENV_DEFAULT_DTYPE: &str = "STRIDED_DEFAULT_DTYPE";

/// Named groups of dtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DtypeKind {
    All,
    Numeric,
    Real,
    FloatingPoint,
    RealFloatingPoint,
    ComplexFloatingPoint,
    Integer,
    SignedInteger,
    UnsignedInteger,
}

impl DtypeKind {
    const COUNT: usize = 9;

    fn slot(self) -> usize {
        self as usize
    }

    fn contains(self, dt: DataType) -> bool {
        match self {
            DtypeKind::All => true,
            DtypeKind::Numeric => dt.is_numeric(),
            DtypeKind::Real => dt.is_real(),
            DtypeKind::FloatingPoint => dt.is_floating_point(),
            DtypeKind::RealFloatingPoint => dt.is_real_floating_point(),
            DtypeKind::ComplexFloatingPoint => dt.is_complex(),
            DtypeKind::Integer => dt.is_integer(),
            DtypeKind::SignedInteger => dt.is_signed_integer(),
            DtypeKind::UnsignedInteger => dt.is_unsigned_integer(),
        }
    }

    const ALL: [DtypeKind; DtypeKind::COUNT] = [
        DtypeKind::All,
        DtypeKind::Numeric,
        DtypeKind::Real,
        DtypeKind::FloatingPoint,
        DtypeKind::RealFloatingPoint,
        DtypeKind::ComplexFloatingPoint,
        DtypeKind::Integer,
        DtypeKind::SignedInteger,
        DtypeKind::UnsignedInteger,
    ];
}

/// Immutable dtype configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtypeRegistry {
    default_real: DataType,
    default_complex: DataType,
    default_index: DataType,
    kinds: [Vec<DataType>; DtypeKind::COUNT],
}

impl Default for DtypeRegistry {
    fn default() -> Self {
        DtypeRegistry::builder().build()
    }
}

impl DtypeRegistry {
    pub fn builder() -> DtypeRegistryBuilder {
        DtypeRegistryBuilder::default()
    }

    /// Default configuration with `STRIDED_DEFAULT_DTYPE` applied.
    ///
    /// An unknown or non-real-floating value is ignored with a warning.
    pub fn from_env() -> Self {
        let mut builder = DtypeRegistry::builder();
        if let Ok(value) = std::env::var(ENV_DEFAULT_DTYPE) {
            match value.trim().parse::<DataType>() {
                Ok(dt) if dt.is_real_floating_point() => {
                    trace!("{}={} overrides the default real dtype", ENV_DEFAULT_DTYPE, dt);
                    builder = builder.default_real(dt);
                }
                Ok(dt) => warn!(
                    "{}={} is not a real floating point dtype; ignoring",
                    ENV_DEFAULT_DTYPE, dt
                ),
                Err(err) => warn!("{}: {}; ignoring", ENV_DEFAULT_DTYPE, err),
            }
        }
        builder.build()
    }

    /// The process-wide registry, built from the environment on first use.
    pub fn shared() -> &'static DtypeRegistry {
        static SHARED: OnceLock<DtypeRegistry> = OnceLock::new();
        SHARED.get_or_init(DtypeRegistry::from_env)
    }

    pub fn default_real(&self) -> DataType {
        self.default_real
    }

    pub fn default_complex(&self) -> DataType {
        self.default_complex
    }

    pub fn default_index(&self) -> DataType {
        self.default_index
    }

    /// Supported dtypes of `kind`, in canonical order.
    pub fn dtypes(&self, kind: DtypeKind) -> &[DataType] {
        &self.kinds[kind.slot()]
    }

    pub fn supports(&self, dtype: DataType) -> bool {
        self.dtypes(DtypeKind::All).contains(&dtype)
    }

    /// Zero-initialized storage, or `None` for an unsupported dtype.
    pub fn allocate(&self, dtype: DataType, len: usize) -> Option<Buffer> {
        self.supports(dtype).then(|| Buffer::zeros(dtype, len))
    }

    /// Like [`allocate`](Self::allocate), by dtype name.
    pub fn allocate_named(&self, name: &str, len: usize) -> Option<Buffer> {
        self.allocate(name.parse().ok()?, len)
    }
}

/// Builder for [`DtypeRegistry`].
#[derive(Debug, Clone)]
pub struct DtypeRegistryBuilder {
    supported: Vec<DataType>,
    default_real: DataType,
    default_complex: DataType,
    default_index: DataType,
}

impl Default for DtypeRegistryBuilder {
    fn default() -> Self {
        Self {
            supported: DataType::ALL.to_vec(),
            default_real: DataType::Float64,
            default_complex: DataType::Complex128,
            default_index: DataType::Int32,
        }
    }
}

impl DtypeRegistryBuilder {
    /// Restrict the supported dtypes. Defaults are always supported.
    pub fn supported(mut self, dtypes: Vec<DataType>) -> Self {
        self.supported = dtypes;
        self
    }

    pub fn default_real(mut self, dtype: DataType) -> Self {
        self.default_real = dtype;
        self
    }

    pub fn default_complex(mut self, dtype: DataType) -> Self {
        self.default_complex = dtype;
        self
    }

    pub fn default_index(mut self, dtype: DataType) -> Self {
        self.default_index = dtype;
        self
    }

    pub fn build(self) -> DtypeRegistry {
        let mut all = self.supported;
        all.extend([self.default_real, self.default_complex, self.default_index]);
        all.sort();
        all.dedup();

        let kinds = DtypeKind::ALL.map(|kind| {
            all.iter()
                .copied()
                .filter(|&dt| kind.contains(dt))
                .collect::<Vec<_>>()
        });

        DtypeRegistry {
            default_real: self.default_real,
            default_complex: self.default_complex,
            default_index: self.default_index,
            kinds,
        }
    }
}
