//! Numeric vector capability contract.
//!
//! The integrator never inspects vector storage directly. It requires a small
//! set of operations ([`NVector`]) and, for some features, optional operations
//! advertised through a [`VectorOps`] capability set. Capability sets are
//! checked once, when a feature is configured.

/// Optional vector operations a backend may provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VectorOps {
    pub divide: bool,
    pub max_norm: bool,
    pub compare: bool,
    pub constraint_mask: bool,
    pub min_quotient: bool,
}

impl VectorOps {
    /// No optional operations.
    pub const NONE: Self = Self {
        divide: false,
        max_norm: false,
        compare: false,
        constraint_mask: false,
        min_quotient: false,
    };

    /// Every optional operation.
    pub const ALL: Self = Self {
        divide: true,
        max_norm: true,
        compare: true,
        constraint_mask: true,
        min_quotient: true,
    };

    /// Operations needed to enforce inequality constraints.
    pub const CONSTRAINTS: Self = Self::ALL;

    /// True when every operation in `required` is available here.
    #[must_use]
    pub const fn supports(self, required: Self) -> bool {
        (self.divide || !required.divide)
            && (self.max_norm || !required.max_norm)
            && (self.compare || !required.compare)
            && (self.constraint_mask || !required.constraint_mask)
            && (self.min_quotient || !required.min_quotient)
    }
}

/// Identity tag of a vector backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VectorBackend {
    #[default]
    Serial,
    OpenMp,
    Pthreads,
    Parallel,
    Cuda,
    Hip,
    Sycl,
    Custom,
}

impl VectorBackend {
    /// Backends whose data lives on an accelerator and that ship fused
    /// integrator kernels.
    #[must_use]
    pub const fn is_accelerator_resident(self) -> bool {
        matches!(self, Self::Cuda | Self::Hip)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::OpenMp => "openmp",
            Self::Pthreads => "pthreads",
            Self::Parallel => "parallel",
            Self::Cuda => "cuda",
            Self::Hip => "hip",
            Self::Sycl => "sycl",
            Self::Custom => "custom",
        }
    }
}

/// Operations the integrator requires from its state vector type.
pub trait NVector {
    /// Number of elements.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Optional operations this vector supports.
    fn ops(&self) -> VectorOps;

    /// Backend identity tag.
    fn backend(&self) -> VectorBackend;

    /// Storage footprint as `(real words, integer words)`.
    fn space(&self) -> (usize, usize);

    /// New vector of the same shape and backend; contents unspecified.
    fn clone_empty(&self) -> Self
    where
        Self: Sized;

    /// `dst = c * self`, elementwise.
    fn scale_into(&self, c: f64, dst: &mut Self)
    where
        Self: Sized;

    /// Largest absolute element, 0 for an empty vector.
    fn max_norm(&self) -> f64;
}

/// Host-memory vector backed by a `Vec<f64>`.
#[derive(Debug, Clone, PartialEq)]
pub struct SerialVector {
    data: Vec<f64>,
    ops: VectorOps,
    backend: VectorBackend,
}

impl SerialVector {
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self::from_vec(vec![0.0; len])
    }

    #[must_use]
    pub fn from_vec(data: Vec<f64>) -> Self {
        Self {
            data,
            ops: VectorOps::ALL,
            backend: VectorBackend::Serial,
        }
    }

    #[must_use]
    pub fn from_slice(data: &[f64]) -> Self {
        Self::from_vec(data.to_vec())
    }

    /// Restrict (or widen) the advertised capability set.
    #[must_use]
    pub fn with_ops(mut self, ops: VectorOps) -> Self {
        self.ops = ops;
        self
    }

    /// Report a different backend identity.
    #[must_use]
    pub fn with_backend(mut self, backend: VectorBackend) -> Self {
        self.backend = backend;
        self
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

impl NVector for SerialVector {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn ops(&self) -> VectorOps {
        self.ops
    }

    fn backend(&self) -> VectorBackend {
        self.backend
    }

    fn space(&self) -> (usize, usize) {
        (self.data.len(), 1)
    }

    fn clone_empty(&self) -> Self {
        Self {
            data: vec![0.0; self.data.len()],
            ops: self.ops,
            backend: self.backend,
        }
    }

    fn scale_into(&self, c: f64, dst: &mut Self) {
        dst.data.clear();
        dst.data.extend(self.data.iter().map(|x| c * x));
    }

    fn max_norm(&self) -> f64 {
        self.data.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
    }
}
