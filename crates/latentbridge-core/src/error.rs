//! Error types for Latentbridge Core
//!
//! This module defines all error types used by the alignment pipeline.
//! We use `thiserror` for ergonomic error definitions with automatic Display/Error implementations.

use thiserror::Error;

/// Result type alias for alignment operations
pub type Result<T> = std::result::Result<T, AlignError>;

/// Main error type for alignment operations
#[derive(Error, Debug)]
pub enum AlignError {
    /// A batch fed to the model has the wrong feature width
    #[error("Dimension mismatch: expected {expected} features, got {actual}")]
    DimensionMismatch {
        /// Latent dimension the model was built for
        expected: usize,
        /// Feature width actually supplied
        actual: usize,
    },

    /// A population tensor is not a matrix
    #[error("Rank mismatch: expected a rank-{expected} tensor, got rank {actual}")]
    RankMismatch {
        /// Required rank
        expected: usize,
        /// Rank actually supplied
        actual: usize,
    },

    /// Paired populations disagree in length or dimension
    #[error("Population mismatch: simulated is {simulated:?}, real is {real:?}")]
    PopulationMismatch {
        /// `(N, D)` of the simulated population
        simulated: (usize, usize),
        /// `(N, D)` of the real population
        real: (usize, usize),
    },

    /// A configuration value violates a precondition
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The contrastive loss stopped being a finite number
    #[error("Non-finite loss {value} at epoch {epoch}, batch {batch}")]
    NonFiniteLoss {
        /// Zero-based epoch index
        epoch: usize,
        /// Zero-based batch index within the epoch
        batch: usize,
        /// Offending value
        value: f64,
    },

    /// A gap computed over a non-empty population is not finite
    #[error("Non-finite {metric}: {value}")]
    NonFiniteMetric {
        /// Metric name (`gap_before`, `gap_after`)
        metric: &'static str,
        /// Offending value
        value: f64,
    },

    /// Tensor library errors
    #[error("Tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        /// What was being attempted
        context: String,
        /// Underlying failure
        source: Box<AlignError>,
    },
}

impl AlignError {
    /// Add context to an error
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// True for failures caused by NaN/Inf numbers rather than bad input
    pub fn is_numeric_degeneracy(&self) -> bool {
        match self {
            Self::NonFiniteLoss { .. } | Self::NonFiniteMetric { .. } => true,
            Self::WithContext { source, .. } => source.is_numeric_degeneracy(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add lazy context to a Result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.context(f()))
    }
}
