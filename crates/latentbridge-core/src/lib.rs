//! Latentbridge Core - contrastive alignment of simulated and real latents
//!
//! Latentbridge generates two index-paired latent populations with a
//! controlled distribution shift, trains a small projector that pulls them
//! together under a symmetric InfoNCE objective, and reports whether the
//! gap between them shrank.
//!
//! # Architecture
//!
//! 1. **Latent Sampler** (`alignment::sampler`): paired populations with a linear drift
//! 2. **Alignment Model** (`alignment::model`): residual GELU projector + unit-norm head
//! 3. **Contrastive Trainer** (`alignment::trainer`): mini-batch Adam on symmetric InfoNCE
//! 4. **Gap Evaluator** (`alignment::gap`): mean paired Euclidean distance
//! 5. **Story Builder** (`story`): verdict, confidence and loss summary
//!
//! # Quick Start
//!
//! ```
//! use latentbridge_core::{run_alignment, AlignmentConfig};
//!
//! let config = AlignmentConfig::new()
//!     .with_samples(256)
//!     .with_latent_dim(16)
//!     .with_proj_dim(16)
//!     .with_epochs(5)
//!     .with_batch_size(64)
//!     .with_seed(1);
//!
//! let report = run_alignment(&config).unwrap();
//! println!(
//!     "{:?}: gap {:.3} -> {:.3} (confidence {:.2})",
//!     report.story.status(),
//!     report.story.gap_before(),
//!     report.story.gap_after(),
//!     report.story.confidence(),
//! );
//! ```

#![deny(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod alignment;
pub mod config;
pub mod drift;
pub mod error;
pub mod pipeline;
pub mod story;

// Re-export commonly used types for convenience
pub use alignment::{AlignmentModel, ContrastiveTrainer, LatentPair, LatentSampler, LossTrace};
pub use config::{AlignmentConfig, ModelConfig, SamplerConfig, TrainerConfig};
pub use drift::{DriftConfig, DriftReport, DriftSimulator};
pub use error::{AlignError, Result};
pub use pipeline::run_alignment;
pub use story::{AlignmentReport, AlignmentStatus, RunParameters, Story};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
