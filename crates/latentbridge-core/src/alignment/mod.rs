//! Contrastive alignment of simulated and real latent populations
//!
//! # Architecture
//!
//! The alignment system consists of four components, leaves first:
//!
//! ## 1. LatentSampler (`sampler`)
//!
//! Produces paired `[N, D]` populations sharing a base draw:
//! - simulated: base plus noise (σ = 0.08)
//! - real: base plus a linear per-dimension drift plus noise (σ = 0.04)
//!
//! ## 2. AlignmentModel (`model`)
//!
//! A two-layer GELU projector `D -> P -> D` with a fixed temperature:
//! - `embed(z)`: unit-norm projection used for contrastive comparison
//! - `transform(z)`: residual correction `z + proj(z)`
//!
//! ## 3. ContrastiveTrainer (`trainer`)
//!
//! Mini-batch Adam on the projector under a symmetric InfoNCE loss with
//! in-batch negatives.
//!
//! ## 4. Gap (`gap`)
//!
//! Mean paired Euclidean distance, measured on raw latents before training
//! and on embeddings after it.
//!
//! # How It Works
//!
//! ```text
//! LatentSampler ──> LatentPair ──┬──> gap_before
//!                                │
//!                                v
//!               ContrastiveTrainer ──(mutates)──> AlignmentModel
//!                                │                      │
//!                                v                      v
//!                           LossTrace               gap_after
//! ```
//!
//! # Example Usage
//!
//! ```
//! use latentbridge_core::alignment::{gap, AlignmentModel, ContrastiveTrainer, LatentSampler};
//! use latentbridge_core::config::{ModelConfig, SamplerConfig, TrainerConfig};
//! use rand::SeedableRng;
//!
//! # fn example() -> latentbridge_core::error::Result<()> {
//! let sampler_config = SamplerConfig { n_samples: 64, latent_dim: 8, ..Default::default() };
//! let pair = LatentSampler::seeded(sampler_config, 0).sample()?;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let mut model = AlignmentModel::new(8, &ModelConfig::default(), &mut rng)?;
//!
//! let config = TrainerConfig { epochs: 3, batch_size: 16, ..Default::default() };
//! let losses = ContrastiveTrainer::seeded(config, 2).train(&mut model, &pair)?;
//!
//! let before = gap::gap_before(&pair)?;
//! let after = gap::gap_after(&model, &pair)?;
//! println!("{} epochs, gap {before:.3} -> {after:.3}", losses.len());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod gap;
pub mod model;
pub mod sampler;
pub mod trainer;

// Re-export main types for convenience
pub use model::AlignmentModel;
pub use sampler::{LatentPair, LatentSampler};
pub use trainer::{symmetric_info_nce, ContrastiveTrainer, LossTrace};
