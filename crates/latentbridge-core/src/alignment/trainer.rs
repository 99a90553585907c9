//! Contrastive trainer
//!
//! Pulls the simulated and real populations together by teaching the
//! projector that the embedding of simulated sample `i` should match the
//! embedding of real sample `i` better than any other real sample in the
//! same mini-batch, and vice versa.
//!
//! # Epoch structure
//!
//! ```text
//! shuffle(0..N) ──> chunks of batch_size ──> for each chunk:
//!                                              embed(sim), embed(real)
//!                                              logits = sim · realᵀ / τ
//!                                              loss = (CE(rows) + CE(cols)) / 2
//!                                              Adam step on projector
//! epoch loss = Σ batch losses / max(1, N / batch_size)
//! ```
//!
//! The divisor counts only full-size chunks, so with a short trailing
//! chunk the epoch loss is slightly above the true batch mean.

use super::model::AlignmentModel;
use super::sampler::{matrix_dims, LatentPair};
use crate::config::TrainerConfig;
use crate::error::{AlignError, Result};
use candle_core::Tensor;
use candle_nn::{AdamW, Optimizer, ParamsAdamW};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Per-epoch losses in epoch order
pub type LossTrace = Vec<f64>;

/// Symmetric InfoNCE loss over paired, unit-norm embeddings
///
/// Row `i` of `sim_embeddings` is the positive for row `i` of
/// `real_embeddings`; every other row in the batch is a negative. The loss
/// averages the cross-entropy of classifying rows and columns of the
/// similarity matrix against the diagonal.
pub fn symmetric_info_nce(
    sim_embeddings: &Tensor,
    real_embeddings: &Tensor,
    temperature: f64,
) -> Result<Tensor> {
    let sim_shape = matrix_dims(sim_embeddings)?;
    let real_shape = matrix_dims(real_embeddings)?;
    if sim_shape != real_shape {
        return Err(AlignError::PopulationMismatch {
            simulated: sim_shape,
            real: real_shape,
        });
    }
    let batch = sim_shape.0;

    // [B, B]: logits[i, j] = cos(sim_i, real_j) / τ
    let logits = (sim_embeddings.matmul(&real_embeddings.t()?)? / temperature)?;
    let labels = Tensor::arange(0u32, batch as u32, sim_embeddings.device())?;

    let by_row = candle_nn::loss::cross_entropy(&logits, &labels)?;
    let by_col = candle_nn::loss::cross_entropy(&logits.t()?.contiguous()?, &labels)?;
    Ok(((by_row + by_col)? / 2.0)?)
}

/// Mini-batch contrastive trainer
///
/// The trainer owns its shuffling random source and builds a fresh Adam
/// optimizer over the model's projector on every [`train`](Self::train)
/// call; no optimizer state survives between runs.
///
/// # Example
///
/// ```
/// use latentbridge_core::alignment::{AlignmentModel, ContrastiveTrainer, LatentSampler};
/// use latentbridge_core::config::{ModelConfig, SamplerConfig, TrainerConfig};
/// use rand::SeedableRng;
///
/// let sampler_config = SamplerConfig { n_samples: 32, latent_dim: 4, ..Default::default() };
/// let pair = LatentSampler::seeded(sampler_config, 0).sample().unwrap();
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
/// let mut model = AlignmentModel::new(4, &ModelConfig::default(), &mut rng).unwrap();
///
/// let config = TrainerConfig { epochs: 2, batch_size: 8, ..Default::default() };
/// let losses = ContrastiveTrainer::seeded(config, 2).train(&mut model, &pair).unwrap();
/// assert_eq!(losses.len(), 2);
/// ```
#[derive(Debug)]
pub struct ContrastiveTrainer {
    config: TrainerConfig,
    rng: StdRng,
}

impl ContrastiveTrainer {
    /// Create a trainer seeded from OS entropy
    pub fn new(config: TrainerConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a reproducible trainer
    pub fn seeded(config: TrainerConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    /// Create a trainer around an existing random source
    pub fn with_rng(config: TrainerConfig, rng: StdRng) -> Self {
        Self { config, rng }
    }

    /// Trainer configuration
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train `model` in place and return the per-epoch loss trace
    ///
    /// An empty population executes no epochs and yields an empty trace.
    /// A NaN or infinite batch loss aborts training before the optimizer
    /// applies it.
    pub fn train(&mut self, model: &mut AlignmentModel, pair: &LatentPair) -> Result<LossTrace> {
        self.config.validate()?;
        if pair.dim() != model.latent_dim() {
            return Err(AlignError::DimensionMismatch {
                expected: model.latent_dim(),
                actual: pair.dim(),
            });
        }

        let n = pair.len();
        let epochs = self.config.epochs;
        let batch_size = self.config.batch_size;
        let mut losses = LossTrace::with_capacity(epochs);
        if n == 0 || epochs == 0 {
            tracing::info!(n_samples = n, epochs, "nothing to train");
            return Ok(losses);
        }

        let mut optimizer = AdamW::new(
            model.vars(),
            ParamsAdamW {
                lr: self.config.learning_rate,
                weight_decay: 0.0,
                ..Default::default()
            },
        )?;
        let divisor = (n / batch_size).max(1) as f64;
        let device = pair.simulated().device().clone();
        let mut indices: Vec<u32> = (0..n as u32).collect();

        tracing::info!(
            n_samples = n,
            epochs,
            batch_size,
            learning_rate = self.config.learning_rate,
            params = model.num_params(),
            "starting contrastive alignment"
        );

        for epoch in 0..epochs {
            indices.shuffle(&mut self.rng);

            let mut epoch_loss = 0.0;
            for (batch, chunk) in indices.chunks(batch_size).enumerate() {
                let idx = Tensor::from_slice(chunk, chunk.len(), &device)?;
                let z_sim = pair.simulated().index_select(&idx, 0)?;
                let z_real = pair.real().index_select(&idx, 0)?;

                let loss = symmetric_info_nce(
                    &model.embed(&z_sim)?,
                    &model.embed(&z_real)?,
                    model.temperature(),
                )?;
                let value = f64::from(loss.to_scalar::<f32>()?);
                if !value.is_finite() {
                    return Err(AlignError::NonFiniteLoss {
                        epoch,
                        batch,
                        value,
                    });
                }

                optimizer.backward_step(&loss)?;
                epoch_loss += value;
            }

            let epoch_loss = epoch_loss / divisor;
            tracing::debug!(epoch, loss = epoch_loss, "epoch complete");
            losses.push(epoch_loss);
        }

        if let Some(last) = losses.last() {
            tracing::info!(epochs = losses.len(), final_loss = last, "training finished");
        }
        Ok(losses)
    }
}
