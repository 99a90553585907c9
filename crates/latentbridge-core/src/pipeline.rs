//! End-to-end alignment run
//!
//! Sampler → Trainer (mutating the model) → Gap evaluation → Story.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::alignment::gap::{gap_after, gap_before};
use crate::alignment::{AlignmentModel, ContrastiveTrainer, LatentSampler};
use crate::config::AlignmentConfig;
use crate::error::{AlignError, Result, ResultExt};
use crate::story::{AlignmentReport, RunParameters, Story};

/// Run one complete alignment and summarise it
///
/// One master random source, seeded from `config.seed` when present,
/// derives independent seeds for sampling, model initialisation and
/// shuffling, so a fixed seed reproduces the whole run.
///
/// # Example
///
/// ```
/// use latentbridge_core::{run_alignment, AlignmentConfig};
///
/// let config = AlignmentConfig::new()
///     .with_samples(64)
///     .with_latent_dim(8)
///     .with_proj_dim(8)
///     .with_epochs(2)
///     .with_batch_size(16)
///     .with_seed(42);
///
/// let report = run_alignment(&config).unwrap();
/// assert_eq!(report.parameters.epochs, 2);
/// assert_eq!(report.parameters.latents, 64);
/// ```
pub fn run_alignment(config: &AlignmentConfig) -> Result<AlignmentReport> {
    config.validate()?;

    let mut master = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let sampler_seed: u64 = master.gen();
    let model_seed: u64 = master.gen();
    let trainer_seed: u64 = master.gen();

    let pair = LatentSampler::seeded(config.sampler.clone(), sampler_seed)
        .sample()
        .context("sampling latent populations")?;

    let mut model = AlignmentModel::new(
        config.sampler.latent_dim,
        &config.model,
        &mut StdRng::seed_from_u64(model_seed),
    )?;

    let losses = ContrastiveTrainer::seeded(config.trainer.clone(), trainer_seed)
        .train(&mut model, &pair)
        .with_context(|| {
            format!(
                "contrastive training over {} pairs for {} epochs",
                pair.len(),
                config.trainer.epochs
            )
        })?;

    let before = finite_or_empty("gap_before", gap_before(&pair)?, pair.is_empty())?;
    let after = finite_or_empty("gap_after", gap_after(&model, &pair)?, pair.is_empty())?;

    let story = Story::build(before, after, &losses);
    if story.is_aligned() {
        tracing::info!(
            gap_before = before,
            gap_after = after,
            confidence = story.confidence(),
            "latent populations aligned"
        );
    } else {
        tracing::warn!(
            gap_before = before,
            gap_after = after,
            "alignment did not shrink the gap"
        );
    }

    Ok(AlignmentReport {
        story,
        parameters: RunParameters {
            temperature: model.temperature(),
            latents: pair.len(),
            proj_dim: model.proj_dim(),
            epochs: losses.len(),
        },
    })
}

/// NaN is the expected answer for an empty population and an error otherwise
fn finite_or_empty(metric: &'static str, value: f64, empty: bool) -> Result<f64> {
    if empty || value.is_finite() {
        Ok(value)
    } else {
        Err(AlignError::NonFiniteMetric { metric, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::AlignmentStatus;

    fn small() -> AlignmentConfig {
        AlignmentConfig::new()
            .with_samples(128)
            .with_latent_dim(16)
            .with_proj_dim(16)
            .with_epochs(4)
            .with_batch_size(32)
            .with_seed(7)
    }

    #[test]
    fn test_small_run_reports_parameters() {
        let report = run_alignment(&small()).unwrap();

        assert_eq!(report.parameters.latents, 128);
        assert_eq!(report.parameters.proj_dim, 16);
        assert_eq!(report.parameters.epochs, 4);
        assert_eq!(report.parameters.temperature, 0.07);
        assert_eq!(report.story.loss_trace_tail().len(), 4);
        assert!(report.story.gap_before() > 0.1);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let a = run_alignment(&small()).unwrap();
        let b = run_alignment(&small()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_population() {
        let report = run_alignment(&small().with_samples(0)).unwrap();

        assert_eq!(report.parameters.epochs, 0);
        assert_eq!(report.parameters.latents, 0);
        assert!(report.story.gap_before().is_nan());
        assert!(report.story.gap_after().is_nan());
        assert!(report.story.min_loss().is_none());
        assert!(report.story.latest_loss().is_none());
        assert_eq!(report.story.status(), AlignmentStatus::Calibrating);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let err = run_alignment(&small().with_batch_size(0)).unwrap_err();
        assert!(matches!(err, AlignError::InvalidConfig(_)));
    }

    #[test]
    fn test_overflowing_latents_fail_with_training_context() {
        let mut config = small();
        config.sampler.sim_noise = 1e39;

        let err = run_alignment(&config).unwrap_err();

        assert!(err.is_numeric_degeneracy());
        assert!(matches!(err, AlignError::WithContext { .. }));
        assert!(err
            .to_string()
            .contains("contrastive training over 128 pairs for 4 epochs"));
    }

    #[test]
    fn test_non_finite_gap_is_error() {
        let err = finite_or_empty("gap_after", f64::NAN, false).unwrap_err();
        assert!(matches!(
            err,
            AlignError::NonFiniteMetric {
                metric: "gap_after",
                ..
            }
        ));
        assert!(finite_or_empty("gap_after", f64::NAN, true).unwrap().is_nan());
    }
}
