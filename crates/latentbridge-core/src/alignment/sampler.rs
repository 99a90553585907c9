//! Latent sampler for paired, distribution-shifted populations
//!
//! This module builds the two populations an alignment run works on:
//! a noisy "simulated" population and a cleaner, drifted "real" one,
//! paired row by row through a shared base draw.

use crate::config::SamplerConfig;
use crate::error::{AlignError, Result};
use candle_core::{Device, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Two index-aligned latent populations of identical shape `[N, D]`
///
/// Row `i` of `simulated` and row `i` of `real` share the same base
/// vector. The pairing is fixed once the value exists; shuffling during
/// training only ever permutes both populations with the same indices.
#[derive(Debug, Clone)]
pub struct LatentPair {
    simulated: Tensor,
    real: Tensor,
}

impl LatentPair {
    /// Pair two populations, failing if their shapes disagree
    pub fn new(simulated: Tensor, real: Tensor) -> Result<Self> {
        let sim_shape = matrix_dims(&simulated)?;
        let real_shape = matrix_dims(&real)?;
        if sim_shape != real_shape {
            return Err(AlignError::PopulationMismatch {
                simulated: sim_shape,
                real: real_shape,
            });
        }
        Ok(Self { simulated, real })
    }

    /// The simulated population
    pub fn simulated(&self) -> &Tensor {
        &self.simulated
    }

    /// The real population
    pub fn real(&self) -> &Tensor {
        &self.real
    }

    /// Number of paired samples N
    pub fn len(&self) -> usize {
        self.simulated.dims()[0]
    }

    /// True when N = 0
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Latent dimension D
    pub fn dim(&self) -> usize {
        self.simulated.dims()[1]
    }
}

/// `(rows, cols)` of a rank-2 tensor
pub(crate) fn matrix_dims(t: &Tensor) -> Result<(usize, usize)> {
    match t.dims() {
        [rows, cols] => Ok((*rows, *cols)),
        other => Err(AlignError::RankMismatch {
            expected: 2,
            actual: other.len(),
        }),
    }
}

/// Drift vector of length `dim`, linearly spaced from 0 to `shift_strength`
///
/// A single dimension gets no drift, matching a one-point linspace.
pub fn drift_profile(dim: usize, shift_strength: f64) -> Vec<f64> {
    match dim {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..dim)
            .map(|j| shift_strength * j as f64 / (dim - 1) as f64)
            .collect(),
    }
}

/// Sampler producing fresh paired populations on each call
///
/// The sampler owns its random source; every call to [`sample`](Self::sample)
/// consumes new randomness, so two calls never return the same draw.
///
/// # Example
///
/// ```
/// use latentbridge_core::alignment::sampler::LatentSampler;
/// use latentbridge_core::config::SamplerConfig;
///
/// let config = SamplerConfig { n_samples: 32, latent_dim: 8, ..Default::default() };
/// let mut sampler = LatentSampler::seeded(config, 7);
/// let pair = sampler.sample().unwrap();
///
/// assert_eq!(pair.len(), 32);
/// assert_eq!(pair.dim(), 8);
/// ```
#[derive(Debug)]
pub struct LatentSampler {
    config: SamplerConfig,
    rng: StdRng,
    device: Device,
}

impl LatentSampler {
    /// Create a sampler seeded from OS entropy
    pub fn new(config: SamplerConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a reproducible sampler
    pub fn seeded(config: SamplerConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    /// Create a sampler around an existing random source
    pub fn with_rng(config: SamplerConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            device: Device::Cpu,
        }
    }

    /// Sampler configuration
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Draw a new `(simulated, real)` pair
    ///
    /// `simulated = base + sim_noise * eps_s` and
    /// `real = base + drift + real_noise * eps_r`, with `base`, `eps_s` and
    /// `eps_r` independent standard normal matrices.
    pub fn sample(&mut self) -> Result<LatentPair> {
        self.config.validate()?;
        let n = self.config.n_samples;
        let d = self.config.latent_dim;
        let drift = drift_profile(d, self.config.shift_strength);

        let mut simulated = Vec::with_capacity(n * d);
        let mut real = Vec::with_capacity(n * d);
        for _row in 0..n {
            for shift in &drift {
                let base: f64 = self.rng.sample(StandardNormal);
                let eps_sim: f64 = self.rng.sample(StandardNormal);
                let eps_real: f64 = self.rng.sample(StandardNormal);
                simulated.push((base + self.config.sim_noise * eps_sim) as f32);
                real.push((base + shift + self.config.real_noise * eps_real) as f32);
            }
        }

        let simulated = Tensor::from_vec(simulated, (n, d), &self.device)?;
        let real = Tensor::from_vec(real, (n, d), &self.device)?;
        tracing::debug!(n_samples = n, latent_dim = d, "sampled latent populations");

        LatentPair::new(simulated, real)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn small_config(n: usize, d: usize) -> SamplerConfig {
        SamplerConfig {
            n_samples: n,
            latent_dim: d,
            ..Default::default()
        }
    }

    #[test]
    fn test_drift_profile_is_linear_ramp() {
        let drift = drift_profile(4, 0.3);
        assert_eq!(drift.len(), 4);
        assert_eq!(drift[0], 0.0);
        assert!((drift[1] - 0.1).abs() < 1e-12);
        assert!((drift[3] - 0.3).abs() < 1e-12);
        assert!(drift.windows(2).all(|w| w[0] <= w[1]));

        assert_eq!(drift_profile(1, 0.3), vec![0.0]);
        assert!(drift_profile(0, 0.3).is_empty());
    }

    #[test]
    fn test_mean_difference_follows_drift() {
        let mut sampler = LatentSampler::seeded(small_config(2048, 4), 11);
        let pair = sampler.sample().unwrap();

        let diff = (pair.real() - pair.simulated()).unwrap();
        let means: Vec<f32> = diff.mean(0).unwrap().to_vec1().unwrap();
        let drift = drift_profile(4, 0.3);

        for (mean, shift) in means.iter().zip(&drift) {
            assert!((*mean as f64 - shift).abs() < 0.02, "{mean} vs {shift}");
        }
    }

    #[test]
    fn test_each_call_draws_fresh_samples() {
        let mut sampler = LatentSampler::seeded(small_config(8, 4), 1);
        let first: Vec<Vec<f32>> = sampler.sample().unwrap().simulated().to_vec2().unwrap();
        let second: Vec<Vec<f32>> = sampler.sample().unwrap().simulated().to_vec2().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_same_seed_same_draw() {
        let a = LatentSampler::seeded(small_config(8, 4), 5).sample().unwrap();
        let b = LatentSampler::seeded(small_config(8, 4), 5).sample().unwrap();
        assert_eq!(
            a.real().to_vec2::<f32>().unwrap(),
            b.real().to_vec2::<f32>().unwrap()
        );
    }

    #[test]
    fn test_zero_samples_gives_empty_populations() {
        let pair = LatentSampler::seeded(small_config(0, 16), 0).sample().unwrap();
        assert!(pair.is_empty());
        assert_eq!(pair.dim(), 16);
        assert_eq!(pair.real().dims(), &[0, 16]);
    }

    #[test]
    fn test_pair_rejects_mismatched_shapes() {
        let a = Tensor::zeros((4, 3), candle_core::DType::F32, &Device::Cpu).unwrap();
        let b = Tensor::zeros((5, 3), candle_core::DType::F32, &Device::Cpu).unwrap();
        let err = LatentPair::new(a.clone(), b).unwrap_err();
        assert!(matches!(
            err,
            AlignError::PopulationMismatch {
                simulated: (4, 3),
                real: (5, 3)
            }
        ));

        let flat = Tensor::zeros(12, candle_core::DType::F32, &Device::Cpu).unwrap();
        let err = LatentPair::new(a, flat).unwrap_err();
        assert!(matches!(err, AlignError::RankMismatch { expected: 2, actual: 1 }));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_shapes_match_request(n in 0usize..40, d in 1usize..24, seed in any::<u64>()) {
            let pair = LatentSampler::seeded(small_config(n, d), seed).sample().unwrap();
            prop_assert_eq!(pair.simulated().dims(), &[n, d]);
            prop_assert_eq!(pair.real().dims(), &[n, d]);
            prop_assert_eq!(pair.len(), n);
            prop_assert_eq!(pair.dim(), d);
        }
    }
}
