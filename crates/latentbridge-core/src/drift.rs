//! Toy scalar latent drift
//!
//! A one-dimensional latent decays towards zero while a slow sinusoidal
//! gate pushes it around and Gaussian noise jitters it:
//!
//! ```text
//! z ← z − α·z + 0.1·sin(β·step) + σ·ε
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::{AlignError, Result};

/// Drift simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Mean-reversion rate
    pub alpha: f64,

    /// Gate frequency
    pub beta: f64,

    /// Number of updates
    pub steps: usize,

    /// Amplitude of the sinusoidal gate
    pub gate_gain: f64,

    /// Noise standard deviation
    pub noise_scale: f64,

    /// Starting latent value
    pub initial: f64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            beta: 0.05,
            steps: 100,
            gate_gain: 0.1,
            noise_scale: 0.02,
            initial: 1.0,
        }
    }
}

impl DriftConfig {
    /// Reject settings that would turn the trace into NaN or infinity
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("gate_gain", self.gate_gain),
            ("noise_scale", self.noise_scale),
            ("initial", self.initial),
        ] {
            if !value.is_finite() {
                return Err(AlignError::InvalidConfig(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        if self.noise_scale < 0.0 {
            return Err(AlignError::InvalidConfig(
                "noise_scale must be >= 0".into(),
            ));
        }
        Ok(())
    }
}

/// Fixed narrative attached to a drift trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftStory {
    /// Headline
    pub title: String,
    /// Fixed confidence
    pub confidence: f64,
    /// One-line reading of the trace
    pub note: String,
}

impl Default for DriftStory {
    fn default() -> Self {
        Self {
            title: "Toy latent drift".to_string(),
            confidence: 0.75,
            note: "Drift slows as gating balances noise, promising smoother decoder inputs."
                .to_string(),
        }
    }
}

/// `{trace, story}` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    /// Latent value after each step
    pub trace: Vec<f64>,
    /// Narrative
    pub story: DriftStory,
}

/// Scalar drift simulator owning its random source
#[derive(Debug)]
pub struct DriftSimulator {
    config: DriftConfig,
    rng: StdRng,
}

impl DriftSimulator {
    /// Create a simulator seeded from OS entropy
    pub fn new(config: DriftConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a reproducible simulator
    pub fn seeded(config: DriftConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Run `steps` updates and return every post-update value
    pub fn simulate(&mut self) -> Result<Vec<f64>> {
        self.config.validate()?;
        let DriftConfig {
            alpha,
            beta,
            steps,
            gate_gain,
            noise_scale,
            initial,
        } = self.config;

        let mut z = initial;
        let mut trace = Vec::with_capacity(steps);
        for step in 0..steps {
            let eps: f64 = self.rng.sample(StandardNormal);
            let gating = (beta * step as f64).sin();
            z += -alpha * z + gating * gate_gain + noise_scale * eps;
            trace.push(z);
        }
        tracing::debug!(steps, last = ?trace.last(), "simulated latent drift");
        Ok(trace)
    }

    /// Simulate and attach the fixed story
    pub fn report(&mut self) -> Result<DriftReport> {
        Ok(DriftReport {
            trace: self.simulate()?,
            story: DriftStory::default(),
        })
    }
}
