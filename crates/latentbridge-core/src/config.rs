//! Alignment run configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AlignError, Result};

/// Main configuration for one alignment run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Synthetic population settings
    pub sampler: SamplerConfig,

    /// Projector settings
    pub model: ModelConfig,

    /// Optimisation settings
    pub trainer: TrainerConfig,

    /// Master seed; `None` draws one from OS entropy
    pub seed: Option<u64>,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            sampler: SamplerConfig::default(),
            model: ModelConfig::default(),
            trainer: TrainerConfig {
                epochs: 240,
                ..TrainerConfig::default()
            },
            seed: None,
        }
    }
}

impl AlignmentConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the population size
    pub fn with_samples(mut self, n_samples: usize) -> Self {
        self.sampler.n_samples = n_samples;
        self
    }

    /// Set the latent dimension
    pub fn with_latent_dim(mut self, latent_dim: usize) -> Self {
        self.sampler.latent_dim = latent_dim;
        self
    }

    /// Set the drift magnitude of the last dimension
    pub fn with_shift_strength(mut self, shift_strength: f64) -> Self {
        self.sampler.shift_strength = shift_strength;
        self
    }

    /// Set the projector hidden width
    pub fn with_proj_dim(mut self, proj_dim: usize) -> Self {
        self.model.proj_dim = proj_dim;
        self
    }

    /// Set the similarity temperature
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.model.temperature = temperature;
        self
    }

    /// Set the number of epochs
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.trainer.epochs = epochs;
        self
    }

    /// Set the learning rate
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.trainer.learning_rate = learning_rate;
        self
    }

    /// Set the mini-batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.trainer.batch_size = batch_size;
        self
    }

    /// Fix the master seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every precondition of a run
    pub fn validate(&self) -> Result<()> {
        self.sampler.validate()?;
        self.model.validate()?;
        self.trainer.validate()
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Latent sampler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Number of paired samples N
    pub n_samples: usize,

    /// Latent dimension D
    pub latent_dim: usize,

    /// Drift applied to the last dimension; earlier dimensions ramp up to it
    pub shift_strength: f64,

    /// Noise scale of the simulated population
    pub sim_noise: f64,

    /// Noise scale of the real population
    pub real_noise: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            n_samples: 4096,
            latent_dim: 64,
            shift_strength: 0.3,
            sim_noise: 0.08,
            real_noise: 0.04,
        }
    }
}

impl SamplerConfig {
    /// Check sampler preconditions
    pub fn validate(&self) -> Result<()> {
        if self.latent_dim == 0 {
            return Err(AlignError::InvalidConfig("latent_dim must be > 0".into()));
        }
        for (name, value) in [
            ("shift_strength", self.shift_strength),
            ("sim_noise", self.sim_noise),
            ("real_noise", self.real_noise),
        ] {
            if !value.is_finite() {
                return Err(AlignError::InvalidConfig(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        if self.sim_noise < 0.0 || self.real_noise < 0.0 {
            return Err(AlignError::InvalidConfig(
                "noise scales must be >= 0".into(),
            ));
        }
        Ok(())
    }
}

/// Projector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Hidden width of the two-layer projector
    pub proj_dim: usize,

    /// Fixed similarity temperature
    pub temperature: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            proj_dim: 64,
            temperature: 0.07,
        }
    }
}

impl ModelConfig {
    /// Check model preconditions
    pub fn validate(&self) -> Result<()> {
        if self.proj_dim == 0 {
            return Err(AlignError::InvalidConfig("proj_dim must be > 0".into()));
        }
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(AlignError::InvalidConfig(format!(
                "temperature must be a positive finite number, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Contrastive trainer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Passes over the population; zero leaves the model untouched
    pub epochs: usize,

    /// Adam step size
    pub learning_rate: f64,

    /// Mini-batch size
    pub batch_size: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs: 200,
            learning_rate: 1e-3,
            batch_size: 256,
        }
    }
}

impl TrainerConfig {
    /// Check trainer preconditions
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(AlignError::InvalidConfig("batch_size must be > 0".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(AlignError::InvalidConfig(format!(
                "learning_rate must be a positive finite number, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_run() {
        let config = AlignmentConfig::default();
        assert_eq!(config.sampler.n_samples, 4096);
        assert_eq!(config.sampler.latent_dim, 64);
        assert_eq!(config.sampler.shift_strength, 0.3);
        assert_eq!(config.model.proj_dim, 64);
        assert_eq!(config.model.temperature, 0.07);
        assert_eq!(config.trainer.epochs, 240);
        assert_eq!(config.trainer.learning_rate, 1e-3);
        assert_eq!(config.trainer.batch_size, 256);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());

        assert_eq!(TrainerConfig::default().epochs, 200);
    }

    #[test]
    fn test_builder_methods() {
        let config = AlignmentConfig::new()
            .with_samples(10)
            .with_latent_dim(8)
            .with_shift_strength(0.5)
            .with_proj_dim(16)
            .with_temperature(0.1)
            .with_epochs(3)
            .with_learning_rate(5e-3)
            .with_batch_size(4)
            .with_seed(7);

        assert_eq!(config.sampler.n_samples, 10);
        assert_eq!(config.sampler.latent_dim, 8);
        assert_eq!(config.model.proj_dim, 16);
        assert_eq!(config.trainer.epochs, 3);
        assert_eq!(config.trainer.batch_size, 4);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_zero_epochs_is_valid() {
        assert!(AlignmentConfig::new().with_epochs(0).validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            AlignmentConfig::new().with_batch_size(0),
            AlignmentConfig::new().with_latent_dim(0),
            AlignmentConfig::new().with_proj_dim(0),
            AlignmentConfig::new().with_temperature(0.0),
            AlignmentConfig::new().with_temperature(f64::NAN),
            AlignmentConfig::new().with_learning_rate(-1e-3),
            AlignmentConfig::new().with_shift_strength(f64::INFINITY),
        ];

        for config in cases {
            let err = config.validate().unwrap_err();
            assert!(matches!(err, AlignError::InvalidConfig(_)), "{err}");
        }
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latentbridge.json");

        let config = AlignmentConfig::new().with_epochs(12).with_seed(99);
        config.to_file(&path).unwrap();

        let loaded = AlignmentConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AlignmentConfig =
            serde_json::from_str(r#"{ "trainer": { "epochs": 5 }, "seed": 3 }"#).unwrap();

        assert_eq!(config.trainer.epochs, 5);
        assert_eq!(config.trainer.batch_size, 256);
        assert_eq!(config.sampler.n_samples, 4096);
        assert_eq!(config.seed, Some(3));
    }
}
