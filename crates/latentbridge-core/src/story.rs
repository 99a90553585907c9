//! Alignment story: the end-of-run verdict and its JSON report
//!
//! A [`Story`] is derived once from the gap measurements and the loss
//! trace and never changes afterwards. [`AlignmentReport`] pairs it with
//! the [`RunParameters`] that produced it and is what gets persisted.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Lowest confidence a story can report
pub const MIN_CONFIDENCE: f64 = 0.35;

/// Highest confidence a story can report
pub const MAX_CONFIDENCE: f64 = 0.9;

/// Number of trailing losses kept in the story
pub const LOSS_TAIL_LEN: usize = 10;

const ALIGNED_NOTE: &str =
    "Latent contrastive alignment dramatically shrinks the simulator/experiment gap.";
const CALIBRATING_NOTE: &str =
    "Contrastive projector is still calibrating; consider more epochs or temperature tweaks.";

/// Verdict of an alignment run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignmentStatus {
    /// The gap shrank
    Aligned,

    /// The gap did not shrink, or could not be measured
    Calibrating,
}

impl AlignmentStatus {
    /// Human-readable note for this verdict
    pub fn note(&self) -> &'static str {
        match self {
            Self::Aligned => ALIGNED_NOTE,
            Self::Calibrating => CALIBRATING_NOTE,
        }
    }
}

/// Map `gap_after` to a bounded confidence
///
/// `clamp(0.95 - gap_after, 0.35, 0.9)`. An unmeasurable (NaN) gap gets the
/// floor value.
pub fn confidence_from_gap(gap_after: f64) -> f64 {
    if gap_after.is_nan() {
        return MIN_CONFIDENCE;
    }
    (0.95 - gap_after).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

/// Immutable summary of one alignment run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    status: AlignmentStatus,
    #[serde(with = "nan_as_null")]
    gap_before: f64,
    #[serde(with = "nan_as_null")]
    gap_after: f64,
    confidence: f64,
    note: String,
    min_loss: Option<f64>,
    latest_loss: Option<f64>,
    #[serde(rename = "loss_trace")]
    loss_trace_tail: Vec<f64>,
}

impl Story {
    /// Build the story from the run's gaps and loss trace
    ///
    /// # Example
    ///
    /// ```
    /// use latentbridge_core::story::{AlignmentStatus, Story};
    ///
    /// let story = Story::build(1.5, 0.2, &[2.0, 1.0, 1.2]);
    /// assert_eq!(story.status(), AlignmentStatus::Aligned);
    /// assert_eq!(story.min_loss(), Some(1.0));
    /// assert_eq!(story.latest_loss(), Some(1.2));
    /// assert!((story.confidence() - 0.75).abs() < 1e-12);
    /// ```
    pub fn build(gap_before: f64, gap_after: f64, losses: &[f64]) -> Self {
        // NaN on either side compares false and lands on Calibrating
        let status = if gap_after < gap_before {
            AlignmentStatus::Aligned
        } else {
            AlignmentStatus::Calibrating
        };

        let min_loss = losses.iter().copied().reduce(f64::min);
        let latest_loss = losses.last().copied();
        let tail_start = losses.len().saturating_sub(LOSS_TAIL_LEN);

        Self {
            status,
            gap_before,
            gap_after,
            confidence: confidence_from_gap(gap_after),
            note: status.note().to_string(),
            min_loss,
            latest_loss,
            loss_trace_tail: losses[tail_start..].to_vec(),
        }
    }

    /// Verdict
    pub fn status(&self) -> AlignmentStatus {
        self.status
    }

    /// Gap between raw populations; NaN when not computable
    pub fn gap_before(&self) -> f64 {
        self.gap_before
    }

    /// Gap between embeddings; NaN when not computable
    pub fn gap_after(&self) -> f64 {
        self.gap_after
    }

    /// Confidence in [0.35, 0.9]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Note matching the verdict
    pub fn note(&self) -> &str {
        &self.note
    }

    /// Smallest epoch loss, if any epoch ran
    pub fn min_loss(&self) -> Option<f64> {
        self.min_loss
    }

    /// Last epoch loss, if any epoch ran
    pub fn latest_loss(&self) -> Option<f64> {
        self.latest_loss
    }

    /// Up to the last ten epoch losses
    pub fn loss_trace_tail(&self) -> &[f64] {
        &self.loss_trace_tail
    }

    /// True when the verdict is [`AlignmentStatus::Aligned`]
    pub fn is_aligned(&self) -> bool {
        self.status == AlignmentStatus::Aligned
    }
}

/// Unmeasurable gaps travel as JSON `null` and come back as NaN
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

/// Parameters a story was produced with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    /// Similarity temperature of the trained model
    pub temperature: f64,

    /// Population size N
    pub latents: usize,

    /// Projector hidden width
    pub proj_dim: usize,

    /// Epochs actually executed
    pub epochs: usize,
}

/// `{story, parameters}` document persisted after a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentReport {
    /// The verdict
    pub story: Story,

    /// What produced it
    pub parameters: RunParameters,
}

impl AlignmentReport {
    /// Pretty-printed JSON document
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write `<dir>/<name>.json`, creating `dir` when absent
    pub fn write_to(&self, dir: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{name}.json"));
        std::fs::write(&path, self.to_json()?)?;
        tracing::debug!(path = %path.display(), "stored alignment report");
        Ok(path)
    }

    /// Split into story and parameters
    pub fn into_parts(self) -> (Story, RunParameters) {
        (self.story, self.parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn losses(n: usize) -> Vec<f64> {
        (0..n).map(|i| 5.0 - i as f64 * 0.01).collect()
    }

    #[test]
    fn test_aligned_story() {
        let story = Story::build(1.56, 0.12, &losses(240));

        assert_eq!(story.status(), AlignmentStatus::Aligned);
        assert!(story.is_aligned());
        assert_eq!(story.note(), ALIGNED_NOTE);
        assert!((story.confidence() - 0.83).abs() < 1e-12);
        assert_eq!(story.loss_trace_tail().len(), LOSS_TAIL_LEN);
        assert_eq!(story.latest_loss(), Some(5.0 - 239.0 * 0.01));
        assert_eq!(story.min_loss(), story.latest_loss());
        assert_eq!(story.loss_trace_tail()[9], story.latest_loss().unwrap());
    }

    #[test]
    fn test_calibrating_story() {
        let story = Story::build(0.5, 0.5, &[1.0, 0.7, 0.9]);

        assert_eq!(story.status(), AlignmentStatus::Calibrating);
        assert_eq!(story.note(), CALIBRATING_NOTE);
        assert_eq!(story.min_loss(), Some(0.7));
        assert_eq!(story.latest_loss(), Some(0.9));
        assert_eq!(story.loss_trace_tail(), &[1.0, 0.7, 0.9]);
    }

    #[test]
    fn test_confidence_boundaries() {
        assert_eq!(confidence_from_gap(2.0), MIN_CONFIDENCE);
        assert_eq!(confidence_from_gap(-1.0), MAX_CONFIDENCE);
        assert_eq!(confidence_from_gap(f64::NAN), MIN_CONFIDENCE);
        assert_eq!(confidence_from_gap(f64::INFINITY), MIN_CONFIDENCE);
        assert!((confidence_from_gap(0.35) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_empty_run_story() {
        let story = Story::build(f64::NAN, f64::NAN, &[]);

        assert_eq!(story.status(), AlignmentStatus::Calibrating);
        assert!(story.min_loss().is_none());
        assert!(story.latest_loss().is_none());
        assert!(story.loss_trace_tail().is_empty());
        assert!(story.gap_before().is_nan());
        assert!(story.gap_after().is_nan());
        assert_eq!(story.confidence(), MIN_CONFIDENCE);
    }

    #[test]
    fn test_report_json_shape() {
        let report = AlignmentReport {
            story: Story::build(1.5, 0.3, &[0.9, 0.8]),
            parameters: RunParameters {
                temperature: 0.07,
                latents: 4096,
                proj_dim: 64,
                epochs: 2,
            },
        };

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["story"]["status"], "Aligned");
        assert_eq!(value["story"]["loss_trace"].as_array().unwrap().len(), 2);
        assert_eq!(value["story"]["min_loss"], 0.8);
        assert_eq!(value["parameters"]["latents"], 4096);
        assert_eq!(value["parameters"]["epochs"], 2);
    }

    #[test]
    fn test_nan_gaps_serialize_as_null() {
        let report = AlignmentReport {
            story: Story::build(f64::NAN, f64::NAN, &[]),
            parameters: RunParameters {
                temperature: 0.07,
                latents: 0,
                proj_dim: 64,
                epochs: 0,
            },
        };

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert!(value["story"]["gap_before"].is_null());
        assert!(value["story"]["gap_after"].is_null());
        assert!(value["story"]["min_loss"].is_null());
        assert!(value["story"]["latest_loss"].is_null());
        assert_eq!(value["story"]["status"], "Calibrating");
    }

    #[test]
    fn test_unmeasured_gaps_reload_as_nan() {
        let report = AlignmentReport {
            story: Story::build(f64::NAN, f64::NAN, &[]),
            parameters: RunParameters {
                temperature: 0.07,
                latents: 0,
                proj_dim: 64,
                epochs: 0,
            },
        };

        let loaded: AlignmentReport = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert!(loaded.story.gap_before().is_nan());
        assert!(loaded.story.gap_after().is_nan());
        assert_eq!(loaded.story.status(), AlignmentStatus::Calibrating);
        assert_eq!(loaded.story.confidence(), MIN_CONFIDENCE);
        assert!(loaded.story.min_loss().is_none());
        assert_eq!(loaded.parameters, report.parameters);
    }

    #[test]
    fn test_write_creates_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("artifacts");
        let report = AlignmentReport {
            story: Story::build(1.0, 0.5, &[1.0]),
            parameters: RunParameters {
                temperature: 0.07,
                latents: 1,
                proj_dim: 8,
                epochs: 1,
            },
        };

        let path = report.write_to(&dir, "contrastive_story").unwrap();

        assert_eq!(path, dir.join("contrastive_story.json"));
        let loaded: AlignmentReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, report);

        let (story, parameters) = loaded.into_parts();
        assert!(story.is_aligned());
        assert_eq!(parameters.proj_dim, 8);
    }

    proptest! {
        #[test]
        fn prop_confidence_always_bounded(gap_after in proptest::num::f64::ANY) {
            let c = confidence_from_gap(gap_after);
            prop_assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&c));
        }

        #[test]
        fn prop_tail_is_suffix(trace in proptest::collection::vec(0.0f64..10.0, 0..40)) {
            let story = Story::build(1.0, 0.5, &trace);
            let tail = story.loss_trace_tail();
            prop_assert_eq!(tail.len(), trace.len().min(LOSS_TAIL_LEN));
            prop_assert!(trace.ends_with(tail));
        }
    }
}
