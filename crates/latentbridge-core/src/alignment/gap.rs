//! Gap evaluator: mean paired Euclidean distance between populations

use super::model::AlignmentModel;
use super::sampler::{matrix_dims, LatentPair};
use crate::error::{AlignError, Result};
use candle_core::Tensor;

/// Mean over rows of `‖a[i] − b[i]‖₂`
///
/// Returns `NaN` for empty populations: a gap over zero pairs is not
/// computable and must not read as perfect alignment.
pub fn gap(a: &Tensor, b: &Tensor) -> Result<f64> {
    let a_shape = matrix_dims(a)?;
    let b_shape = matrix_dims(b)?;
    if a_shape != b_shape {
        return Err(AlignError::PopulationMismatch {
            simulated: a_shape,
            real: b_shape,
        });
    }
    if a_shape.0 == 0 {
        return Ok(f64::NAN);
    }

    let distances = (a - b)?.sqr()?.sum(1)?.sqrt()?;
    Ok(f64::from(distances.mean_all()?.to_scalar::<f32>()?))
}

/// Gap between the raw populations
pub fn gap_before(pair: &LatentPair) -> Result<f64> {
    gap(pair.simulated(), pair.real())
}

/// Gap between the populations' embeddings, computed without gradient tracking
pub fn gap_after(model: &AlignmentModel, pair: &LatentPair) -> Result<f64> {
    if pair.is_empty() {
        return Ok(f64::NAN);
    }
    let sim = model.embed_inference(pair.simulated())?;
    let real = model.embed_inference(pair.real())?;
    gap(&sim, &real)
}
