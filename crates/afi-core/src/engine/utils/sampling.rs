use rand::{distributions::WeightedIndex, prelude::*};
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("Input scores list is empty, cannot perform sampling")]
    EmptyScores,
    #[error("All weights underflowed to zero, nothing to sample from")]
    ZeroTotalWeight,
    #[error("Invalid temperature {0}. Temperature must be positive for Boltzmann sampling")]
    InvalidTemperature(f64),
    #[error("Failed to create weighted distribution: {source}")]
    DistributionError {
        #[from]
        source: rand::distributions::WeightedError,
    },
}

/// Draws an index with probability proportional to `exp(-(s - s_min) / temperature)`,
/// so lower scores are favoured.
#[instrument(level = "trace", skip_all, fields(temperature))]
pub fn boltzmann_select(
    scores: &[f64],
    temperature: f64,
    rng: &mut impl Rng,
) -> Result<usize, SamplingError> {
    if scores.is_empty() {
        return Err(SamplingError::EmptyScores);
    }
    if !(temperature > 0.0) {
        return Err(SamplingError::InvalidTemperature(temperature));
    }

    let min_score = scores.iter().copied().fold(f64::INFINITY, f64::min);

    let weights: Vec<f64> = scores
        .iter()
        .map(|&s| (-(s - min_score) / temperature).exp())
        .collect();

    let total_weight: f64 = weights.iter().sum();
    if !(total_weight > f64::EPSILON) {
        tracing::warn!(
            "Total Boltzmann weight is degenerate ({}). Falling back to the lowest score.",
            total_weight
        );
        return scores
            .iter()
            .position(|&s| s == min_score)
            .ok_or(SamplingError::ZeroTotalWeight);
    }

    let dist = WeightedIndex::new(&weights)?;
    Ok(dist.sample(rng))
}
