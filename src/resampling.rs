//! Weight normalization and inverse-CDF (multinomial) resampling.

use nalgebra::{DMatrix, DVector};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::utils::warn_once;
use crate::{Error, Population, Result, STATE_DIM};

/// What to do when particle scores cannot be normalized
/// (their sum is zero, negative or not finite).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateWeightPolicy {
    /// Reset to uniform weights `1 / N` and keep tracking.
    #[default]
    Uniform,
    /// Abort with [`Error::DegenerateWeights`].
    Fail,
}

/// Normalize raw scores into a weight vector summing to 1.
///
/// # Errors
/// * [`Error::InvalidDistribution`] if `scores` is empty
/// * [`Error::DegenerateWeights`] if the scores sum to zero (or a non-finite
///   value) and `policy` is [`DegenerateWeightPolicy::Fail`]
pub fn normalize_weights(
    scores: &DVector<f64>,
    policy: DegenerateWeightPolicy,
) -> Result<DVector<f64>> {
    let n = scores.len();
    if n == 0 {
        return Err(Error::InvalidDistribution("no scores to normalize".to_string()));
    }

    let total = scores.sum();
    if total > 0.0 && total.is_finite() {
        return Ok(scores / total);
    }

    match policy {
        DegenerateWeightPolicy::Uniform => {
            warn_once("particle scores sum to zero or overflow; resetting to uniform weights");
            Ok(DVector::from_element(n, 1.0 / n as f64))
        }
        DegenerateWeightPolicy::Fail => Err(Error::DegenerateWeights { n_particles: n }),
    }
}

/// Running cumulative sum of `weights`.
pub fn cumulative_distribution(weights: &DVector<f64>) -> DVector<f64> {
    let mut acc = 0.0;
    weights.map(|w| {
        acc += w;
        acc
    })
}

/// Effective sample size `1 / sum(w_i^2)`; 0 for an all-zero vector.
pub fn effective_sample_size(weights: &DVector<f64>) -> f64 {
    let sum_sq = weights.norm_squared();
    if sum_sq > 0.0 {
        1.0 / sum_sq
    } else {
        0.0
    }
}

/// Smallest index `j` with `cdf[j] >= r`.
///
/// Falls back to the last index when rounding leaves `r` above the final CDF value.
pub fn select_index(cdf: &[f64], r: f64) -> usize {
    let j = cdf.partition_point(|&c| c < r);
    j.min(cdf.len().saturating_sub(1))
}

/// Draw a new population of the same size, each slot copied from particle `j`
/// with probability proportional to its CDF interval.
///
/// A CDF whose last value is not positive and finite carries no weight
/// information; slots are then drawn uniformly.
pub fn resample(
    population: &Population,
    cdf: &DVector<f64>,
    rng: &mut dyn RngCore,
) -> Result<Population> {
    let n = population.len();
    if cdf.len() != n {
        return Err(Error::InvalidDistribution(format!(
            "CDF length {} doesn't match {} particles",
            cdf.len(),
            n
        )));
    }
    if n == 0 {
        return Ok(population.clone());
    }

    let last = cdf[n - 1];
    let indices: Vec<usize> = if last > 0.0 && last.is_finite() {
        let cdf = cdf.as_slice();
        (0..n).map(|_| select_index(cdf, rng.random::<f64>())).collect()
    } else {
        warn_once("sampling distribution is degenerate; resampling uniformly");
        (0..n).map(|_| rng.random_range(0..n)).collect()
    };

    let source = population.matrix();
    let particles = DMatrix::from_fn(n, STATE_DIM, |i, j| source[(indices[i], j)]);
    Population::from_matrix(particles)
}
