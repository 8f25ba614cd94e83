//! Constant-velocity motion model with per-field Gaussian process noise.
//!
//! Each particle drifts by its own velocity (`x += vx`, `y += vy`), then every
//! field receives independent zero-mean Gaussian noise and is truncated toward
//! zero to an integer pixel value. Truncation keeps the velocity noise, which is
//! centered on zero, free of a per-frame bias.

use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use super::traits::MotionModel;
use crate::state::field;
use crate::{Error, Population, Result, STATE_DIM};

/// Process noise magnitudes, expressed as standard deviations.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionNoise {
    /// Standard deviation for `x` and `y`.
    pub position_std: f64,
    /// Standard deviation for `half_width` and `half_height`.
    pub size_std: f64,
    /// Standard deviation for `vx` and `vy`.
    pub velocity_std: f64,
    /// Optional lower bound applied to half-extents after truncation.
    ///
    /// A fractional bound is rounded up to the next integer. `None` leaves
    /// extents unguarded, so they may become zero or negative.
    pub min_half_extent: Option<f64>,
}

impl MotionNoise {
    /// Noise from per-field variances.
    pub fn from_variances(position: f64, size: f64, velocity: f64) -> Self {
        Self::from_std_devs(position.sqrt(), size.sqrt(), velocity.sqrt())
    }

    /// Noise from per-field standard deviations.
    pub fn from_std_devs(position: f64, size: f64, velocity: f64) -> Self {
        Self {
            position_std: position,
            size_std: size,
            velocity_std: velocity,
            min_half_extent: None,
        }
    }

    /// No process noise: prediction reduces to drift plus truncation.
    pub fn zero() -> Self {
        Self::from_std_devs(0.0, 0.0, 0.0)
    }

    /// Clamp half-extents to at least `min` after every prediction.
    pub fn with_min_half_extent(mut self, min: f64) -> Self {
        self.min_half_extent = Some(min);
        self
    }

    /// Standard deviation for each state column, in [`field`] order.
    pub fn per_field_std(&self) -> [f64; STATE_DIM] {
        [
            self.position_std,
            self.position_std,
            self.size_std,
            self.size_std,
            self.velocity_std,
            self.velocity_std,
        ]
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("position_std", self.position_std),
            ("size_std", self.size_std),
            ("velocity_std", self.velocity_std),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        if let Some(min) = self.min_half_extent {
            if !min.is_finite() {
                return Err(Error::InvalidConfig(format!(
                    "min_half_extent must be finite, got {}",
                    min
                )));
            }
        }
        Ok(())
    }
}

impl Default for MotionNoise {
    /// Variance 2 for position, 1 for size and velocity.
    fn default() -> Self {
        Self::from_variances(2.0, 1.0, 1.0)
    }
}

/// Constant-velocity model: drift by velocity, add noise, truncate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstantVelocityModel {
    noise: MotionNoise,
}

impl ConstantVelocityModel {
    pub fn new(noise: MotionNoise) -> Self {
        Self { noise }
    }

    pub fn noise(&self) -> &MotionNoise {
        &self.noise
    }
}

impl MotionModel for ConstantVelocityModel {
    fn predict(&self, population: &Population, rng: &mut dyn RngCore) -> Population {
        let mut next = population.clone();
        let n = next.len();
        let particles = next.matrix_mut();

        // Drift uses the prior velocity, before velocity noise is applied.
        for i in 0..n {
            let (vx, vy) = (particles[(i, field::VX)], particles[(i, field::VY)]);
            particles[(i, field::X)] += vx;
            particles[(i, field::Y)] += vy;
        }

        // Noise is drawn field by field across the whole population.
        for (j, std) in self.noise.per_field_std().iter().enumerate() {
            if *std == 0.0 {
                continue;
            }
            for i in 0..n {
                let z: f64 = StandardNormal.sample(&mut *rng);
                particles[(i, j)] += std * z;
            }
        }

        particles.apply(|value| *value = value.trunc());

        if let Some(min) = self.noise.min_half_extent {
            let min = min.ceil();
            for i in 0..n {
                for j in [field::HALF_WIDTH, field::HALF_HEIGHT] {
                    if particles[(i, j)] < min {
                        particles[(i, j)] = min;
                    }
                }
            }
        }

        next
    }
}
