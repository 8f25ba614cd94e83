//! Main particle tracker implementation.

use std::fs;
use std::path::Path;

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::histogram::{compute_descriptor, Descriptor};
use crate::likelihood::score_population;
use crate::motion::{ConstantVelocityModel, MotionModel, MotionNoise};
use crate::resampling::{
    cumulative_distribution, effective_sample_size, normalize_weights, resample,
    DegenerateWeightPolicy,
};
use crate::{Error, Frame, Population, Result, State};

/// Configuration for the tracker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Number of particles N, fixed for the whole run.
    pub num_particles: usize,

    /// Process noise of the constant-velocity motion model.
    pub motion_noise: MotionNoise,

    /// Fallback when every particle score is zero or the sum overflows.
    pub degenerate_policy: DegenerateWeightPolicy,

    /// Seed for the random source. `None` seeds from the operating system.
    pub seed: Option<u64>,

    /// Score particles on the rayon thread pool.
    pub parallel: bool,

    /// Report every `report_every`-th frame (1-based frame index).
    pub report_every: usize,
}

impl TrackerConfig {
    /// Create a configuration with `num_particles` particles and default settings.
    pub fn new(num_particles: usize) -> Self {
        Self {
            num_particles,
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to read config '{}': {}", path.as_ref().display(), e),
            ))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_particles == 0 {
            return Err(Error::InvalidConfig(
                "num_particles must be at least 1".to_string(),
            ));
        }
        if self.report_every == 0 {
            return Err(Error::InvalidConfig(
                "report_every must be at least 1".to_string(),
            ));
        }
        self.motion_noise.validate()
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            num_particles: 100,
            motion_noise: MotionNoise::default(),
            degenerate_policy: DegenerateWeightPolicy::default(),
            seed: None,
            parallel: true,
            report_every: 10,
        }
    }
}

/// Which cycle produced the tracker's current population.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerPhase {
    /// Population comes from the initial state and the first frame.
    Bootstrap,
    /// Population comes from at least one resample/predict/score cycle.
    Steady,
}

/// Point estimate of the target box: `[x, y, half_width, half_height]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub x: f64,
    pub y: f64,
    pub half_width: f64,
    pub half_height: f64,
}

impl Estimate {
    pub fn from_state(state: &State) -> Self {
        Self {
            x: state.x,
            y: state.y,
            half_width: state.half_width,
            half_height: state.half_height,
        }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.x, self.y, self.half_width, self.half_height]
    }
}

/// Single-target particle filter tracker.
///
/// Holds the population, its normalized weights and the sampling CDF, all of
/// which are replaced together at the end of every successful cycle. The
/// target descriptor is computed once at bootstrap and never updated.
pub struct ParticleTracker {
    config: TrackerConfig,
    motion: Box<dyn MotionModel>,
    rng: StdRng,
    target: Descriptor,
    population: Population,
    weights: DVector<f64>,
    cdf: DVector<f64>,
    phase: TrackerPhase,
    frame_index: usize,
}

impl ParticleTracker {
    /// Initialize from the first frame with the constant-velocity motion model.
    ///
    /// # Arguments
    /// * `config` - Tracker configuration (validated here)
    /// * `first_frame` - Frame the target descriptor is computed from
    /// * `initial_state` - Target box and velocity on the first frame
    pub fn bootstrap(config: TrackerConfig, first_frame: &Frame, initial_state: State) -> Result<Self> {
        let motion = Box::new(ConstantVelocityModel::new(config.motion_noise));
        Self::bootstrap_with_model(config, motion, first_frame, initial_state)
    }

    /// Initialize with a custom motion model.
    pub fn bootstrap_with_model(
        config: TrackerConfig,
        motion: Box<dyn MotionModel>,
        first_frame: &Frame,
        initial_state: State,
    ) -> Result<Self> {
        config.validate()?;

        if !initial_state.is_finite() {
            return Err(Error::InvalidState(format!(
                "initial state must be finite, got {:?}",
                initial_state
            )));
        }
        if first_frame.width() == 0 || first_frame.height() == 0 {
            return Err(Error::InvalidFrame("first frame has no pixels".to_string()));
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        // The descriptor uses the un-perturbed initial state.
        let target = compute_descriptor(first_frame, &initial_state);
        if target.sum() == 0.0 {
            log::warn!(
                "initial state {:?} does not overlap the {}x{} frame; target descriptor is empty",
                initial_state,
                first_frame.width(),
                first_frame.height()
            );
        }

        let replicated = Population::replicate(&initial_state, config.num_particles);
        let population = motion.predict(&replicated, &mut rng);

        let scores = score_population(first_frame, &population, &target, config.parallel);
        let weights = normalize_weights(&scores, config.degenerate_policy)?;
        let cdf = cumulative_distribution(&weights);

        log::info!(
            "bootstrapped {} particles at ({}, {}) size {}x{}",
            config.num_particles,
            initial_state.x,
            initial_state.y,
            initial_state.half_width,
            initial_state.half_height
        );

        Ok(Self {
            config,
            motion,
            rng,
            target,
            population,
            weights,
            cdf,
            phase: TrackerPhase::Bootstrap,
            frame_index: 1,
        })
    }

    /// Run one steady-state cycle on the next frame:
    /// resample, predict, score, normalize, rebuild the CDF.
    ///
    /// On error the tracker keeps the population, weights and CDF of the
    /// previous frame.
    pub fn step(&mut self, frame: &Frame) -> Result<()> {
        let resampled = resample(&self.population, &self.cdf, &mut self.rng)?;
        let population = self.motion.predict(&resampled, &mut self.rng);

        let scores = score_population(frame, &population, &self.target, self.config.parallel);
        let weights = normalize_weights(&scores, self.config.degenerate_policy)?;
        let cdf = cumulative_distribution(&weights);

        self.population = population;
        self.weights = weights;
        self.cdf = cdf;
        self.phase = TrackerPhase::Steady;
        self.frame_index += 1;

        log::debug!(
            "frame {}: ess={:.1} max_weight={:.4}",
            self.frame_index,
            effective_sample_size(&self.weights),
            self.weights.max()
        );

        Ok(())
    }

    /// Weighted average of the box fields over the population.
    pub fn mean_estimate(&self) -> Result<Estimate> {
        self.population
            .weighted_mean(&self.weights)
            .map(|state| Estimate::from_state(&state))
            .ok_or_else(|| Error::InvalidDistribution("weights do not sum to a positive value".to_string()))
    }

    /// Box fields of the particle with the largest weight (first one on ties).
    pub fn map_estimate(&self) -> Estimate {
        Estimate::from_state(&self.population.state(self.map_index()))
    }

    /// Index of the particle with the largest weight.
    pub fn map_index(&self) -> usize {
        let mut best = 0;
        for (i, w) in self.weights.iter().enumerate() {
            if *w > self.weights[best] {
                best = i;
            }
        }
        best
    }

    pub fn effective_sample_size(&self) -> f64 {
        effective_sample_size(&self.weights)
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn weights(&self) -> &DVector<f64> {
        &self.weights
    }

    pub fn cdf(&self) -> &DVector<f64> {
        &self.cdf
    }

    pub fn target_descriptor(&self) -> &Descriptor {
        &self.target
    }

    pub fn phase(&self) -> TrackerPhase {
        self.phase
    }

    /// 1-based index of the last processed frame (the bootstrap frame is 1).
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }
}
