//! # pftrack - Color-histogram particle filter tracking
//!
//! Tracks a single rectangular target across video frames with a sequential
//! Monte Carlo estimator. The target state (center, half-extents, velocity) is
//! represented by a population of weighted particles that is resampled,
//! propagated and re-weighted against a fixed appearance descriptor on every
//! frame.
//!
//! ## Features
//!
//! - Quantized 16x16x16 color histogram appearance model
//! - Constant-velocity motion model with per-field Gaussian noise
//! - Sharpened Bhattacharyya likelihood and inverse-CDF resampling
//! - Explicit, seedable random source for reproducible runs
//! - Frame sources, reporting sinks and JSON result tables
//!
//! ## Example
//!
//! ```rust,ignore
//! use pftrack_rs::{ParticleTracker, State, TrackerConfig};
//!
//! let mut config = TrackerConfig::new(100);
//! config.seed = Some(7);
//!
//! let initial = State::new(297.0, 139.0, 16.0, 43.0, 0.0, 0.0);
//! let mut tracker = ParticleTracker::bootstrap(config, &first_frame, initial)?;
//! for frame in frames {
//!     tracker.step(&frame)?;
//!     println!("{:?}", tracker.mean_estimate());
//! }
//! ```

// Public modules
pub mod state;
pub mod frame;
pub mod histogram;
pub mod motion;
pub mod likelihood;
pub mod resampling;
pub mod tracker;
pub mod source;
pub mod results;
pub mod pipeline;
pub mod utils;

// Optional modules
#[cfg(feature = "drawing")]
pub mod drawing;

// Re-exports for convenience
pub use state::{PixelBox, Population, State, STATE_DIM};
pub use frame::Frame;
pub use histogram::{compute_descriptor, Descriptor, DESCRIPTOR_LEN};
pub use motion::{ConstantVelocityModel, MotionModel, MotionNoise};
pub use likelihood::{appearance_score, bhattacharyya_coefficient};
pub use resampling::{DegenerateWeightPolicy, cumulative_distribution, normalize_weights, resample};
pub use tracker::{Estimate, ParticleTracker, TrackerConfig, TrackerPhase};
pub use source::{FrameSource, ImageDirectorySource, VecFrameSource};
pub use results::TrackingResults;
pub use pipeline::{run_tracking, FrameReport, ReportSink};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur while tracking
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error("Invalid state: {0}")]
        InvalidState(String),

        #[error("Invalid frame: {0}")]
        InvalidFrame(String),

        #[error("Degenerate weights: all {n_particles} particle scores are zero or non-finite")]
        DegenerateWeights { n_particles: usize },

        #[error("Invalid sampling distribution: {0}")]
        InvalidDistribution(String),

        #[error("Frame sequence is empty")]
        EmptySequence,

        #[error("Image error: {0}")]
        Image(#[from] image::ImageError),

        #[error("JSON error: {0}")]
        Json(#[from] serde_json::Error),

        #[error("IO error: {0}")]
        IoError(#[from] std::io::Error),
    }

    /// Result type for tracking operations
    pub type Result<T> = std::result::Result<T, Error>;
}
