//! Motion models for the prediction step.
//!
//! - `MotionModel` - trait implemented by every prediction model
//! - `ConstantVelocityModel` - drift by velocity plus Gaussian noise, truncated to pixels

mod traits;
mod constant_velocity;

pub use traits::MotionModel;
pub use constant_velocity::{ConstantVelocityModel, MotionNoise};
