//! Motion model traits for the prediction step.

use rand::RngCore;

use crate::Population;

/// Trait for particle motion (prediction) models.
///
/// A motion model advances every particle of a population by one frame.
/// Randomness is drawn exclusively from the supplied generator so that runs
/// are reproducible from a seed.
pub trait MotionModel: Send + Sync {
    /// Propagate `population` one step forward, returning a new population.
    ///
    /// # Arguments
    /// * `population` - Prior particles (unchanged)
    /// * `rng` - Random source for process noise
    fn predict(&self, population: &Population, rng: &mut dyn RngCore) -> Population;
}

impl<M: MotionModel + ?Sized> MotionModel for Box<M> {
    fn predict(&self, population: &Population, rng: &mut dyn RngCore) -> Population {
        (**self).predict(population, rng)
    }
}
