//! Particle state and population containers.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::utils::floor_to_i64;
use crate::{Error, Result};

/// Number of fields in a particle state: `x, y, half_width, half_height, vx, vy`.
pub const STATE_DIM: usize = 6;

/// Column index of each state field inside a [`Population`] matrix.
pub mod field {
    pub const X: usize = 0;
    pub const Y: usize = 1;
    pub const HALF_WIDTH: usize = 2;
    pub const HALF_HEIGHT: usize = 3;
    pub const VX: usize = 4;
    pub const VY: usize = 5;
}

/// A single hypothesis about the target: box center, half-extents and velocity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Box center, horizontal (column) coordinate.
    pub x: f64,
    /// Box center, vertical (row) coordinate.
    pub y: f64,
    /// Half of the box width.
    pub half_width: f64,
    /// Half of the box height.
    pub half_height: f64,
    /// Horizontal velocity in pixels per frame.
    pub vx: f64,
    /// Vertical velocity in pixels per frame.
    pub vy: f64,
}

impl State {
    pub fn new(x: f64, y: f64, half_width: f64, half_height: f64, vx: f64, vy: f64) -> Self {
        Self { x, y, half_width, half_height, vx, vy }
    }

    /// Build a state from `[x, y, half_width, half_height, vx, vy]`.
    pub fn from_array(values: [f64; STATE_DIM]) -> Self {
        Self::new(values[0], values[1], values[2], values[3], values[4], values[5])
    }

    /// Build a state from a slice, which must hold exactly [`STATE_DIM`] values.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        if values.len() != STATE_DIM {
            return Err(Error::InvalidState(format!(
                "expected {} fields, got {}",
                STATE_DIM,
                values.len()
            )));
        }
        let mut array = [0.0; STATE_DIM];
        array.copy_from_slice(values);
        Ok(Self::from_array(array))
    }

    pub fn to_array(&self) -> [f64; STATE_DIM] {
        [self.x, self.y, self.half_width, self.half_height, self.vx, self.vy]
    }

    /// Box part of the state: `[x, y, half_width, half_height]`.
    pub fn bbox(&self) -> [f64; 4] {
        [self.x, self.y, self.half_width, self.half_height]
    }

    /// Integer pixel box used for cropping (every field floored).
    pub fn pixel_box(&self) -> PixelBox {
        PixelBox {
            x: floor_to_i64(self.x),
            y: floor_to_i64(self.y),
            half_width: floor_to_i64(self.half_width),
            half_height: floor_to_i64(self.half_height),
        }
    }

    /// True when every field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// Integer bounding box in pixel coordinates, centered at `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelBox {
    pub x: i64,
    pub y: i64,
    pub half_width: i64,
    pub half_height: i64,
}

impl PixelBox {
    /// Rows `[y - half_height, y + half_height)` clamped to `[0, height)`.
    ///
    /// Returns `None` when nothing of the box overlaps the frame.
    pub fn row_span(&self, height: u32) -> Option<(u32, u32)> {
        clamp_span(
            self.y.saturating_sub(self.half_height),
            self.y.saturating_add(self.half_height),
            height,
        )
    }

    /// Columns `[x - half_width, x + half_width)` clamped to `[0, width)`.
    pub fn col_span(&self, width: u32) -> Option<(u32, u32)> {
        clamp_span(
            self.x.saturating_sub(self.half_width),
            self.x.saturating_add(self.half_width),
            width,
        )
    }
}

fn clamp_span(start: i64, end: i64, limit: u32) -> Option<(u32, u32)> {
    let start = start.max(0);
    let end = end.min(limit as i64);
    if start >= end {
        return None;
    }
    Some((start as u32, end as u32))
}

/// Ordered collection of N particles, stored as an (N x 6) matrix.
///
/// Row `i` is particle `i`; columns follow [`field`].
#[derive(Clone, Debug, PartialEq)]
pub struct Population {
    particles: DMatrix<f64>,
}

impl Population {
    /// N identical copies of `state`.
    pub fn replicate(state: &State, n: usize) -> Self {
        let values = state.to_array();
        let particles = DMatrix::from_fn(n, STATE_DIM, |_, j| values[j]);
        Self { particles }
    }

    pub fn from_states(states: &[State]) -> Self {
        let mut particles = DMatrix::zeros(states.len(), STATE_DIM);
        for (i, state) in states.iter().enumerate() {
            for (j, value) in state.to_array().iter().enumerate() {
                particles[(i, j)] = *value;
            }
        }
        Self { particles }
    }

    /// Wrap an existing (N x 6) matrix.
    pub fn from_matrix(particles: DMatrix<f64>) -> Result<Self> {
        if particles.ncols() != STATE_DIM {
            return Err(Error::InvalidState(format!(
                "population matrix must have {} columns, got {}",
                STATE_DIM,
                particles.ncols()
            )));
        }
        Ok(Self { particles })
    }

    pub fn len(&self) -> usize {
        self.particles.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.nrows() == 0
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.particles
    }

    pub(crate) fn matrix_mut(&mut self) -> &mut DMatrix<f64> {
        &mut self.particles
    }

    /// Particle `index` as a [`State`]. Panics if out of range.
    pub fn state(&self, index: usize) -> State {
        let row = self.particles.row(index);
        State::new(row[0], row[1], row[2], row[3], row[4], row[5])
    }

    pub fn set_state(&mut self, index: usize, state: &State) {
        for (j, value) in state.to_array().iter().enumerate() {
            self.particles[(index, j)] = *value;
        }
    }

    pub fn states(&self) -> impl Iterator<Item = State> + '_ {
        (0..self.len()).map(move |i| self.state(i))
    }

    /// Weight-averaged state, or `None` if the weights do not sum to a positive value.
    ///
    /// Weights are renormalized by their sum, so unnormalized vectors are accepted.
    pub fn weighted_mean(&self, weights: &DVector<f64>) -> Option<State> {
        if weights.len() != self.len() {
            return None;
        }
        let total = weights.sum();
        if !(total > 0.0) || !total.is_finite() {
            return None;
        }
        let mean = weights.transpose() * &self.particles / total;
        Some(State::new(mean[0], mean[1], mean[2], mean[3], mean[4], mean[5]))
    }
}
