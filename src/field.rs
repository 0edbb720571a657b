//! Decision-boundary sampling.
//!
//! `DecisionField` holds `p(class 1)` on a square grid over `[-1, 1]²`, which a
//! renderer turns into the colored background behind the data points.

use crate::Network;

/// Lower bound for the grid resolution.
pub const MIN_RESOLUTION: usize = 2;

/// Upper bound for the grid resolution.
pub const MAX_RESOLUTION: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionField {
    resolution: usize,
    /// Row-major with `y` as the row: index `j * resolution + i`.
    probs: Vec<f32>,
}

impl DecisionField {
    /// Grid of `resolution × resolution` samples, resolution clamped to
    /// `[MIN_RESOLUTION, MAX_RESOLUTION]`. Initially `0.5` everywhere.
    pub fn new(resolution: usize) -> Self {
        let resolution = resolution.clamp(MIN_RESOLUTION, MAX_RESOLUTION);
        Self {
            resolution,
            probs: vec![0.5; resolution * resolution],
        }
    }

    #[inline]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    #[inline]
    pub fn probs(&self) -> &[f32] {
        &self.probs
    }

    /// Plane coordinates of grid cell `(i, j)`. Corners map to `±1`.
    #[inline]
    pub fn point(&self, i: usize, j: usize) -> (f32, f32) {
        let step = 2.0 / (self.resolution - 1) as f32;
        (-1.0 + i as f32 * step, -1.0 + j as f32 * step)
    }

    /// `p(class 1)` at grid cell `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i >= self.resolution || j >= self.resolution {
            return None;
        }
        self.probs.get(j * self.resolution + i).copied()
    }

    /// Refill the grid from `net`. Does not allocate.
    pub fn sample(&mut self, net: &Network) {
        let res = self.resolution;
        for j in 0..res {
            for i in 0..res {
                let (x, y) = self.point(i, j);
                self.probs[j * res + i] = net.forward_single(x, y).1;
            }
        }
    }
}
