#![allow(dead_code)]

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use toynet::{DataPoint, Dataset};

/// Two Gaussian blobs centred at `(-0.5, 0)` (label 0) and `(0.5, 0)`
/// (label 1), alternating labels so any contiguous batch is balanced.
pub fn two_blobs(n: usize, spread: f32, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0_f32, spread).unwrap();

    let points = (0..n)
        .map(|i| {
            let label = (i % 2) as u8;
            let cx = if label == 0 { -0.5 } else { 0.5 };
            DataPoint {
                x: (cx + noise.sample(&mut rng)).clamp(-1.0, 1.0),
                y: noise.sample(&mut rng).clamp(-1.0, 1.0),
                label,
            }
        })
        .collect();
    Dataset::from_points(points).unwrap()
}
