//! Metrics.
//!
//! Metrics are evaluation helpers (they do not participate in backprop).

/// Loss and accuracy of one training step or evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchStats {
    /// Mean cross-entropy.
    pub loss: f32,
    /// Fraction of samples whose argmax class matches the label, in `[0, 1]`.
    pub accuracy: f32,
}

/// Index of the largest probability. Ties resolve to the lowest index.
#[inline]
pub fn argmax(probs: &[f32]) -> usize {
    let mut best = 0;
    let mut best_p = f32::NEG_INFINITY;
    for (k, &p) in probs.iter().enumerate() {
        if p > best_p {
            best_p = p;
            best = k;
        }
    }
    best
}

/// Running sums for loss and accuracy over a pass.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Accumulator {
    loss_sum: f32,
    correct: usize,
    count: usize,
}

impl Accumulator {
    #[inline]
    pub(crate) fn record(&mut self, loss: f32, predicted: usize, label: usize) {
        self.loss_sum += loss;
        if predicted == label {
            self.correct += 1;
        }
        self.count += 1;
    }

    pub(crate) fn finish(self) -> BatchStats {
        if self.count == 0 {
            return BatchStats::default();
        }
        let inv_n = 1.0 / self.count as f32;
        BatchStats {
            loss: self.loss_sum * inv_n,
            accuracy: self.correct as f32 * inv_n,
        }
    }
}
