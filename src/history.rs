//! Bounded training history.
//!
//! A sliding window: once `capacity` samples are stored, each new sample evicts
//! the oldest one. Storage is allocated once up front.

use std::collections::VecDeque;

/// Default number of samples kept.
pub const HISTORY_SIZE: usize = 4096;

/// Largest window `History::with_capacity` will allocate.
pub const MAX_HISTORY_SIZE: usize = 1 << 16;

#[derive(Debug, Clone)]
pub struct History {
    loss: VecDeque<f32>,
    accuracy: VecDeque<f32>,
    capacity: usize,
    total_pushed: u64,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(HISTORY_SIZE)
    }
}

impl History {
    /// Window of `capacity` samples, clamped to `[1, MAX_HISTORY_SIZE]`.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_HISTORY_SIZE);
        Self {
            loss: VecDeque::with_capacity(capacity),
            accuracy: VecDeque::with_capacity(capacity),
            capacity,
            total_pushed: 0,
        }
    }

    pub fn push(&mut self, loss: f32, accuracy: f32) {
        if self.loss.len() == self.capacity {
            self.loss.pop_front();
            self.accuracy.pop_front();
        }
        self.loss.push_back(loss);
        self.accuracy.push_back(accuracy);
        self.total_pushed += 1;
    }

    pub fn clear(&mut self) {
        self.loss.clear();
        self.accuracy.clear();
        self.total_pushed = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.loss.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.loss.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples recorded since the last clear, including evicted ones.
    #[inline]
    pub fn total_pushed(&self) -> u64 {
        self.total_pushed
    }

    /// Oldest to newest.
    pub fn losses(&self) -> impl ExactSizeIterator<Item = f32> + '_ {
        self.loss.iter().copied()
    }

    /// Oldest to newest.
    pub fn accuracies(&self) -> impl ExactSizeIterator<Item = f32> + '_ {
        self.accuracy.iter().copied()
    }

    /// Most recent `(loss, accuracy)`.
    pub fn latest(&self) -> Option<(f32, f32)> {
        Some((*self.loss.back()?, *self.accuracy.back()?))
    }

    /// `(min, max)` of the stored losses, for plot scaling.
    pub fn loss_range(&self) -> Option<(f32, f32)> {
        let mut it = self.losses().filter(|v| v.is_finite());
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}
