//! Softmax and cross-entropy.
//!
//! The output layer produces raw logits. These helpers are allocation-free and
//! never produce NaN/Inf for the values they return:
//!
//! - `softmax` subtracts the max logit before exponentiating and falls back to a
//!   uniform distribution when the normalizer is degenerate.
//! - `cross_entropy` clamps the correct-class probability to `PROB_EPS` before
//!   taking the log.

/// Lower clamp for probabilities inside `ln`.
pub const PROB_EPS: f32 = 1e-6;

/// Numerically stable softmax of `logits` into `probs`.
///
/// Returns `false` (and writes a uniform distribution) when the exponential sum
/// is `<= 0` or not finite, e.g. for NaN or infinite logits.
///
/// Shape contract: `logits.len() == probs.len()` and non-empty.
#[inline]
pub fn softmax(logits: &[f32], probs: &mut [f32]) -> bool {
    debug_assert_eq!(logits.len(), probs.len());
    debug_assert!(!logits.is_empty());

    let mut max_logit = f32::NEG_INFINITY;
    for &v in logits {
        if v > max_logit {
            max_logit = v;
        }
    }

    let mut exp_sum = 0.0_f32;
    for (p, &v) in probs.iter_mut().zip(logits) {
        let e = (v - max_logit).exp();
        *p = e;
        exp_sum += e;
    }

    if !(exp_sum.is_finite() && exp_sum > 0.0) {
        let uniform = 1.0 / probs.len() as f32;
        probs.fill(uniform);
        return false;
    }

    let inv_sum = 1.0 / exp_sum;
    for p in probs.iter_mut() {
        *p *= inv_sum;
    }
    true
}

/// Cross-entropy of a single sample given the probability of its true class.
#[inline]
pub fn cross_entropy(p_correct: f32) -> f32 {
    // f32::max ignores NaN, so a NaN probability lands on the clamp.
    -p_correct.max(PROB_EPS).ln()
}

/// Writes `dL/dlogits = probs - onehot(label)` for softmax cross-entropy.
#[inline]
pub fn softmax_cross_entropy_grad(probs: &[f32], label: usize, d_logits: &mut [f32]) {
    debug_assert_eq!(probs.len(), d_logits.len());
    for (k, (d, &p)) in d_logits.iter_mut().zip(probs).enumerate() {
        let target = if k == label { 1.0 } else { 0.0 };
        *d = p - target;
    }
}
