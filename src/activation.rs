//! Activation functions.
//!
//! Both hidden layers use ReLU. Unlike a general MLP, the network keeps the
//! pre-activation `z` for every layer in its scratch buffers, so the derivative
//! is taken from `z` directly: `1` when `z > 0`, else `0`.

#[inline]
pub fn relu(z: f32) -> f32 {
    if z > 0.0 { z } else { 0.0 }
}

/// Derivative of ReLU at pre-activation `z`.
#[inline]
pub fn relu_grad(z: f32) -> f32 {
    if z > 0.0 { 1.0 } else { 0.0 }
}

/// Writes `relu(z[i])` into `out[i]`.
#[inline]
pub(crate) fn relu_into(z: &[f32], out: &mut [f32]) {
    debug_assert_eq!(z.len(), out.len());
    for (o, &v) in out.iter_mut().zip(z) {
        *o = relu(v);
    }
}

/// Masks `delta` in place by the ReLU derivative at `z`.
#[inline]
pub(crate) fn relu_mask(z: &[f32], delta: &mut [f32]) {
    debug_assert_eq!(z.len(), delta.len());
    for (d, &v) in delta.iter_mut().zip(z) {
        *d *= relu_grad(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relu_shapes() {
        assert_eq!(relu(-2.0), 0.0);
        assert_eq!(relu(3.0), 3.0);
        assert_eq!(relu(f32::NAN), 0.0);

        assert_eq!(relu_grad(0.0), 0.0);
        assert_eq!(relu_grad(1e-9), 1.0);
        assert_eq!(relu_grad(-1.0), 0.0);
    }

    #[test]
    fn mask_zeroes_inactive_units() {
        let z = [1.0_f32, -1.0, 0.0, 2.0];
        let mut delta = [0.5_f32, 0.5, 0.5, -0.25];
        relu_mask(&z, &mut delta);
        assert_eq!(delta, [0.5, 0.0, 0.0, -0.25]);
    }
}
