use rand::Rng;
use rand::distributions::{Distribution, Uniform};
use rand_distr::StandardNormal;

/// Weight initialization scheme. Biases always start at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InitMode {
    /// All weights zero. Every hidden unit stays identical, so the network
    /// cannot break symmetry and will not learn.
    Zero,
    /// Uniform in `[-1, 1]` scaled by `1/sqrt(fan_in)`.
    #[default]
    HeUniform,
    /// Standard normal scaled by `sqrt(2/fan_in)`.
    HeNormal,
}

#[derive(Debug, Clone)]
pub struct Layer {
    in_dim: usize,
    out_dim: usize,
    /// Row-major matrix with shape (out_dim, in_dim).
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl Layer {
    /// Zero-initialized layer.
    #[inline]
    pub fn new(in_dim: usize, out_dim: usize) -> Self {
        Self {
            in_dim,
            out_dim,
            weights: vec![0.0; in_dim * out_dim],
            biases: vec![0.0; out_dim],
        }
    }

    #[inline]
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    #[inline]
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[inline]
    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    #[inline]
    pub fn weights_mut(&mut self) -> &mut [f32] {
        &mut self.weights
    }

    #[inline]
    pub fn biases_mut(&mut self) -> &mut [f32] {
        &mut self.biases
    }

    /// Weight `(out, inp)`.
    #[inline]
    pub fn weight(&self, out: usize, inp: usize) -> f32 {
        self.weights[out * self.in_dim + inp]
    }

    #[inline]
    pub(crate) fn params_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.weights, &mut self.biases)
    }

    /// Re-draw weights with `mode` and zero the biases.
    pub fn initialize<R: Rng + ?Sized>(&mut self, mode: InitMode, rng: &mut R) {
        let fan_in = self.in_dim.max(1) as f32;
        match mode {
            InitMode::Zero => self.weights.fill(0.0),
            InitMode::HeUniform => {
                let scale = 1.0 / fan_in.sqrt();
                let dist = Uniform::new_inclusive(-1.0_f32, 1.0_f32);
                for w in &mut self.weights {
                    *w = scale * dist.sample(rng);
                }
            }
            InitMode::HeNormal => {
                let std = (2.0 / fan_in).sqrt();
                for w in &mut self.weights {
                    let z: f32 = StandardNormal.sample(rng);
                    *w = std * z;
                }
            }
        }
        self.biases.fill(0.0);
    }

    /// Affine part of the forward pass for one sample: `z = W * inputs + b`.
    ///
    /// Shape contract:
    /// - `inputs.len() == self.in_dim`
    /// - `z.len() == self.out_dim`
    #[inline]
    pub fn forward(&self, inputs: &[f32], z: &mut [f32]) {
        debug_assert_eq!(inputs.len(), self.in_dim);
        debug_assert_eq!(z.len(), self.out_dim);

        for o in 0..self.out_dim {
            let mut sum = self.biases[o];
            let row = o * self.in_dim;
            for i in 0..self.in_dim {
                sum += self.weights[row + i] * inputs[i];
            }
            z[o] = sum;
        }
    }

    /// Backward pass for one sample of a batch.
    ///
    /// Accumulate semantics: `d_weights += d_z ⊗ inputs` and `d_biases += d_z`,
    /// so gradients sum over the batch. `d_inputs` is overwritten with
    /// `Wᵗ * d_z` (the gradient w.r.t. the layer input, before any activation
    /// derivative of the previous layer).
    ///
    /// Shape contract:
    /// - `inputs.len() == self.in_dim`
    /// - `d_z.len() == self.out_dim`
    /// - `d_inputs.len() == self.in_dim`
    /// - `d_weights.len() == self.weights.len()`
    /// - `d_biases.len() == self.out_dim`
    #[inline]
    pub fn backward_accumulate(
        &self,
        inputs: &[f32],
        d_z: &[f32],
        d_inputs: &mut [f32],
        d_weights: &mut [f32],
        d_biases: &mut [f32],
    ) {
        debug_assert_eq!(inputs.len(), self.in_dim);
        debug_assert_eq!(d_z.len(), self.out_dim);
        debug_assert_eq!(d_inputs.len(), self.in_dim);
        debug_assert_eq!(d_weights.len(), self.weights.len());
        debug_assert_eq!(d_biases.len(), self.out_dim);

        d_inputs.fill(0.0);

        for o in 0..self.out_dim {
            let dz = d_z[o];
            d_biases[o] += dz;

            let row = o * self.in_dim;
            for i in 0..self.in_dim {
                d_weights[row + i] += dz * inputs[i];
                d_inputs[i] += dz * self.weights[row + i];
            }
        }
    }
}
