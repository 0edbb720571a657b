//! Optimizers.
//!
//! Update rules operate on flat parameter/gradient slices, so the same code
//! updates every weight and bias tensor of the network.
//!
//! Design notes:
//! - `OptimizerConfig` is plain data pushed in by the trainer before each step;
//!   it is clamped at the point of use, never rejected.
//! - `OptimizerState` owns the per-tensor moment buffers and the Adam step
//!   counter. The buffers are scoped to the optimizer kind that filled them:
//!   switching kinds starts from zeroed state.

/// Upper clamp for momentum and Adam decay rates.
pub const MAX_DECAY: f32 = 0.9999;

/// Lower clamp for Adam's epsilon.
pub const MIN_EPS: f32 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
/// Optimizer choice for training.
pub enum OptimizerKind {
    /// Plain SGD.
    #[default]
    Sgd,
    /// SGD with momentum.
    SgdMomentum,
    /// Adam (bias-corrected).
    Adam,
}

/// Hyperparameters for one optimizer step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerConfig {
    pub kind: OptimizerKind,
    pub learning_rate: f32,
    /// Velocity decay for `SgdMomentum`.
    pub momentum: f32,
    /// Adam first-moment decay.
    pub beta1: f32,
    /// Adam second-moment decay.
    pub beta2: f32,
    /// Adam denominator stabilizer.
    pub eps: f32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            kind: OptimizerKind::Sgd,
            learning_rate: 0.1,
            momentum: 0.9,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
        }
    }
}

impl OptimizerConfig {
    /// Copy with every field clamped into its valid range.
    ///
    /// - learning rate: non-finite or negative becomes `0` (no update)
    /// - momentum, betas: `[0, MAX_DECAY]`, NaN becomes `0`
    /// - eps: at least `MIN_EPS`
    pub fn sanitized(self) -> Self {
        Self {
            kind: self.kind,
            learning_rate: if self.learning_rate.is_finite() {
                self.learning_rate.max(0.0)
            } else {
                0.0
            },
            momentum: clamp_decay(self.momentum),
            beta1: clamp_decay(self.beta1),
            beta2: clamp_decay(self.beta2),
            eps: if self.eps.is_finite() {
                self.eps.max(MIN_EPS)
            } else {
                MIN_EPS
            },
        }
    }
}

#[inline]
fn clamp_decay(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, MAX_DECAY) }
}

/// `param -= lr * grad`.
#[inline]
pub fn sgd_update(param: &mut [f32], grad: &[f32], lr: f32) {
    debug_assert_eq!(param.len(), grad.len());
    for (p, &g) in param.iter_mut().zip(grad) {
        *p -= lr * g;
    }
}

/// `velocity = momentum * velocity - lr * grad; param += velocity`.
#[inline]
pub fn momentum_update(param: &mut [f32], grad: &[f32], velocity: &mut [f32], lr: f32, momentum: f32) {
    debug_assert_eq!(param.len(), grad.len());
    debug_assert_eq!(param.len(), velocity.len());
    for ((p, &g), v) in param.iter_mut().zip(grad).zip(velocity.iter_mut()) {
        *v = momentum * *v - lr * g;
        *p += *v;
    }
}

/// Bias-corrected Adam update for one tensor.
///
/// `corr1 = 1 - beta1^t` and `corr2 = 1 - beta2^t` are computed once per step
/// by the caller, so the step counter is shared by all tensors.
#[allow(clippy::too_many_arguments)]
#[inline]
pub fn adam_update(
    param: &mut [f32],
    grad: &[f32],
    m: &mut [f32],
    v: &mut [f32],
    lr: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
    corr1: f32,
    corr2: f32,
) {
    debug_assert_eq!(param.len(), grad.len());
    debug_assert_eq!(param.len(), m.len());
    debug_assert_eq!(param.len(), v.len());

    let one_minus_beta1 = 1.0 - beta1;
    let one_minus_beta2 = 1.0 - beta2;
    for i in 0..param.len() {
        let g = grad[i];
        m[i] = beta1 * m[i] + one_minus_beta1 * g;
        v[i] = beta2 * v[i] + one_minus_beta2 * (g * g);

        let m_hat = m[i] / corr1;
        let v_hat = v[i] / corr2;
        param[i] -= lr * m_hat / (v_hat.sqrt() + eps);
    }
}

/// Persistent optimizer state for a fixed set of tensor shapes.
#[derive(Debug, Clone)]
pub struct OptimizerState {
    /// Kind that produced the current moments.
    kind: OptimizerKind,
    /// Momentum velocity or Adam first moment, one buffer per tensor.
    first: Vec<Vec<f32>>,
    /// Adam second moment, one buffer per tensor.
    second: Vec<Vec<f32>>,
    adam_step: u64,
    /// Whether a step ran since the last reset.
    stepped: bool,
}

impl OptimizerState {
    /// Zeroed state for tensors of the given lengths.
    pub fn new(tensor_lens: &[usize]) -> Self {
        Self {
            kind: OptimizerKind::default(),
            first: tensor_lens.iter().map(|&n| vec![0.0; n]).collect(),
            second: tensor_lens.iter().map(|&n| vec![0.0; n]).collect(),
            adam_step: 0,
            stepped: false,
        }
    }

    /// Number of completed Adam steps since the last reset.
    #[inline]
    pub fn adam_step(&self) -> u64 {
        self.adam_step
    }

    #[inline]
    pub fn kind(&self) -> OptimizerKind {
        self.kind
    }

    #[inline]
    pub fn num_tensors(&self) -> usize {
        self.first.len()
    }

    /// Length of every moment buffer, in tensor order.
    pub fn tensor_lens(&self) -> impl Iterator<Item = usize> + '_ {
        self.first.iter().map(Vec::len)
    }

    /// Zero all moments and the step counter.
    pub fn reset(&mut self) {
        for buf in self.first.iter_mut().chain(self.second.iter_mut()) {
            buf.fill(0.0);
        }
        self.adam_step = 0;
        self.stepped = false;
    }

    /// Make `kind` the active kind. Returns whether moments filled by another
    /// kind were discarded.
    fn switch_kind(&mut self, kind: OptimizerKind) -> bool {
        if kind == self.kind {
            return false;
        }
        let discarded = self.stepped;
        if discarded {
            log::debug!(
                "optimizer switched from {:?} to {:?}; resetting moment buffers",
                self.kind,
                kind
            );
        }
        self.reset();
        self.kind = kind;
        discarded
    }

    /// Apply one optimizer step to every `(param, grad)` pair.
    ///
    /// Pairs are matched to moment buffers by position. Lengths must match the
    /// shapes this state was built for.
    pub fn step<const N: usize>(&mut self, cfg: &OptimizerConfig, tensors: [(&mut [f32], &[f32]); N]) {
        assert_eq!(
            N,
            self.first.len(),
            "optimizer state has {} tensors, step was given {N}",
            self.first.len()
        );

        let cfg = cfg.sanitized();
        self.switch_kind(cfg.kind);
        self.stepped = true;

        match cfg.kind {
            OptimizerKind::Sgd => {
                for (param, grad) in tensors {
                    sgd_update(param, grad, cfg.learning_rate);
                }
            }
            OptimizerKind::SgdMomentum => {
                for ((param, grad), velocity) in tensors.into_iter().zip(self.first.iter_mut()) {
                    assert_eq!(
                        param.len(),
                        velocity.len(),
                        "velocity len {} does not match param len {}",
                        velocity.len(),
                        param.len()
                    );
                    momentum_update(param, grad, velocity, cfg.learning_rate, cfg.momentum);
                }
            }
            OptimizerKind::Adam => {
                self.adam_step += 1;
                let t = self.adam_step as f32;
                let corr1 = 1.0 - cfg.beta1.powf(t);
                let corr2 = 1.0 - cfg.beta2.powf(t);

                for ((param, grad), (m, v)) in tensors
                    .into_iter()
                    .zip(self.first.iter_mut().zip(self.second.iter_mut()))
                {
                    assert_eq!(
                        param.len(),
                        m.len(),
                        "adam moment len {} does not match param len {}",
                        m.len(),
                        param.len()
                    );
                    adam_update(
                        param,
                        grad,
                        m,
                        v,
                        cfg.learning_rate,
                        cfg.beta1,
                        cfg.beta2,
                        cfg.eps,
                        corr1,
                        corr2,
                    );
                }
            }
        }
    }
}
