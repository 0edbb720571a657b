//! The 2 → H1 → H2 → 2 classification network.
//!
//! `Network` owns its parameters, the per-batch scratch buffers, the gradient
//! buffers and the optimizer state. All of them are sized for the current
//! hidden widths; `set_hidden_sizes` reallocates them together.
//!
//! Shape mismatches between these buffers are programmer error and panic via
//! `assert!`. Everything a caller can pass in (empty batches, oversized batches,
//! odd hyperparameters, degenerate logits) is handled with neutral values.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::activation::{relu_into, relu_mask};
use crate::loss::{cross_entropy, softmax, softmax_cross_entropy_grad};
use crate::metrics::{Accumulator, argmax};
use crate::{
    BatchStats, DataPoint, INPUT_DIM, InitMode, Layer, MAX_BATCH, MAX_HIDDEN, MIN_HIDDEN,
    OUTPUT_DIM, OptimizerConfig, OptimizerKind, OptimizerState,
};

/// Number of dense layers.
pub const NUM_LAYERS: usize = 3;

/// Number of parameter tensors (a weight and a bias per layer).
pub const NUM_TENSORS: usize = 2 * NUM_LAYERS;

/// Widths of the two hidden layers, always within `[MIN_HIDDEN, MAX_HIDDEN]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HiddenSizes {
    pub hidden1: usize,
    pub hidden2: usize,
}

impl HiddenSizes {
    pub const DEFAULT_HIDDEN1: usize = 4;
    pub const DEFAULT_HIDDEN2: usize = 8;

    /// Build with both widths clamped into bounds.
    pub fn new(hidden1: usize, hidden2: usize) -> Self {
        Self {
            hidden1: hidden1.clamp(MIN_HIDDEN, MAX_HIDDEN),
            hidden2: hidden2.clamp(MIN_HIDDEN, MAX_HIDDEN),
        }
    }

    /// `(in_dim, out_dim)` for each layer.
    pub fn layer_dims(self) -> [(usize, usize); NUM_LAYERS] {
        [
            (INPUT_DIM, self.hidden1),
            (self.hidden1, self.hidden2),
            (self.hidden2, OUTPUT_DIM),
        ]
    }

    /// Lengths of the six parameter tensors in `W1, b1, W2, b2, W3, b3` order.
    pub fn tensor_lens(self) -> [usize; NUM_TENSORS] {
        let mut lens = [0; NUM_TENSORS];
        for (l, (in_dim, out_dim)) in self.layer_dims().into_iter().enumerate() {
            lens[2 * l] = in_dim * out_dim;
            lens[2 * l + 1] = out_dim;
        }
        lens
    }

    /// Total number of trainable scalars.
    pub fn num_params(self) -> usize {
        self.tensor_lens().iter().sum()
    }
}

impl Default for HiddenSizes {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HIDDEN1, Self::DEFAULT_HIDDEN2)
    }
}

/// Output probabilities plus hidden activations for one query point.
///
/// Produced by `Network::forward_single_with_activations`; stored on the stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Activations {
    pub p0: f32,
    pub p1: f32,
    hidden1: [f32; MAX_HIDDEN],
    hidden2: [f32; MAX_HIDDEN],
    sizes: HiddenSizes,
}

impl Activations {
    /// Post-ReLU activations of the first hidden layer.
    #[inline]
    pub fn hidden1(&self) -> &[f32] {
        &self.hidden1[..self.sizes.hidden1]
    }

    /// Post-ReLU activations of the second hidden layer.
    #[inline]
    pub fn hidden2(&self) -> &[f32] {
        &self.hidden2[..self.sizes.hidden2]
    }

    #[inline]
    pub fn probs(&self) -> (f32, f32) {
        (self.p0, self.p1)
    }

    /// Predicted class; ties go to class 0.
    #[inline]
    pub fn predicted_label(&self) -> u8 {
        if self.p1 > self.p0 { 1 } else { 0 }
    }
}

/// Per-batch working memory, sized `MAX_BATCH × width`.
#[derive(Debug, Clone)]
struct Scratch {
    a0: Vec<f32>,
    z1: Vec<f32>,
    a1: Vec<f32>,
    z2: Vec<f32>,
    a2: Vec<f32>,
    logits: Vec<f32>,
    probs: Vec<f32>,
}

impl Scratch {
    fn new(sizes: HiddenSizes) -> Self {
        Self {
            a0: vec![0.0; MAX_BATCH * INPUT_DIM],
            z1: vec![0.0; MAX_BATCH * sizes.hidden1],
            a1: vec![0.0; MAX_BATCH * sizes.hidden1],
            z2: vec![0.0; MAX_BATCH * sizes.hidden2],
            a2: vec![0.0; MAX_BATCH * sizes.hidden2],
            logits: vec![0.0; MAX_BATCH * OUTPUT_DIM],
            probs: vec![0.0; MAX_BATCH * OUTPUT_DIM],
        }
    }

    fn check(&self, sizes: HiddenSizes) {
        let expect = |name: &str, buf: &[f32], width: usize| {
            assert_eq!(
                buf.len(),
                MAX_BATCH * width,
                "scratch {name} len {} does not match MAX_BATCH * {width}",
                buf.len()
            );
        };
        expect("a0", &self.a0, INPUT_DIM);
        expect("z1", &self.z1, sizes.hidden1);
        expect("a1", &self.a1, sizes.hidden1);
        expect("z2", &self.z2, sizes.hidden2);
        expect("a2", &self.a2, sizes.hidden2);
        expect("logits", &self.logits, OUTPUT_DIM);
        expect("probs", &self.probs, OUTPUT_DIM);
    }
}

/// Parameter gradients for a `Network`, averaged over the last batch.
#[derive(Debug, Clone)]
pub struct Gradients {
    d_weights: [Vec<f32>; NUM_LAYERS],
    d_biases: [Vec<f32>; NUM_LAYERS],
}

impl Gradients {
    fn new(sizes: HiddenSizes) -> Self {
        let dims = sizes.layer_dims();
        Self {
            d_weights: dims.map(|(i, o)| vec![0.0; i * o]),
            d_biases: dims.map(|(_, o)| vec![0.0; o]),
        }
    }

    fn zero(&mut self) {
        for g in self.d_weights.iter_mut().chain(self.d_biases.iter_mut()) {
            g.fill(0.0);
        }
    }

    fn scale(&mut self, factor: f32) {
        for g in self.d_weights.iter_mut().chain(self.d_biases.iter_mut()) {
            for v in g.iter_mut() {
                *v *= factor;
            }
        }
    }

    #[inline]
    pub fn d_weights(&self, layer_idx: usize) -> &[f32] {
        &self.d_weights[layer_idx]
    }

    #[inline]
    pub fn d_biases(&self, layer_idx: usize) -> &[f32] {
        &self.d_biases[layer_idx]
    }
}

#[derive(Debug, Clone)]
pub struct Network {
    sizes: HiddenSizes,
    layers: [Layer; NUM_LAYERS],
    scratch: Scratch,
    grads: Gradients,
    optimizer: OptimizerState,
    optimizer_config: OptimizerConfig,
    init_mode: InitMode,
    seed: u64,
}

impl Default for Network {
    fn default() -> Self {
        Self::new(HiddenSizes::default())
    }
}

impl Network {
    /// Seed used by `new` until `reset_parameters` is called with another one.
    pub const DEFAULT_SEED: u64 = 1;

    /// Build a network with He-uniform weights from `DEFAULT_SEED`.
    pub fn new(sizes: HiddenSizes) -> Self {
        let sizes = HiddenSizes::new(sizes.hidden1, sizes.hidden2);
        let mut net = Self {
            sizes,
            layers: sizes.layer_dims().map(|(i, o)| Layer::new(i, o)),
            scratch: Scratch::new(sizes),
            grads: Gradients::new(sizes),
            optimizer: OptimizerState::new(&sizes.tensor_lens()),
            optimizer_config: OptimizerConfig::default(),
            init_mode: InitMode::default(),
            seed: Self::DEFAULT_SEED,
        };
        net.reset_parameters(Self::DEFAULT_SEED);
        net
    }

    #[inline]
    pub fn hidden_sizes(&self) -> HiddenSizes {
        self.sizes
    }

    #[inline]
    pub fn init_mode(&self) -> InitMode {
        self.init_mode
    }

    /// Seed of the most recent `reset_parameters`.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn optimizer_config(&self) -> &OptimizerConfig {
        &self.optimizer_config
    }

    #[inline]
    pub fn learning_rate(&self) -> f32 {
        self.optimizer_config.learning_rate
    }

    /// Number of Adam steps taken since parameters were last initialized or
    /// the optimizer kind last changed.
    #[inline]
    pub fn adam_step(&self) -> u64 {
        self.optimizer.adam_step()
    }

    /// Gradients from the most recent non-empty `train_batch`.
    #[inline]
    pub fn gradients(&self) -> &Gradients {
        &self.grads
    }

    #[inline]
    pub fn layer(&self, idx: usize) -> Option<&Layer> {
        self.layers.get(idx)
    }

    /// Mutable access to a layer's values. Shapes cannot change through it.
    #[inline]
    pub fn layer_mut(&mut self, idx: usize) -> Option<&mut Layer> {
        self.layers.get_mut(idx)
    }

    #[inline]
    pub fn w1(&self) -> &[f32] {
        self.layers[0].weights()
    }

    #[inline]
    pub fn b1(&self) -> &[f32] {
        self.layers[0].biases()
    }

    #[inline]
    pub fn w2(&self) -> &[f32] {
        self.layers[1].weights()
    }

    #[inline]
    pub fn b2(&self) -> &[f32] {
        self.layers[1].biases()
    }

    #[inline]
    pub fn w3(&self) -> &[f32] {
        self.layers[2].weights()
    }

    #[inline]
    pub fn b3(&self) -> &[f32] {
        self.layers[2].biases()
    }

    #[inline]
    pub fn set_learning_rate(&mut self, lr: f32) {
        self.optimizer_config.learning_rate = lr;
    }

    /// Takes effect on the next `train_batch`. A different kind starts from
    /// zeroed moment buffers.
    #[inline]
    pub fn set_optimizer(&mut self, kind: OptimizerKind) {
        self.optimizer_config.kind = kind;
    }

    #[inline]
    pub fn set_optimizer_hyperparams(&mut self, momentum: f32, beta1: f32, beta2: f32, eps: f32) {
        self.optimizer_config.momentum = momentum;
        self.optimizer_config.beta1 = beta1;
        self.optimizer_config.beta2 = beta2;
        self.optimizer_config.eps = eps;
    }

    #[inline]
    pub fn set_optimizer_config(&mut self, cfg: OptimizerConfig) {
        self.optimizer_config = cfg;
    }

    /// Used by the next `reset_parameters`.
    #[inline]
    pub fn set_init_mode(&mut self, mode: InitMode) {
        self.init_mode = mode;
    }

    /// Re-draw every weight from a generator seeded with `seed`, zero the
    /// biases and clear the optimizer state.
    pub fn reset_parameters(&mut self, seed: u64) {
        self.seed = seed;
        let mut rng = StdRng::seed_from_u64(seed);
        for layer in &mut self.layers {
            layer.initialize(self.init_mode, &mut rng);
        }
        self.optimizer.reset();
        self.grads.zero();
    }

    /// Change the hidden widths (clamped into bounds).
    ///
    /// On a change, every parameter, scratch, gradient and optimizer buffer is
    /// reallocated for the new shapes and parameters are re-initialized from
    /// the current seed. Returns whether the widths changed.
    pub fn set_hidden_sizes(&mut self, hidden1: usize, hidden2: usize) -> bool {
        let sizes = HiddenSizes::new(hidden1, hidden2);
        if sizes == self.sizes {
            return false;
        }

        log::debug!(
            "resizing network from 2-{}-{}-2 to 2-{}-{}-2",
            self.sizes.hidden1,
            self.sizes.hidden2,
            sizes.hidden1,
            sizes.hidden2
        );

        self.sizes = sizes;
        self.layers = sizes.layer_dims().map(|(i, o)| Layer::new(i, o));
        self.scratch = Scratch::new(sizes);
        self.grads = Gradients::new(sizes);
        self.optimizer = OptimizerState::new(&sizes.tensor_lens());
        self.reset_parameters(self.seed);
        self.check_buffers();
        true
    }

    /// Assert that every buffer matches the current widths.
    fn check_buffers(&self) {
        self.scratch.check(self.sizes);

        let lens = self.sizes.tensor_lens();
        for (l, layer) in self.layers.iter().enumerate() {
            assert_eq!(
                layer.weights().len(),
                lens[2 * l],
                "layer {l} weights len {} does not match expected {}",
                layer.weights().len(),
                lens[2 * l]
            );
            assert_eq!(
                layer.biases().len(),
                lens[2 * l + 1],
                "layer {l} biases len {} does not match expected {}",
                layer.biases().len(),
                lens[2 * l + 1]
            );
            assert_eq!(
                self.grads.d_weights[l].len(),
                lens[2 * l],
                "grads layer {l} d_weights len {} does not match expected {}",
                self.grads.d_weights[l].len(),
                lens[2 * l]
            );
            assert_eq!(
                self.grads.d_biases[l].len(),
                lens[2 * l + 1],
                "grads layer {l} d_biases len {} does not match expected {}",
                self.grads.d_biases[l].len(),
                lens[2 * l + 1]
            );
        }

        assert!(
            self.optimizer.tensor_lens().eq(lens.iter().copied()),
            "optimizer moment buffers do not match parameter shapes"
        );
    }

    /// One training step on `batch`: forward, softmax cross-entropy, backprop,
    /// optimizer update.
    ///
    /// Returns the mean loss and accuracy of the batch *before* the update.
    /// An empty batch returns zeros and leaves every buffer untouched. Only the
    /// first `MAX_BATCH` points of a longer batch are used.
    pub fn train_batch(&mut self, batch: &[DataPoint]) -> BatchStats {
        if batch.is_empty() {
            return BatchStats::default();
        }
        self.check_buffers();

        let batch = &batch[..batch.len().min(MAX_BATCH)];
        let cfg = self.optimizer_config;
        let HiddenSizes { hidden1: h1, hidden2: h2 } = self.sizes;

        let Network {
            layers,
            scratch: s,
            grads,
            optimizer,
            ..
        } = self;
        let [l1, l2, l3] = layers;

        // Forward.
        let mut acc = Accumulator::default();
        for (n, point) in batch.iter().enumerate() {
            let r0 = n * INPUT_DIM..(n + 1) * INPUT_DIM;
            let r1 = n * h1..(n + 1) * h1;
            let r2 = n * h2..(n + 1) * h2;
            let ro = n * OUTPUT_DIM..(n + 1) * OUTPUT_DIM;

            s.a0[r0.clone()].copy_from_slice(&[point.x, point.y]);

            l1.forward(&s.a0[r0], &mut s.z1[r1.clone()]);
            relu_into(&s.z1[r1.clone()], &mut s.a1[r1.clone()]);

            l2.forward(&s.a1[r1], &mut s.z2[r2.clone()]);
            relu_into(&s.z2[r2.clone()], &mut s.a2[r2.clone()]);

            l3.forward(&s.a2[r2], &mut s.logits[ro.clone()]);
            softmax(&s.logits[ro.clone()], &mut s.probs[ro.clone()]);

            let probs = &s.probs[ro];
            let label = point.class();
            let p_correct = probs.get(label).copied().unwrap_or(0.0);
            acc.record(cross_entropy(p_correct), argmax(probs), label);
        }
        let stats = acc.finish();

        // Backward.
        grads.zero();
        let mut delta3 = [0.0_f32; OUTPUT_DIM];
        let mut delta2 = [0.0_f32; MAX_HIDDEN];
        let mut delta1 = [0.0_f32; MAX_HIDDEN];
        let mut d_input = [0.0_f32; INPUT_DIM];

        for (n, point) in batch.iter().enumerate() {
            let r0 = n * INPUT_DIM..(n + 1) * INPUT_DIM;
            let r1 = n * h1..(n + 1) * h1;
            let r2 = n * h2..(n + 1) * h2;
            let ro = n * OUTPUT_DIM..(n + 1) * OUTPUT_DIM;

            softmax_cross_entropy_grad(&s.probs[ro], point.class(), &mut delta3);

            let d2 = &mut delta2[..h2];
            l3.backward_accumulate(
                &s.a2[r2.clone()],
                &delta3,
                d2,
                &mut grads.d_weights[2],
                &mut grads.d_biases[2],
            );
            relu_mask(&s.z2[r2], d2);

            let d1 = &mut delta1[..h1];
            l2.backward_accumulate(
                &s.a1[r1.clone()],
                d2,
                d1,
                &mut grads.d_weights[1],
                &mut grads.d_biases[1],
            );
            relu_mask(&s.z1[r1], d1);

            l1.backward_accumulate(
                &s.a0[r0],
                d1,
                &mut d_input,
                &mut grads.d_weights[0],
                &mut grads.d_biases[0],
            );
        }
        grads.scale(1.0 / batch.len() as f32);

        // Update.
        let (w1, b1) = l1.params_mut();
        let (w2, b2) = l2.params_mut();
        let (w3, b3) = l3.params_mut();
        optimizer.step(
            &cfg,
            [
                (w1, grads.d_weights[0].as_slice()),
                (b1, grads.d_biases[0].as_slice()),
                (w2, grads.d_weights[1].as_slice()),
                (b2, grads.d_biases[1].as_slice()),
                (w3, grads.d_weights[2].as_slice()),
                (b3, grads.d_biases[2].as_slice()),
            ],
        );

        log::trace!(
            "train_batch n={} loss={:.5} acc={:.3}",
            batch.len(),
            stats.loss,
            stats.accuracy
        );
        stats
    }

    /// Class probabilities `(p0, p1)` at one point.
    ///
    /// Returns `(0.5, 0.5)` when the logits are degenerate (NaN or infinite).
    #[inline]
    pub fn forward_single(&self, x: f32, y: f32) -> (f32, f32) {
        self.forward_single_with_activations(x, y).probs()
    }

    /// Like `forward_single`, also exposing both hidden activation vectors.
    ///
    /// Allocation-free and read-only.
    pub fn forward_single_with_activations(&self, x: f32, y: f32) -> Activations {
        let HiddenSizes { hidden1: h1, hidden2: h2 } = self.sizes;
        let [l1, l2, l3] = &self.layers;

        let input = [x, y];
        let mut z = [0.0_f32; MAX_HIDDEN];
        let mut a1 = [0.0_f32; MAX_HIDDEN];
        let mut a2 = [0.0_f32; MAX_HIDDEN];

        l1.forward(&input, &mut z[..h1]);
        relu_into(&z[..h1], &mut a1[..h1]);

        l2.forward(&a1[..h1], &mut z[..h2]);
        relu_into(&z[..h2], &mut a2[..h2]);

        let mut logits = [0.0_f32; OUTPUT_DIM];
        let mut probs = [0.0_f32; OUTPUT_DIM];
        l3.forward(&a2[..h2], &mut logits);
        softmax(&logits, &mut probs);

        Activations {
            p0: probs[0],
            p1: probs[1],
            hidden1: a1,
            hidden2: a2,
            sizes: self.sizes,
        }
    }

    /// Mean loss and accuracy over `points` without touching any state.
    pub fn evaluate(&self, points: &[DataPoint]) -> BatchStats {
        let mut acc = Accumulator::default();
        for point in points {
            let act = self.forward_single_with_activations(point.x, point.y);
            let probs = [act.p0, act.p1];
            let label = point.class();
            let p_correct = probs.get(label).copied().unwrap_or(0.0);
            acc.record(cross_entropy(p_correct), argmax(&probs), label);
        }
        acc.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f32, y: f32, label: u8) -> DataPoint {
        DataPoint { x, y, label }
    }

    fn assert_close(analytic: f32, numeric: f32, abs_tol: f32, rel_tol: f32) {
        let diff = (analytic - numeric).abs();
        let scale = analytic.abs().max(numeric.abs()).max(1.0);
        assert!(
            diff <= abs_tol || diff / scale <= rel_tol,
            "analytic={analytic} numeric={numeric} diff={diff}"
        );
    }

    fn param_mut(net: &mut Network, layer_idx: usize, is_bias: bool, p: usize) -> &mut f32 {
        let layer = net.layer_mut(layer_idx).unwrap();
        if is_bias {
            &mut layer.biases_mut()[p]
        } else {
            &mut layer.weights_mut()[p]
        }
    }

    fn relu_pattern(net: &Network, p: DataPoint) -> Vec<bool> {
        let act = net.forward_single_with_activations(p.x, p.y);
        act.hidden1()
            .iter()
            .chain(act.hidden2())
            .map(|&a| a > 0.0)
            .collect()
    }

    #[test]
    fn buffers_have_declared_shapes() {
        let net = Network::default();
        assert_eq!(net.w1().len(), 4 * 2);
        assert_eq!(net.b1().len(), 4);
        assert_eq!(net.w2().len(), 8 * 4);
        assert_eq!(net.b2().len(), 8);
        assert_eq!(net.w3().len(), 2 * 8);
        assert_eq!(net.b3().len(), 2);
        assert_eq!(net.hidden_sizes().num_params(), 8 + 4 + 32 + 8 + 16 + 2);
        assert!(net.b1().iter().chain(net.b2()).chain(net.b3()).all(|&b| b == 0.0));
    }

    #[test]
    fn seeded_init_is_deterministic() {
        let mut a = Network::default();
        let mut b = Network::default();
        a.reset_parameters(123);
        b.reset_parameters(123);
        assert_eq!(a.w1(), b.w1());
        assert_eq!(a.w2(), b.w2());
        assert_eq!(a.w3(), b.w3());

        b.reset_parameters(124);
        assert_ne!(a.w1(), b.w1());
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let mut net = Network::default();
        net.set_optimizer(OptimizerKind::Adam);
        let before = net.clone();

        let stats = net.train_batch(&[]);
        assert_eq!(stats, BatchStats::default());
        assert_eq!(net.w1(), before.w1());
        assert_eq!(net.b3(), before.b3());
        assert_eq!(net.adam_step(), 0);
    }

    #[test]
    fn oversized_batch_is_truncated() {
        let points: Vec<DataPoint> = (0..MAX_BATCH + 10)
            .map(|i| pt(i as f32 * 1e-3, 0.0, (i % 2) as u8))
            .collect();

        let mut a = Network::default();
        let mut b = Network::default();
        let sa = a.train_batch(&points);
        let sb = b.train_batch(&points[..MAX_BATCH]);
        assert_eq!(sa, sb);
        assert_eq!(a.w1(), b.w1());
    }

    #[test]
    fn forward_single_matches_training_forward() {
        let mut net = Network::default();
        net.set_learning_rate(0.0);
        let p = pt(0.3, -0.7, 1);
        let stats = net.train_batch(&[p]);

        let (p0, p1) = net.forward_single(p.x, p.y);
        assert!((p0 + p1 - 1.0).abs() < 1e-6);
        assert!((stats.loss - cross_entropy(p1)).abs() < 1e-6);
        assert_eq!(stats.accuracy, if p1 > p0 { 1.0 } else { 0.0 });
    }

    #[test]
    fn softmax_is_stable_for_huge_logits() {
        let mut net = Network::default();
        {
            let out = net.layer_mut(2).unwrap();
            out.weights_mut().fill(0.0);
            out.biases_mut().copy_from_slice(&[1e6, -1e6]);
        }
        let (p0, p1) = net.forward_single(0.1, 0.2);
        assert!(p0.is_finite() && p1.is_finite());
        assert!((0.0..=1.0).contains(&p0) && (0.0..=1.0).contains(&p1));
        assert!((p0 + p1 - 1.0).abs() < 1e-6);
        assert!(p0 > 0.999);
    }

    #[test]
    fn degenerate_logits_give_even_odds() {
        let mut net = Network::default();
        net.layer_mut(2).unwrap().biases_mut().fill(f32::INFINITY);
        assert_eq!(net.forward_single(0.0, 0.0), (0.5, 0.5));

        net.layer_mut(2).unwrap().biases_mut().fill(f32::NAN);
        assert_eq!(net.forward_single(0.0, 0.0), (0.5, 0.5));
    }

    #[test]
    fn forward_single_does_not_mutate() {
        let net = Network::default();
        let before = (net.w1().to_vec(), net.w2().to_vec(), net.w3().to_vec());
        for i in 0..16 {
            let _ = net.forward_single_with_activations(i as f32 * 0.1 - 0.8, 0.3);
        }
        assert_eq!(before, (net.w1().to_vec(), net.w2().to_vec(), net.w3().to_vec()));
    }

    #[test]
    fn activations_expose_live_widths() {
        let mut net = Network::default();
        net.set_hidden_sizes(3, 5);
        let act = net.forward_single_with_activations(0.2, 0.4);
        assert_eq!(act.hidden1().len(), 3);
        assert_eq!(act.hidden2().len(), 5);
        assert!(act.hidden1().iter().chain(act.hidden2()).all(|&a| a >= 0.0));
        assert_eq!(act.predicted_label(), if act.p1 > act.p0 { 1 } else { 0 });
    }

    #[test]
    fn backward_matches_numeric_gradients() {
        let mut net = Network::default();
        net.reset_parameters(7);
        net.set_learning_rate(0.0);

        let sample = pt(0.4, -0.3, 1);
        net.train_batch(&[sample]);
        let grads = net.gradients().clone();

        let eps = 1e-3_f32;
        let abs_tol = 1e-3_f32;
        let rel_tol = 1e-2_f32;
        let base_pattern = relu_pattern(&net, sample);
        let mut checked = 0;

        for layer_idx in 0..NUM_LAYERS {
            for is_bias in [false, true] {
                let len = {
                    let layer = net.layer(layer_idx).unwrap();
                    if is_bias { layer.biases().len() } else { layer.weights().len() }
                };

                for p in 0..len {
                    let orig = *param_mut(&mut net, layer_idx, is_bias, p);

                    *param_mut(&mut net, layer_idx, is_bias, p) = orig + eps;
                    let loss_plus = net.evaluate(&[sample]).loss;
                    let pattern_plus = relu_pattern(&net, sample);

                    *param_mut(&mut net, layer_idx, is_bias, p) = orig - eps;
                    let loss_minus = net.evaluate(&[sample]).loss;
                    let pattern_minus = relu_pattern(&net, sample);

                    *param_mut(&mut net, layer_idx, is_bias, p) = orig;

                    // Central differences are meaningless across a ReLU kink.
                    if pattern_plus != base_pattern || pattern_minus != base_pattern {
                        continue;
                    }

                    let numeric = (loss_plus - loss_minus) / (2.0 * eps);
                    let analytic = if is_bias {
                        grads.d_biases(layer_idx)[p]
                    } else {
                        grads.d_weights(layer_idx)[p]
                    };
                    assert_close(analytic, numeric, abs_tol, rel_tol);
                    checked += 1;
                }
            }
        }

        // Output layer parameters never sit behind a kink.
        assert!(checked >= 2 * 8 + 2, "only {checked} parameters checked");
    }

    #[test]
    fn gradients_are_averaged_over_the_batch() {
        let p = pt(0.5, 0.25, 0);

        let mut single = Network::default();
        single.set_learning_rate(0.0);
        single.train_batch(&[p]);

        let mut repeated = Network::default();
        repeated.set_learning_rate(0.0);
        repeated.train_batch(&[p; 4]);

        for l in 0..NUM_LAYERS {
            for (a, b) in single
                .gradients()
                .d_weights(l)
                .iter()
                .zip(repeated.gradients().d_weights(l))
            {
                assert!((a - b).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn adam_counter_increments_once_per_batch() {
        let mut net = Network::default();
        net.set_optimizer(OptimizerKind::Adam);
        net.set_learning_rate(0.01);
        let batch = [pt(0.1, 0.2, 0), pt(-0.3, 0.4, 1)];
        for _ in 0..10 {
            net.train_batch(&batch);
        }
        assert_eq!(net.adam_step(), 10);

        net.reset_parameters(1);
        assert_eq!(net.adam_step(), 0);
    }

    #[test]
    fn zero_init_stays_symmetric() {
        let mut net = Network::default();
        net.set_init_mode(InitMode::Zero);
        net.reset_parameters(1);

        let batch = [pt(-0.5, 0.1, 0), pt(0.5, -0.1, 1), pt(0.4, 0.2, 1)];
        for _ in 0..50 {
            net.train_batch(&batch);
        }

        assert!(net.w1().iter().chain(net.w2()).chain(net.w3()).all(|&w| w == 0.0));
        // Only the output bias can move, so every point gets the same prediction.
        let a = net.forward_single(-0.5, 0.1);
        let b = net.forward_single(0.5, -0.1);
        assert_eq!(a, b);
    }

    #[test]
    fn resize_reallocates_every_buffer() {
        let mut net = Network::default();
        net.set_optimizer(OptimizerKind::Adam);
        net.train_batch(&[pt(0.1, 0.1, 0)]);

        assert!(net.set_hidden_sizes(6, 3));
        assert!(!net.set_hidden_sizes(6, 3));
        assert_eq!(net.w1().len(), 6 * 2);
        assert_eq!(net.w2().len(), 3 * 6);
        assert_eq!(net.w3().len(), 2 * 3);
        assert_eq!(net.gradients().d_weights(1).len(), 18);
        assert_eq!(net.adam_step(), 0);

        let stats = net.train_batch(&[pt(0.1, 0.1, 0), pt(-0.2, 0.3, 1)]);
        assert!(stats.loss.is_finite());
        assert_eq!(net.adam_step(), 1);
    }

    #[test]
    fn resize_clamps_to_bounds() {
        let mut net = Network::default();
        net.set_hidden_sizes(0, 10_000);
        assert_eq!(
            net.hidden_sizes(),
            HiddenSizes {
                hidden1: MIN_HIDDEN,
                hidden2: MAX_HIDDEN
            }
        );
        let stats = net.train_batch(&[pt(0.0, 0.0, 1)]);
        assert!(stats.loss.is_finite());
    }

    #[test]
    #[should_panic(expected = "scratch z2")]
    fn train_batch_panics_on_stale_scratch() {
        let mut net = Network::default();
        net.scratch.z2.truncate(3);
        net.train_batch(&[pt(0.0, 0.0, 0)]);
    }

    #[test]
    #[should_panic(expected = "optimizer moment buffers")]
    fn train_batch_panics_on_stale_optimizer_state() {
        let mut net = Network::default();
        net.optimizer = OptimizerState::new(&HiddenSizes::new(5, 5).tensor_lens());
        net.train_batch(&[pt(0.0, 0.0, 0)]);
    }
}
