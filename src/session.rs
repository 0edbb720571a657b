//! Embedding surface.
//!
//! `Session` bundles a `Trainer`, the dataset it trains on and a cached
//! `DecisionField` behind a flat setter/getter API, for hosts (a JS bridge, an
//! immediate-mode UI) that want one object to poke at per frame. There is no
//! global state: the host owns the session.

use crate::{
    BatchStats, Dataset, DecisionField, InitMode, OptimizerKind, Trainer, TrainerConfig,
};

/// Grid resolution used by `Session::new`.
pub const DEFAULT_FIELD_RESOLUTION: usize = 64;

#[derive(Debug, Clone)]
pub struct Session {
    trainer: Trainer,
    dataset: Dataset,
    field: DecisionField,
    field_dirty: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Empty dataset, default settings.
    pub fn new() -> Self {
        Self::with_config(TrainerConfig::default(), DEFAULT_FIELD_RESOLUTION)
    }

    pub fn with_config(cfg: TrainerConfig, field_resolution: usize) -> Self {
        Self {
            trainer: Trainer::from_config(cfg),
            dataset: Dataset::default(),
            field: DecisionField::new(field_resolution),
            field_dirty: true,
        }
    }

    #[inline]
    pub fn trainer(&self) -> &Trainer {
        &self.trainer
    }

    /// Direct access to every trainer field. Marks the decision field stale.
    #[inline]
    pub fn trainer_mut(&mut self) -> &mut Trainer {
        self.field_dirty = true;
        &mut self.trainer
    }

    #[inline]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Replace the dataset and reset training.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.dataset = dataset;
        self.trainer.reset_for_new_dataset();
        self.field_dirty = true;
    }

    pub fn set_learning_rate(&mut self, lr: f32) {
        self.trainer.learning_rate = lr;
    }

    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.trainer.batch_size = batch_size;
    }

    pub fn set_optimizer(&mut self, kind: OptimizerKind) {
        self.trainer.optimizer = kind;
    }

    pub fn set_momentum(&mut self, momentum: f32) {
        self.trainer.momentum = momentum;
    }

    pub fn set_adam_params(&mut self, beta1: f32, beta2: f32, eps: f32) {
        self.trainer.adam_beta1 = beta1;
        self.trainer.adam_beta2 = beta2;
        self.trainer.adam_eps = eps;
    }

    /// Takes effect immediately: parameters are re-drawn and training resets.
    pub fn set_init_mode(&mut self, mode: InitMode) {
        self.trainer.init_mode = mode;
        self.trainer.reset_for_new_dataset();
        self.field_dirty = true;
    }

    /// Resize the hidden layers and reset training.
    pub fn set_hidden_sizes(&mut self, hidden1: usize, hidden2: usize) -> bool {
        self.field_dirty = true;
        self.trainer.set_hidden_sizes(hidden1, hidden2)
    }

    pub fn set_auto_train(&mut self, enabled: bool) {
        self.trainer.auto_train = enabled;
    }

    pub fn set_auto_max_epochs(&mut self, max_epochs: u64) {
        self.trainer.auto_max_epochs = max_epochs;
    }

    pub fn set_auto_target_loss(&mut self, target: f32) {
        self.trainer.auto_target_loss = target;
    }

    /// One manual training step. `None` when the dataset is empty.
    pub fn step_train(&mut self) -> Option<BatchStats> {
        let stats = self.trainer.step_once(&self.dataset)?;
        self.field_dirty = true;
        Some(stats)
    }

    /// Per-frame hook: one auto-training step if auto-training is on.
    ///
    /// Returns whether a step was taken.
    pub fn tick(&mut self) -> bool {
        let stepped = self.trainer.step_auto(&self.dataset);
        self.field_dirty |= stepped;
        stepped
    }

    #[inline]
    pub fn last_loss(&self) -> f32 {
        self.trainer.last_loss()
    }

    #[inline]
    pub fn last_accuracy(&self) -> f32 {
        self.trainer.last_accuracy()
    }

    #[inline]
    pub fn epoch_count(&self) -> u64 {
        self.trainer.epoch_count()
    }

    #[inline]
    pub fn is_auto_training(&self) -> bool {
        self.trainer.auto_train
    }

    /// Class probabilities `(p0, p1)` at `(x, y)`.
    #[inline]
    pub fn predict(&self, x: f32, y: f32) -> (f32, f32) {
        self.trainer.network().forward_single(x, y)
    }

    /// Loss and accuracy over the whole dataset, without training.
    pub fn evaluate(&self) -> BatchStats {
        self.trainer.network().evaluate(&self.dataset)
    }

    /// Whether the next `decision_field` call will resample.
    #[inline]
    pub fn is_field_dirty(&self) -> bool {
        self.field_dirty
    }

    /// The decision field for the current parameters, resampled only if the
    /// network changed since the last call.
    pub fn decision_field(&mut self) -> &DecisionField {
        if self.field_dirty {
            self.field.sample(self.trainer.network());
            self.field_dirty = false;
        }
        &self.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Dataset {
        Dataset::from_rows(
            &[[-0.6, 0.1], [-0.5, -0.1], [-0.4, 0.0], [0.4, 0.0], [0.5, 0.1], [0.6, -0.1]],
            &[0, 0, 0, 1, 1, 1],
        )
        .unwrap()
    }

    #[test]
    fn setters_reach_the_trainer() {
        let mut s = Session::new();
        s.set_learning_rate(0.3);
        s.set_batch_size(7);
        s.set_optimizer(OptimizerKind::Adam);
        s.set_momentum(0.5);
        s.set_adam_params(0.8, 0.99, 1e-6);
        s.set_auto_max_epochs(12);
        s.set_auto_target_loss(0.2);

        let t = s.trainer();
        assert_eq!(t.learning_rate, 0.3);
        assert_eq!(t.batch_size, 7);
        assert_eq!(t.optimizer, OptimizerKind::Adam);
        assert_eq!(t.momentum, 0.5);
        assert_eq!((t.adam_beta1, t.adam_beta2, t.adam_eps), (0.8, 0.99, 1e-6));
        assert_eq!(t.auto_max_epochs, 12);
        assert_eq!(t.auto_target_loss, 0.2);
    }

    #[test]
    fn step_train_without_data_is_a_no_op() {
        let mut s = Session::new();
        let _ = s.decision_field();
        assert_eq!(s.step_train(), None);
        assert_eq!(s.epoch_count(), 0);
        assert!(!s.is_field_dirty());
    }

    #[test]
    fn step_train_updates_metrics_and_marks_field() {
        let mut s = Session::new();
        s.set_dataset(blobs());
        let _ = s.decision_field();

        let stats = s.step_train().unwrap();
        assert_eq!(s.epoch_count(), 1);
        assert_eq!(s.last_loss(), stats.loss);
        assert_eq!(s.last_accuracy(), stats.accuracy);
        assert!(s.is_field_dirty());

        let (x, y) = s.decision_field().point(3, 5);
        let p1 = s.predict(x, y).1;
        assert_eq!(s.decision_field().get(3, 5), Some(p1));
        assert!(!s.is_field_dirty());
    }

    #[test]
    fn set_dataset_resets_training() {
        let mut s = Session::new();
        s.set_dataset(blobs());
        s.set_auto_train(true);
        s.step_train();
        s.set_dataset(blobs());
        assert_eq!(s.epoch_count(), 0);
        assert!(!s.is_auto_training());
        assert_eq!(s.dataset().len(), 6);
    }

    #[test]
    fn tick_runs_auto_training_to_the_limit() {
        let mut s = Session::new();
        s.set_dataset(blobs());
        s.set_auto_max_epochs(4);
        s.trainer_mut().use_target_loss_stop = false;
        s.set_auto_train(true);

        let mut ticks = 0;
        while s.tick() {
            ticks += 1;
        }
        assert_eq!(ticks, 4);
        assert!(!s.is_auto_training());
        assert!(!s.tick());
    }

    #[test]
    fn init_mode_change_resets_immediately() {
        let mut s = Session::new();
        s.set_dataset(blobs());
        s.step_train();
        s.set_init_mode(InitMode::Zero);
        assert_eq!(s.epoch_count(), 0);
        assert_eq!(s.predict(0.3, -0.2), (0.5, 0.5));
    }

    #[test]
    fn hidden_resize_goes_through_session() {
        let mut s = Session::new();
        assert!(s.set_hidden_sizes(3, 3));
        assert_eq!(s.trainer().network().w2().len(), 9);
        assert!(s.is_field_dirty());
    }

    #[test]
    fn oversized_field_resolution_is_capped() {
        let s = Session::with_config(TrainerConfig::default(), 1usize << 33);
        assert_eq!(s.field.resolution(), crate::field::MAX_RESOLUTION);
    }

    #[test]
    fn evaluate_covers_the_whole_dataset() {
        let mut s = Session::new();
        assert_eq!(s.evaluate(), BatchStats::default());
        s.set_dataset(blobs());
        let stats = s.evaluate();
        assert!(stats.loss > 0.0);
        assert!((0.0..=1.0).contains(&stats.accuracy));
    }
}
