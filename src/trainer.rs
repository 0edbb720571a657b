//! Step-at-a-time training driver.
//!
//! `Trainer` owns a `Network` and everything a frame loop needs around it: a
//! cyclic batch cursor, the latest metrics, a bounded history and the
//! auto-train stop condition. Hyperparameters are public fields; they are
//! pushed into the network at the start of every step, so edits take effect
//! on the next call.

use crate::{
    BatchStats, DataPoint, History, InitMode, MAX_BATCH, Network, OptimizerConfig,
    OptimizerKind, TrainerConfig,
};

#[derive(Debug, Clone)]
pub struct Trainer {
    pub learning_rate: f32,
    /// Clamped to `[1, MAX_BATCH]` when a batch is drawn.
    pub batch_size: usize,
    pub optimizer: OptimizerKind,
    pub momentum: f32,
    pub adam_beta1: f32,
    pub adam_beta2: f32,
    pub adam_eps: f32,
    /// Applied on the next reset.
    pub init_mode: InitMode,
    /// Applied on the next reset.
    pub seed: u64,
    pub auto_train: bool,
    pub auto_max_epochs: u64,
    pub auto_target_loss: f32,
    pub use_target_loss_stop: bool,

    net: Network,
    epoch_count: u64,
    last_loss: f32,
    last_accuracy: f32,
    history: History,
    batch: Vec<DataPoint>,
    cursor: usize,
}

impl Default for Trainer {
    fn default() -> Self {
        Self::from_config(TrainerConfig::default())
    }
}

impl Trainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a trainer with freshly initialized parameters from `cfg`.
    ///
    /// Unlike `reset_for_new_dataset`, this keeps `cfg.auto_train`.
    pub fn from_config(cfg: TrainerConfig) -> Self {
        let cfg = cfg.sanitized();
        let mut trainer = Self {
            learning_rate: cfg.learning_rate,
            batch_size: cfg.batch_size,
            optimizer: cfg.optimizer,
            momentum: cfg.momentum,
            adam_beta1: cfg.adam_beta1,
            adam_beta2: cfg.adam_beta2,
            adam_eps: cfg.adam_eps,
            init_mode: cfg.init_mode,
            seed: cfg.seed,
            auto_train: cfg.auto_train,
            auto_max_epochs: cfg.auto_max_epochs,
            auto_target_loss: cfg.auto_target_loss,
            use_target_loss_stop: cfg.use_target_loss_stop,

            net: Network::new(cfg.hidden_sizes()),
            epoch_count: 0,
            last_loss: 0.0,
            last_accuracy: 0.0,
            history: History::with_capacity(cfg.history_size),
            batch: Vec::with_capacity(MAX_BATCH),
            cursor: 0,
        };
        trainer.reset_state();
        trainer
    }

    #[inline]
    pub fn network(&self) -> &Network {
        &self.net
    }

    /// Direct access for inspection tools. Hidden sizes should be changed
    /// through `Trainer::set_hidden_sizes` so the trainer state is reset too.
    #[inline]
    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.net
    }

    /// Steps taken since the last reset. One step is one batch.
    #[inline]
    pub fn epoch_count(&self) -> u64 {
        self.epoch_count
    }

    /// Loss of the most recent step, `0` before the first one.
    #[inline]
    pub fn last_loss(&self) -> f32 {
        self.last_loss
    }

    /// Accuracy of the most recent step, `0` before the first one.
    #[inline]
    pub fn last_accuracy(&self) -> f32 {
        self.last_accuracy
    }

    #[inline]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Index of the next point `make_batch` will draw.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Optimizer settings built from the public fields.
    pub fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig {
            kind: self.optimizer,
            learning_rate: self.learning_rate,
            momentum: self.momentum,
            beta1: self.adam_beta1,
            beta2: self.adam_beta2,
            eps: self.adam_eps,
        }
    }

    /// Start over on a new (or edited) dataset.
    ///
    /// Re-initializes parameters with `init_mode` and `seed`, clears the
    /// optimizer state, counters, metrics and history, rewinds the cursor and
    /// turns auto-training off.
    pub fn reset_for_new_dataset(&mut self) {
        self.reset_state();
        self.auto_train = false;
        log::info!(
            "trainer reset: init={:?} seed={} hidden={}x{}",
            self.init_mode,
            self.seed,
            self.net.hidden_sizes().hidden1,
            self.net.hidden_sizes().hidden2
        );
    }

    fn reset_state(&mut self) {
        self.net.set_init_mode(self.init_mode);
        self.net.set_optimizer_config(self.optimizer_config());
        self.net.reset_parameters(self.seed);
        self.epoch_count = 0;
        self.last_loss = 0.0;
        self.last_accuracy = 0.0;
        self.history.clear();
        self.batch.clear();
        self.cursor = 0;
    }

    /// Change the hidden widths (clamped into bounds) and reset.
    ///
    /// The reset happens even when the widths are unchanged. Returns whether
    /// the widths changed.
    pub fn set_hidden_sizes(&mut self, hidden1: usize, hidden2: usize) -> bool {
        let changed = self.net.set_hidden_sizes(hidden1, hidden2);
        self.reset_for_new_dataset();
        changed
    }

    /// Draw the next batch from `data`, walking a cursor that wraps around.
    ///
    /// The batch holds `batch_size` points clamped to `[1, MAX_BATCH]`; a
    /// dataset smaller than that is repeated. Empty `data` gives an empty batch.
    pub fn make_batch(&mut self, data: &[DataPoint]) -> &[DataPoint] {
        self.fill_batch(data);
        &self.batch
    }

    fn fill_batch(&mut self, data: &[DataPoint]) {
        self.batch.clear();
        if data.is_empty() {
            return;
        }
        // The dataset may have shrunk since the last step.
        if self.cursor >= data.len() {
            self.cursor = 0;
        }

        let size = self.batch_size.clamp(1, MAX_BATCH);
        for _ in 0..size {
            self.batch.push(data[self.cursor]);
            self.cursor = (self.cursor + 1) % data.len();
        }
    }

    /// Run exactly one optimizer step on the next batch of `data`.
    ///
    /// Returns `None` (and changes nothing) when `data` is empty.
    pub fn train_one_epoch(&mut self, data: &[DataPoint]) -> Option<BatchStats> {
        if data.is_empty() {
            return None;
        }

        self.net.set_optimizer_config(self.optimizer_config());
        self.fill_batch(data);

        let stats = self.net.train_batch(&self.batch);
        self.epoch_count += 1;
        self.last_loss = stats.loss;
        self.last_accuracy = stats.accuracy;
        self.history.push(stats.loss, stats.accuracy);

        log::trace!(
            "epoch {} loss={:.5} acc={:.3} cursor={}",
            self.epoch_count,
            stats.loss,
            stats.accuracy,
            self.cursor
        );
        Some(stats)
    }

    /// Alias for `train_one_epoch`.
    #[inline]
    pub fn step_once(&mut self, data: &[DataPoint]) -> Option<BatchStats> {
        self.train_one_epoch(data)
    }

    /// One auto-training step, meant to be called once per frame.
    ///
    /// Does nothing and returns `false` when `auto_train` is off. Otherwise
    /// takes one step, then switches `auto_train` off once `auto_max_epochs`
    /// steps have run or (with `use_target_loss_stop`) the loss reached
    /// `auto_target_loss`. Returns whether a step was taken.
    ///
    /// With empty `data` no step is possible: auto-training is switched off
    /// and `false` is returned.
    pub fn auto_train_epochs(&mut self, data: &[DataPoint]) -> bool {
        if !self.auto_train {
            return false;
        }
        if self.train_one_epoch(data).is_none() {
            log::info!("auto-train stopped: dataset is empty");
            self.auto_train = false;
            return false;
        }

        let hit_max = self.epoch_count >= self.auto_max_epochs;
        let hit_target = self.use_target_loss_stop && self.last_loss <= self.auto_target_loss;
        if hit_max || hit_target {
            self.auto_train = false;
            log::info!(
                "auto-train stopped after {} epochs: loss={:.5} acc={:.3} ({})",
                self.epoch_count,
                self.last_loss,
                self.last_accuracy,
                if hit_max { "epoch limit" } else { "target loss" }
            );
        }
        true
    }

    /// Alias for `auto_train_epochs`.
    #[inline]
    pub fn step_auto(&mut self, data: &[DataPoint]) -> bool {
        self.auto_train_epochs(data)
    }

    /// Snapshot of every tunable setting.
    pub fn config(&self) -> TrainerConfig {
        let sizes = self.net.hidden_sizes();
        TrainerConfig {
            learning_rate: self.learning_rate,
            batch_size: self.batch_size,
            optimizer: self.optimizer,
            momentum: self.momentum,
            adam_beta1: self.adam_beta1,
            adam_beta2: self.adam_beta2,
            adam_eps: self.adam_eps,
            init_mode: self.init_mode,
            seed: self.seed,
            hidden1: sizes.hidden1,
            hidden2: sizes.hidden2,
            auto_train: self.auto_train,
            auto_max_epochs: self.auto_max_epochs,
            auto_target_loss: self.auto_target_loss,
            use_target_loss_stop: self.use_target_loss_stop,
            history_size: self.history.capacity(),
        }
    }

    /// Restore every setting from `cfg` (clamped), then reset.
    ///
    /// `cfg.auto_train` is kept, so a restored session can resume running.
    pub fn apply_config(&mut self, cfg: TrainerConfig) {
        let cfg = cfg.sanitized();
        log::debug!("applying trainer config: {cfg:?}");

        self.learning_rate = cfg.learning_rate;
        self.batch_size = cfg.batch_size;
        self.optimizer = cfg.optimizer;
        self.momentum = cfg.momentum;
        self.adam_beta1 = cfg.adam_beta1;
        self.adam_beta2 = cfg.adam_beta2;
        self.adam_eps = cfg.adam_eps;
        self.init_mode = cfg.init_mode;
        self.seed = cfg.seed;
        self.auto_max_epochs = cfg.auto_max_epochs;
        self.auto_target_loss = cfg.auto_target_loss;
        self.use_target_loss_stop = cfg.use_target_loss_stop;

        if cfg.history_size != self.history.capacity() {
            self.history = History::with_capacity(cfg.history_size);
        }
        self.net.set_hidden_sizes(cfg.hidden1, cfg.hidden2);
        self.reset_state();
        self.auto_train = cfg.auto_train;
    }
}
