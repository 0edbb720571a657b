//! Trainer configuration.
//!
//! `TrainerConfig` is a snapshot of every knob a control panel can turn. The
//! trainer exposes the same values as public fields; this type exists so a
//! whole setup can be captured, restored, or (feature `serde`) stored as JSON.
//!
//! Values are not validated here. The trainer and network clamp them where
//! they are used, so a half-edited config never stops training.

use crate::{
    HISTORY_SIZE, HiddenSizes, InitMode, MAX_BATCH, MAX_HISTORY_SIZE, OptimizerConfig,
    OptimizerKind,
};

#[cfg(feature = "serde")]
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrainerConfig {
    pub learning_rate: f32,
    pub batch_size: usize,
    pub optimizer: OptimizerKind,
    pub momentum: f32,
    pub adam_beta1: f32,
    pub adam_beta2: f32,
    pub adam_eps: f32,
    pub init_mode: InitMode,
    pub seed: u64,
    pub hidden1: usize,
    pub hidden2: usize,
    pub auto_train: bool,
    pub auto_max_epochs: u64,
    pub auto_target_loss: f32,
    pub use_target_loss_stop: bool,
    pub history_size: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        let opt = OptimizerConfig::default();
        Self {
            learning_rate: opt.learning_rate,
            batch_size: 64,
            optimizer: opt.kind,
            momentum: opt.momentum,
            adam_beta1: opt.beta1,
            adam_beta2: opt.beta2,
            adam_eps: opt.eps,
            init_mode: InitMode::HeUniform,
            seed: 1,
            hidden1: HiddenSizes::DEFAULT_HIDDEN1,
            hidden2: HiddenSizes::DEFAULT_HIDDEN2,
            auto_train: false,
            auto_max_epochs: 2500,
            auto_target_loss: 0.01,
            use_target_loss_stop: true,
            history_size: HISTORY_SIZE,
        }
    }
}

impl TrainerConfig {
    /// Optimizer settings as pushed into the network before each step.
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

    /// Hidden widths after clamping.
    pub fn hidden_sizes(&self) -> HiddenSizes {
        HiddenSizes::new(self.hidden1, self.hidden2)
    }

    /// Copy with every field clamped to the range the trainer would use.
    pub fn sanitized(&self) -> Self {
        let opt = self.optimizer_config().sanitized();
        let sizes = self.hidden_sizes();
        Self {
            learning_rate: opt.learning_rate,
            batch_size: self.batch_size.clamp(1, MAX_BATCH),
            momentum: opt.momentum,
            adam_beta1: opt.beta1,
            adam_beta2: opt.beta2,
            adam_eps: opt.eps,
            hidden1: sizes.hidden1,
            hidden2: sizes.hidden2,
            history_size: self.history_size.clamp(1, MAX_HISTORY_SIZE),
            ..*self
        }
    }
}

#[cfg(feature = "serde")]
impl TrainerConfig {
    /// Serialize to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::InvalidConfig(format!("failed to serialize config: {e}")))
    }

    /// Parse from JSON. Missing fields take their default values.
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map_err(|e| Error::InvalidConfig(format!("failed to parse config json: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_setup() {
        let cfg = TrainerConfig::default();
        assert_eq!(cfg.learning_rate, 0.1);
        assert_eq!(cfg.batch_size, 64);
        assert_eq!(cfg.optimizer, OptimizerKind::Sgd);
        assert_eq!(cfg.auto_max_epochs, 2500);
        assert_eq!(cfg.auto_target_loss, 0.01);
        assert_eq!(cfg.hidden_sizes(), HiddenSizes::default());
        assert!(!cfg.auto_train);
    }

    #[test]
    fn sanitized_clamps_everything() {
        let cfg = TrainerConfig {
            learning_rate: f32::NAN,
            batch_size: 0,
            momentum: 2.0,
            hidden1: 0,
            hidden2: 1_000,
            history_size: 0,
            ..TrainerConfig::default()
        }
        .sanitized();

        assert_eq!(cfg.learning_rate, 0.0);
        assert_eq!(cfg.batch_size, 1);
        assert!(cfg.momentum < 1.0);
        assert_eq!(cfg.hidden1, crate::MIN_HIDDEN);
        assert_eq!(cfg.hidden2, crate::MAX_HIDDEN);
        assert_eq!(cfg.history_size, 1);

        let big = TrainerConfig {
            batch_size: 10_000,
            history_size: usize::MAX,
            ..TrainerConfig::default()
        }
        .sanitized();
        assert_eq!(big.batch_size, MAX_BATCH);
        assert_eq!(big.history_size, MAX_HISTORY_SIZE);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_roundtrip_and_partial_input() {
        let cfg = TrainerConfig {
            optimizer: OptimizerKind::Adam,
            init_mode: InitMode::HeNormal,
            batch_size: 32,
            ..TrainerConfig::default()
        };
        let json = cfg.to_json_string_pretty().unwrap();
        assert!(json.contains("\"adam\""), "{json}");
        assert!(json.contains("\"he_normal\""), "{json}");
        assert_eq!(TrainerConfig::from_json_str(&json).unwrap(), cfg);

        let partial = TrainerConfig::from_json_str(r#"{"learning_rate": 0.5}"#).unwrap();
        assert_eq!(partial.learning_rate, 0.5);
        assert_eq!(partial.batch_size, 64);

        let err = TrainerConfig::from_json_str("{").unwrap_err();
        assert!(format!("{err}").contains("config"));
    }
}
