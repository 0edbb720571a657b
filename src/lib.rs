//! A tiny, fully inspectable 2D binary classifier.
//!
//! `toynet` trains a fixed-topology multilayer perceptron
//! (2 → H1 → H2 → 2, ReLU hidden layers, softmax output) on labelled points in
//! the plane. It is the numerical core of an interactive visualization: the
//! caller draws the decision boundary, weights and loss curve while tweaking
//! hyperparameters, and the engine advances one optimizer step per call.
//!
//! # Design goals
//!
//! - Predictable per-frame cost: every buffer is allocated up front and reused.
//!   `Trainer::train_one_epoch` and `Network::forward_single` do not allocate.
//! - Forgiving inputs: out-of-range hyperparameters are clamped where they are
//!   used, empty batches are no-ops, degenerate logits give neutral outputs.
//! - Inspectability: weights, gradients and hidden activations are all
//!   readable.
//!
//! # Panics vs `Result`
//!
//! - Internal buffer-shape mismatches are programmer error and panic via
//!   `assert!` at the top of [`Network::train_batch`].
//! - Constructing data ([`DataPoint::new`], [`Dataset::from_points`]) and
//!   parsing a [`TrainerConfig`] from JSON return [`Result`].
//! - Nothing on the training hot path returns an error.
//!
//! # Data layout
//!
//! - Scalars are `f32`.
//! - Layer weights are row-major with shape `(out_dim, in_dim)`.
//! - Per-batch scratch is `MAX_BATCH × width`, row-major by sample.
//!
//! # Quick start
//!
//! ```rust
//! use toynet::{DataPoint, Dataset, OptimizerKind, Trainer};
//!
//! # fn main() -> toynet::Result<()> {
//! let data = Dataset::from_rows(
//!     &[[-0.5, 0.0], [-0.4, 0.1], [0.5, 0.0], [0.4, -0.1]],
//!     &[0, 0, 1, 1],
//! )?;
//!
//! let mut trainer = Trainer::default();
//! trainer.optimizer = OptimizerKind::Adam;
//! trainer.learning_rate = 0.01;
//! trainer.reset_for_new_dataset();
//!
//! for _ in 0..100 {
//!     trainer.train_one_epoch(&data);
//! }
//! assert_eq!(trainer.epoch_count(), 100);
//!
//! let (p0, p1) = trainer.network().forward_single(0.5, 0.0);
//! assert!((p0 + p1 - 1.0).abs() < 1e-5);
//! # let _ = DataPoint::new(0.0, 0.0, 1)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Auto-training
//!
//! ```rust
//! use toynet::{Dataset, Trainer};
//!
//! # fn main() -> toynet::Result<()> {
//! let data = Dataset::from_rows(&[[-0.5, 0.0], [0.5, 0.0]], &[0, 1])?;
//! let mut trainer = Trainer::default();
//! trainer.auto_train = true;
//! trainer.auto_max_epochs = 10;
//! trainer.use_target_loss_stop = false;
//!
//! // Once per frame:
//! while trainer.auto_train_epochs(&data) {}
//! assert_eq!(trainer.epoch_count(), 10);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod config;
pub mod data;
pub mod error;
pub mod field;
pub mod history;
pub mod layer;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod optim;
pub mod session;
pub mod trainer;

pub use config::TrainerConfig;
pub use data::{DataPoint, Dataset};
pub use error::{Error, Result};
pub use field::DecisionField;
pub use history::{HISTORY_SIZE, History, MAX_HISTORY_SIZE};
pub use layer::{InitMode, Layer};
pub use metrics::BatchStats;
pub use network::{Activations, Gradients, HiddenSizes, Network};
pub use optim::{OptimizerConfig, OptimizerKind, OptimizerState};
pub use session::Session;
pub use trainer::Trainer;

/// Input features per point (`x`, `y`).
pub const INPUT_DIM: usize = 2;

/// Number of classes.
pub const OUTPUT_DIM: usize = 2;

/// Largest batch a single training step will use.
pub const MAX_BATCH: usize = 256;

/// Smallest allowed hidden-layer width.
pub const MIN_HIDDEN: usize = 1;

/// Largest allowed hidden-layer width.
pub const MAX_HIDDEN: usize = 32;
