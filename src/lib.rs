//! # pdfclassifier-rs
//!
//! YAML-driven training toolkit for a binary PDF malware classifier,
//! with optional adversarial hardening.
//!
//! Two training modes share one orchestration loop:
//!
//! - **baseline** trains on the clean libsvm dataset only, decaying the
//!   learning rate and evaluating on fixed epoch cadences.
//! - **mixed** concatenates the clean dataset with interval-bound
//!   (adversarially perturbed) samples, reshuffles at every epoch
//!   boundary, and decays/evaluates on a batch-step cadence.
//!
//! ## Quick Start (CLI)
//!
//! ```bash
//! # Generate a sample configuration
//! pdfclassifier init config.yaml --preset mixed
//!
//! # Validate configuration
//! pdfclassifier validate config.yaml
//!
//! # Start training
//! pdfclassifier train config.yaml
//!
//! # Evaluate a saved checkpoint
//! pdfclassifier evaluate config.yaml
//! ```
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! use pdfclassifier_rs::{Trainer, TrainerConfig};
//!
//! # fn main() -> pdfclassifier_rs::Result<()> {
//! // Load configuration from YAML file
//! let config = TrainerConfig::from_file("config.yaml")?;
//!
//! // Create trainer and start training
//! let mut trainer = Trainer::new(config)?;
//! trainer.train(false)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Using Presets
//!
//! ```rust
//! use pdfclassifier_rs::TrainerConfig;
//!
//! # fn main() -> pdfclassifier_rs::Result<()> {
//! // Create mutable config from preset
//! let mut config = TrainerConfig::from_preset("baseline")?;
//!
//! // Customize as needed
//! config.training.batch_budget = 1000;
//! config.training.learning_rate = 1e-4;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod batching;
pub mod checkpoint;
pub mod config;
pub mod dataset;
pub mod error;
pub mod eval;
pub mod lr;
pub mod model;
pub mod optimizer;
pub mod trainer;

pub use batching::{BatchScheduler, BoundaryPolicy, ScheduledBatch};
pub use checkpoint::CheckpointManager;
pub use config::{TrainerConfig, TrainingMode, TrainingParams};
pub use dataset::{BatchView, Dataset};
pub use error::{PdfClassifierError, Result};
pub use eval::{evaluate, ConfusionMatrix, Evaluation};
pub use lr::LrController;
pub use model::{MlpClassifier, Model};
pub use optimizer::{OptimizerConfig, OptimizerDriver, StepMetrics};
pub use trainer::Trainer;
