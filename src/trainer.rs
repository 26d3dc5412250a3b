//! Training orchestration.
//!
//! Composes the sample store, scheduler, learning-rate controller,
//! optimizer driver, evaluator, and checkpoint manager into the two
//! training modes. Everything runs single-threaded and synchronous:
//! each shuffle, optimizer step, evaluation, and checkpoint write runs
//! to completion before the next begins.

use std::time::Instant;

use candle_core::Device;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::batching::{BatchScheduler, BoundaryPolicy};
use crate::checkpoint::CheckpointManager;
use crate::config::{TrainerConfig, TrainingMode};
use crate::dataset::Dataset;
use crate::error::{PdfClassifierError, Result};
use crate::eval::{evaluate, Evaluation};
use crate::lr::{LrController, BASELINE_DECAY_EPOCHS, BASELINE_EVAL_EPOCHS};
use crate::model::{MlpClassifier, Model};
use crate::optimizer::{OptimizerConfig, OptimizerDriver, StepMetrics};

/// Training orchestrator.
///
/// # Example
///
/// ```no_run
/// use pdfclassifier_rs::{Trainer, TrainerConfig};
///
/// # fn main() -> pdfclassifier_rs::Result<()> {
/// let config = TrainerConfig::from_file("config.yaml")?;
/// let mut trainer = Trainer::new(config)?;
/// trainer.train(false)?;
/// # Ok(())
/// # }
/// ```
pub struct Trainer {
    config: TrainerConfig,
    model: Box<dyn Model>,
    rng: StdRng,
}

impl Trainer {
    /// Create a trainer with a freshly initialized reference classifier.
    ///
    /// Validates the configuration before acquiring any resource and
    /// seeds the run's single random generator from the config.
    ///
    /// # Errors
    /// Returns a `Config` error for an invalid configuration, or a model
    /// error if parameter initialization fails.
    pub fn new(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        let model = MlpClassifier::new(config.data.n_features, Device::Cpu)?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            model: Box::new(model),
            rng,
        })
    }

    /// Create a trainer around an externally provided model.
    ///
    /// # Errors
    /// Returns a `Config` error for an invalid configuration or when the
    /// model's input width disagrees with `data.n_features`.
    pub fn with_model(config: TrainerConfig, model: Box<dyn Model>) -> Result<Self> {
        config.validate()?;
        if model.n_features() != config.data.n_features {
            return Err(PdfClassifierError::Config(format!(
                "model expects {} features, data.n_features is {}",
                model.n_features(),
                config.data.n_features
            )));
        }
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self { config, model, rng })
    }

    /// Run training for the configured batch budget, then evaluate and
    /// save a final checkpoint.
    ///
    /// With `resume`, model parameters are restored from the checkpoint
    /// path first; batch and epoch counters still restart at zero
    /// (scheduler state is not part of a checkpoint).
    ///
    /// # Errors
    /// Returns an error on any dataset load/shape failure, training
    /// failure, or checkpoint failure. No retries: a failed operation
    /// aborts the run.
    pub fn train(&mut self, resume: bool) -> Result<()> {
        let checkpoint = CheckpointManager::at_path(self.config.checkpoint_path());

        tracing::info!("loading training dataset {}", self.config.data.train_path);
        let clean_train =
            Dataset::from_libsvm(&self.config.data.train_path, self.config.data.n_features)?;
        tracing::info!("loading testing dataset {}", self.config.data.test_path);
        let test = self.load_test_set()?;

        let mut train = match self.config.mode {
            TrainingMode::Baseline => clean_train,
            TrainingMode::Mixed => self.load_merged_training_set(clean_train)?,
        };
        if train.is_empty() {
            return Err(PdfClassifierError::Dataset(format!(
                "training set {} is empty",
                self.config.data.train_path
            )));
        }
        tracing::info!(
            "training on {} samples, evaluating on {}",
            train.rows(),
            test.rows()
        );

        tracing::info!("shuffling the training dataset");
        train.shuffle(&mut self.rng);

        if resume {
            checkpoint.restore(self.model.as_mut())?;
        } else {
            tracing::info!("initial model as {}", checkpoint.path().display());
        }

        let params = &self.config.training;
        let mut lr = LrController::new(params.learning_rate, params.lr_decay)?;
        let mut driver = OptimizerDriver::new(
            self.model.as_ref(),
            &OptimizerConfig {
                learning_rate: params.learning_rate,
                ..OptimizerConfig::default()
            },
        )?;
        let policy = match self.config.mode {
            TrainingMode::Baseline => BoundaryPolicy::TruncateTail,
            TrainingMode::Mixed => BoundaryPolicy::DoubleStep,
        };
        let mut scheduler = BatchScheduler::new(train.rows(), params.batch_size, policy);

        let bar = ProgressBar::new(params.batch_budget as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{wide_bar}] {pos:>6}/{len:6} {msg}")
                .map_err(|e| PdfClassifierError::Training(e.to_string()))?,
        );

        let mut last_metrics: Option<StepMetrics> = None;
        let mut interval = Instant::now();

        for cur_batch in 0..params.batch_budget {
            let step = scheduler.next_batch();
            let mut metrics =
                driver.step(self.model.as_ref(), &train.batch(step.primary), lr.lr())?;
            if let Some(tail) = step.tail {
                // Extra boundary step on the tail slice; does not consume
                // budget.
                metrics = driver.step(self.model.as_ref(), &train.batch(tail), lr.lr())?;
            }
            bar.set_message(format!("loss {:.4}", metrics.loss));
            bar.inc(1);

            match self.config.mode {
                TrainingMode::Baseline => {
                    if step.wrapped {
                        let epoch = scheduler.epoch();
                        if epoch % BASELINE_DECAY_EPOCHS == 0 {
                            lr.decay();
                            log_progress("epoch", epoch, &metrics, &mut interval);
                        }
                        if epoch % BASELINE_EVAL_EPOCHS == 0 {
                            let result = evaluate(self.model.as_ref(), &test)?;
                            tracing::info!("epoch {epoch} eval test {result}");
                        }
                    }
                }
                TrainingMode::Mixed => {
                    if step.wrapped {
                        tracing::info!("finished epoch {}", scheduler.epoch());
                        tracing::info!("shuffling the training dataset");
                        train.shuffle(&mut self.rng);
                    }
                    if cur_batch != 0 && cur_batch % params.verbose_every == 0 {
                        lr.decay();
                        log_progress("batch", cur_batch, &metrics, &mut interval);
                        let result = evaluate(self.model.as_ref(), &test)?;
                        tracing::info!("*** test {result}");
                    }
                }
            }
            last_metrics = Some(metrics);
        }
        bar.finish_with_message("training complete");

        let epochs_seen =
            (params.batch_budget * params.batch_size) as f64 / train.rows() as f64;
        if let Some(metrics) = &last_metrics {
            tracing::info!(
                "done after {:.2} epochs, final loss {:.4}, train acc {:.4}",
                epochs_seen,
                metrics.loss,
                metrics.accuracy
            );
        }

        let result = evaluate(self.model.as_ref(), &test)?;
        tracing::info!("final eval test {result}");

        checkpoint.save(self.model.as_ref())?;
        Ok(())
    }

    /// Restore the checkpoint and evaluate it against the held-out test
    /// set without training.
    ///
    /// # Errors
    /// Returns an error if the checkpoint is missing or incompatible, or
    /// the test set cannot be loaded.
    pub fn evaluate_only(&mut self) -> Result<Evaluation> {
        let checkpoint = CheckpointManager::at_path(self.config.checkpoint_path());
        checkpoint.restore(self.model.as_mut())?;

        let test = self.load_test_set()?;
        let result = evaluate(self.model.as_ref(), &test)?;
        tracing::info!("eval test {result}");
        Ok(result)
    }

    /// Load the held-out test set. An empty set cannot be evaluated, so
    /// it is rejected here rather than deep inside the metrics code.
    fn load_test_set(&self) -> Result<Dataset> {
        let test =
            Dataset::from_libsvm(&self.config.data.test_path, self.config.data.n_features)?;
        if test.is_empty() {
            return Err(PdfClassifierError::Dataset(format!(
                "test set {} is empty",
                self.config.data.test_path
            )));
        }
        Ok(test)
    }

    /// Load the interval-bound training arrays and merge them with the
    /// clean training set. The interval test arrays are loaded and
    /// shape-validated but only the clean test set feeds the evaluator.
    fn load_merged_training_set(&self, clean_train: Dataset) -> Result<Dataset> {
        let interval = self
            .config
            .data
            .interval
            .as_ref()
            .ok_or_else(|| {
                PdfClassifierError::Config("data.interval is required in mixed mode".into())
            })?;

        tracing::info!("loading training interval dataset {}", interval.train_dir);
        let interval_train = Dataset::from_npy_dir(&interval.train_dir)?;
        if interval_train.n_features() != self.config.data.n_features {
            return Err(PdfClassifierError::Dataset(format!(
                "{}: interval vectors have {} features, expected {}",
                interval.train_dir,
                interval_train.n_features(),
                self.config.data.n_features
            )));
        }

        tracing::info!("loading testing interval dataset {}", interval.test_dir);
        let interval_test = Dataset::from_npy_dir(&interval.test_dir)?;
        tracing::info!(
            "interval sets: {} train rows, {} test rows",
            interval_train.rows(),
            interval_test.rows()
        );

        tracing::info!("concatenating the training datasets");
        Dataset::merge(clean_train, interval_train)
    }
}

fn log_progress(unit: &str, count: usize, metrics: &StepMetrics, interval: &mut Instant) {
    let fpr = metrics
        .false_positive_rate
        .map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"));
    tracing::info!(
        "{unit} {count} loss {:.4} train acc {:.4} train fpr {fpr} interval time {:.2}s",
        metrics.loss,
        metrics.accuracy,
        interval.elapsed().as_secs_f64()
    );
    *interval = Instant::now();
}
