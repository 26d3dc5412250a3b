//! Optimizer driver issuing single training steps against the model.

use candle_nn::{Optimizer, ParamsAdamW, VarMap};

use crate::dataset::BatchView;
use crate::error::{PdfClassifierError, Result};
use crate::eval::classification_metrics;
use crate::model::{batch_tensors, Model};

/// Optimizer hyperparameters.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Initial learning rate.
    pub learning_rate: f64,
    /// Beta1 for Adam.
    pub beta1: f64,
    /// Beta2 for Adam.
    pub beta2: f64,
    /// Weight decay.
    pub weight_decay: f64,
    /// Epsilon for numerical stability.
    pub eps: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            weight_decay: 0.0,
            eps: 1e-8,
        }
    }
}

impl OptimizerConfig {
    /// Create an AdamW optimizer over the given parameters.
    ///
    /// # Errors
    /// Returns an error if the optimizer cannot be created.
    pub fn build_adamw(&self, varmap: &VarMap) -> Result<AdamWOptimizer> {
        let params = ParamsAdamW {
            lr: self.learning_rate,
            beta1: self.beta1,
            beta2: self.beta2,
            eps: self.eps,
            weight_decay: self.weight_decay,
        };
        let opt = candle_nn::AdamW::new(varmap.all_vars(), params)
            .map_err(|e| PdfClassifierError::Training(format!("failed to create AdamW: {e}")))?;
        Ok(AdamWOptimizer { inner: opt })
    }
}

/// AdamW optimizer wrapper.
pub struct AdamWOptimizer {
    inner: candle_nn::AdamW,
}

impl AdamWOptimizer {
    /// Perform a single backward/update step from a loss tensor.
    ///
    /// # Errors
    /// Returns an error if the step fails.
    pub fn step(&mut self, loss: &candle_core::Tensor) -> Result<()> {
        self.inner
            .backward_step(loss)
            .map_err(|e| PdfClassifierError::Training(format!("optimizer step failed: {e}")))
    }

    /// Current learning rate.
    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        self.inner.learning_rate()
    }

    /// Set the learning rate (driven by the orchestrator's controller).
    pub fn set_learning_rate(&mut self, lr: f64) {
        self.inner.set_learning_rate(lr);
    }
}

/// Metrics for a single training step, over that batch only.
#[derive(Debug, Clone)]
pub struct StepMetrics {
    /// Cross-entropy loss for the batch.
    pub loss: f64,
    /// Training accuracy over the batch.
    pub accuracy: f64,
    /// Training false-positive rate over the batch, absent when the
    /// batch's labels are single-class.
    pub false_positive_rate: Option<f64>,
}

/// Issues one parameter-update step at a time against the model.
pub struct OptimizerDriver {
    optimizer: AdamWOptimizer,
}

impl OptimizerDriver {
    /// Build a driver over a model's trainable parameters.
    ///
    /// # Errors
    /// Returns an error if the optimizer cannot be created.
    pub fn new(model: &dyn Model, config: &OptimizerConfig) -> Result<Self> {
        Ok(Self {
            optimizer: config.build_adamw(model.vars())?,
        })
    }

    /// Run one training step on `batch` at the given learning rate and
    /// return loss plus per-batch metrics. Mutates model parameters;
    /// control flow (cadence, budget) is entirely the caller's.
    ///
    /// # Errors
    /// Returns an error if the forward or backward pass fails.
    pub fn step(
        &mut self,
        model: &dyn Model,
        batch: &BatchView<'_>,
        lr: f64,
    ) -> Result<StepMetrics> {
        self.optimizer.set_learning_rate(lr);

        let (x, y) = batch_tensors(batch, model.device())?;
        let loss = model.loss(&x, &y)?;
        self.optimizer.step(&loss)?;

        let loss_value = f64::from(loss.to_vec0::<f32>()?);
        let predictions = model.predict(&x)?;
        let metrics = classification_metrics(batch.labels, &predictions);

        Ok(StepMetrics {
            loss: loss_value,
            accuracy: metrics.accuracy,
            false_positive_rate: metrics.false_positive_rate,
        })
    }
}
