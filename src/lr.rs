//! Learning-rate control.
//!
//! A single mutable scalar decayed multiplicatively on a fixed cadence
//! owned by the orchestrator: baseline training decays every
//! [`BASELINE_DECAY_EPOCHS`] epochs and evaluates every
//! [`BASELINE_EVAL_EPOCHS`] epochs; mixed training decays and evaluates
//! every `verbose_every` raw batch-steps.

use crate::error::{PdfClassifierError, Result};

/// Baseline training decays the learning rate every this many epochs.
pub const BASELINE_DECAY_EPOCHS: usize = 10;
/// Baseline training evaluates against held-out data every this many
/// epochs (a coarser cadence than decay).
pub const BASELINE_EVAL_EPOCHS: usize = 20;

/// Owns the current learning rate and its decay factor.
#[derive(Debug, Clone)]
pub struct LrController {
    current: f64,
    decay_factor: f64,
}

impl LrController {
    /// Create a controller.
    ///
    /// # Errors
    /// Returns a `Config` error unless `initial > 0` and
    /// `decay_factor` is in `(0, 1]` (a factor of 1 is a no-op).
    pub fn new(initial: f64, decay_factor: f64) -> Result<Self> {
        if initial <= 0.0 {
            return Err(PdfClassifierError::Config(
                "learning rate must be > 0".into(),
            ));
        }
        if decay_factor <= 0.0 || decay_factor > 1.0 {
            return Err(PdfClassifierError::Config(
                "decay factor must be in (0, 1]".into(),
            ));
        }
        Ok(Self {
            current: initial,
            decay_factor,
        })
    }

    /// Current learning rate.
    #[must_use]
    pub fn lr(&self) -> f64 {
        self.current
    }

    /// Apply one multiplicative decay step.
    pub fn decay(&mut self) {
        self.current *= self.decay_factor;
    }
}
