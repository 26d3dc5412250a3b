//! Checkpoint save and restore.

use std::path::{Path, PathBuf};

use crate::error::{PdfClassifierError, Result};
use crate::model::Model;

/// Saves and restores model parameters at a templated path
/// (`<dir>/<model_name>.safetensors`).
///
/// Saves go through a temporary file in the same directory followed by a
/// rename, so a crash mid-save never corrupts a prior checkpoint.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    path: PathBuf,
}

impl CheckpointManager {
    /// Manager for the checkpoint named `model_name` under `dir`.
    pub fn new<P: AsRef<Path>>(dir: P, model_name: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{model_name}.safetensors")),
        }
    }

    /// Manager for an explicit checkpoint path.
    pub fn at_path<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// The checkpoint path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably persist the model's parameters, overwriting any prior
    /// checkpoint at this path.
    ///
    /// # Errors
    /// Returns a `Checkpoint` error if the directory cannot be created or
    /// the parameters cannot be written.
    pub fn save(&self, model: &dyn Model) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("safetensors.tmp");
        model.vars().save(&tmp).map_err(|e| {
            PdfClassifierError::Checkpoint(format!(
                "failed to write {}: {e}",
                tmp.display()
            ))
        })?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::info!("model saved to {}", self.path.display());
        Ok(())
    }

    /// Load parameters into the model.
    ///
    /// # Errors
    /// Returns a `Checkpoint` error if the path does not exist or any
    /// tensor name or shape is incompatible with the model's parameters;
    /// nothing is silently truncated or padded.
    pub fn restore(&self, model: &mut dyn Model) -> Result<()> {
        if !self.path.exists() {
            return Err(PdfClassifierError::Checkpoint(format!(
                "checkpoint not found: {}",
                self.path.display()
            )));
        }
        model.vars_mut().load(&self.path).map_err(|e| {
            PdfClassifierError::Checkpoint(format!(
                "failed to load {}: {e}",
                self.path.display()
            ))
        })?;
        tracing::info!("model loaded from {}", self.path.display());
        Ok(())
    }
}
