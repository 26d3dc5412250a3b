//! Configuration parsing and validation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PdfClassifierError, Result};

/// Main configuration for a training or evaluation run.
///
/// The configuration is an immutable value passed explicitly into every
/// component that needs it; there is no ambient/global settings object.
///
/// # Example
///
/// ```rust
/// use pdfclassifier_rs::TrainerConfig;
///
/// let config = TrainerConfig::baseline_preset();
/// config.validate().unwrap();
/// assert_eq!(config.training.batch_size, 50);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Training mode.
    #[serde(default)]
    pub mode: TrainingMode,

    /// Dataset locations and shape.
    pub data: DataConfig,

    /// Training hyperparameters.
    #[serde(default)]
    pub training: TrainingParams,

    /// Name under which the checkpoint is saved.
    pub model_name: String,

    /// Directory holding model checkpoints.
    #[serde(default = "default_model_dir")]
    pub model_dir: String,

    /// Seed for the process-wide random generator used by every shuffle.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_model_dir() -> String {
    "./models/adv_trained".into()
}

fn default_seed() -> u64 {
    42
}

/// Training mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingMode {
    /// Plain training over the clean dataset only.
    Baseline,
    /// Training over the clean dataset concatenated with the
    /// interval-bound (adversarially perturbed) dataset.
    #[default]
    Mixed,
}

/// Dataset configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the clean training set (sparse libsvm format).
    pub train_path: String,

    /// Path to the clean held-out test set (sparse libsvm format).
    pub test_path: String,

    /// Fixed feature dimensionality agreed with the model.
    #[serde(default = "default_n_features")]
    pub n_features: usize,

    /// Interval-bound datasets, required in mixed mode.
    #[serde(default)]
    pub interval: Option<IntervalConfig>,
}

fn default_n_features() -> usize {
    3514
}

/// Locations of the interval-bound datasets.
///
/// Each directory holds a dense feature matrix (`vectors_all.npy`) and a
/// label vector (`y_input.npy`) of matching row count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalConfig {
    /// Directory with the training interval arrays.
    pub train_dir: String,
    /// Directory with the testing interval arrays.
    pub test_dir: String,
}

/// Training hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingParams {
    /// Samples per optimizer step.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Total number of scheduler steps; epochs are an emergent byproduct
    /// of dividing this budget by the dataset size.
    #[serde(default = "default_batch_budget")]
    pub batch_budget: usize,

    /// Initial learning rate.
    #[serde(default = "default_lr")]
    pub learning_rate: f64,

    /// Multiplicative decay factor in (0, 1]; 1 disables decay.
    #[serde(default = "default_lr_decay")]
    pub lr_decay: f64,

    /// Mixed mode decays the learning rate and reports progress every
    /// this many batch-steps.
    #[serde(default = "default_verbose_every")]
    pub verbose_every: usize,
}

fn default_batch_size() -> usize {
    50
}
fn default_batch_budget() -> usize {
    30
}
fn default_lr() -> f64 {
    0.001
}
fn default_lr_decay() -> f64 {
    1.0
}
fn default_verbose_every() -> usize {
    500
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_budget: default_batch_budget(),
            learning_rate: default_lr(),
            lr_decay: default_lr_decay(),
            verbose_every: default_verbose_every(),
        }
    }
}

impl TrainerConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create a configuration from a preset name (`baseline` or `mixed`).
    ///
    /// # Errors
    /// Returns a `Config` error for an unknown preset.
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "baseline" => Ok(Self::baseline_preset()),
            "mixed" => Ok(Self::mixed_preset()),
            _ => Err(PdfClassifierError::Config(format!(
                "unknown preset: {preset}"
            ))),
        }
    }

    /// Preset for plain training on the clean dataset.
    #[must_use]
    pub fn baseline_preset() -> Self {
        Self {
            mode: TrainingMode::Baseline,
            data: DataConfig {
                train_path: "./data/traintest_all_500test/train_data.libsvm".into(),
                test_path: "./data/traintest_all_500test/test_data.libsvm".into(),
                n_features: default_n_features(),
                interval: None,
            },
            training: TrainingParams::default(),
            model_name: "baseline_checkpoint".into(),
            model_dir: default_model_dir(),
            seed: default_seed(),
        }
    }

    /// Preset for adversarial-mixed training.
    #[must_use]
    pub fn mixed_preset() -> Self {
        Self {
            mode: TrainingMode::Mixed,
            data: DataConfig {
                train_path: "./data/traintest_all_500test/train_data.libsvm".into(),
                test_path: "./data/traintest_all_500test/test_data.libsvm".into(),
                n_features: default_n_features(),
                interval: Some(IntervalConfig {
                    train_dir: "./data/interval/train".into(),
                    test_dir: "./data/interval/test".into(),
                }),
            },
            training: TrainingParams::default(),
            model_name: "adv_trained".into(),
            model_dir: default_model_dir(),
            seed: default_seed(),
        }
    }

    /// Path the checkpoint is saved to and restored from.
    #[must_use]
    pub fn checkpoint_path(&self) -> PathBuf {
        Path::new(&self.model_dir).join(format!("{}.safetensors", self.model_name))
    }

    /// Validate the configuration.
    ///
    /// Runs before any dataset or model resource is acquired, so an
    /// unresolvable checkpoint name or malformed hyperparameter fails
    /// fast as a configuration error.
    ///
    /// # Errors
    /// Returns a `Config` error naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.model_name.is_empty() {
            return Err(PdfClassifierError::Config(
                "model_name is required to resolve the checkpoint path".into(),
            ));
        }
        if self.data.train_path.is_empty() {
            return Err(PdfClassifierError::Config("data.train_path is required".into()));
        }
        if self.data.test_path.is_empty() {
            return Err(PdfClassifierError::Config("data.test_path is required".into()));
        }
        if self.data.n_features == 0 {
            return Err(PdfClassifierError::Config("data.n_features must be > 0".into()));
        }
        if self.training.batch_size == 0 {
            return Err(PdfClassifierError::Config(
                "training.batch_size must be > 0".into(),
            ));
        }
        if self.training.batch_budget == 0 {
            return Err(PdfClassifierError::Config(
                "training.batch_budget must be > 0".into(),
            ));
        }
        if self.training.learning_rate <= 0.0 {
            return Err(PdfClassifierError::Config(
                "training.learning_rate must be > 0".into(),
            ));
        }
        if self.training.lr_decay <= 0.0 || self.training.lr_decay > 1.0 {
            return Err(PdfClassifierError::Config(
                "training.lr_decay must be in (0, 1]".into(),
            ));
        }
        if self.training.verbose_every == 0 {
            return Err(PdfClassifierError::Config(
                "training.verbose_every must be > 0".into(),
            ));
        }
        if self.mode == TrainingMode::Mixed && self.data.interval.is_none() {
            return Err(PdfClassifierError::Config(
                "data.interval is required in mixed mode".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_yaml_round_trip() {
        let config = TrainerConfig::mixed_preset();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let restored: TrainerConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.model_name, restored.model_name);
        assert_eq!(config.data.n_features, restored.data.n_features);
        assert_eq!(restored.mode, TrainingMode::Mixed);
    }

    #[test]
    fn test_presets_validate() {
        assert!(TrainerConfig::baseline_preset().validate().is_ok());
        assert!(TrainerConfig::mixed_preset().validate().is_ok());
        assert!(TrainerConfig::from_preset("invalid").is_err());
    }

    #[test]
    fn test_missing_model_name_is_config_error() {
        let mut config = TrainerConfig::baseline_preset();
        config.model_name = String::new();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PdfClassifierError::Config(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_mixed_mode_requires_interval_dirs() {
        let mut config = TrainerConfig::mixed_preset();
        config.data.interval = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_decay_factor_bounds() {
        let mut config = TrainerConfig::baseline_preset();

        config.training.lr_decay = 0.0;
        assert!(config.validate().is_err());

        config.training.lr_decay = 1.5;
        assert!(config.validate().is_err());

        // A factor of exactly 1 is a supported no-op.
        config.training.lr_decay = 1.0;
        assert!(config.validate().is_ok());

        config.training.lr_decay = 0.95;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = TrainerConfig::baseline_preset();
        config.training.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_checkpoint_path_template() {
        let mut config = TrainerConfig::baseline_preset();
        config.model_dir = "/tmp/models".into();
        config.model_name = "robust".into();
        assert_eq!(
            config.checkpoint_path(),
            std::path::PathBuf::from("/tmp/models/robust.safetensors")
        );
    }

    #[test]
    fn test_from_file_defaults_applied() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r"
mode: baseline
model_name: test_model
data:
  train_path: ./train.libsvm
  test_path: ./test.libsvm
",
        )
        .unwrap();

        let config = TrainerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.data.n_features, 3514);
        assert_eq!(config.training.batch_size, 50);
        assert_eq!(config.training.lr_decay, 1.0);
        assert_eq!(config.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_missing() {
        assert!(TrainerConfig::from_file("/nonexistent/config.yaml").is_err());
    }
}
