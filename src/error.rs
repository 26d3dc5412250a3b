//! Error types for pdfclassifier-rs.
//!
//! # Example
//!
//! ```rust
//! use pdfclassifier_rs::{PdfClassifierError, Result};
//!
//! fn validate_name(name: &str) -> Result<()> {
//!     if name.is_empty() {
//!         return Err(PdfClassifierError::Config("model_name is required".into()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_name("").is_err());
//! assert!(validate_name("robust_model").is_ok());
//! ```

use thiserror::Error;

/// Result type alias for pdfclassifier-rs operations.
pub type Result<T> = std::result::Result<T, PdfClassifierError>;

/// Errors that can occur in pdfclassifier-rs.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PdfClassifierError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid configuration file.
    #[error("invalid config file: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Dataset loading or shape error.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Model error.
    #[error("model error: {0}")]
    Model(String),

    /// Training error.
    #[error("training error: {0}")]
    Training(String),

    /// Checkpoint error.
    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Candle error.
    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),
}

impl PdfClassifierError {
    /// Process exit code for this error: configuration problems exit with 2,
    /// everything else with 1.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::ConfigParse(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_error_display() {
        let error = PdfClassifierError::Config("invalid parameter".to_string());
        assert_eq!(error.to_string(), "configuration error: invalid parameter");
    }

    #[test]
    fn test_dataset_error_display() {
        let error = PdfClassifierError::Dataset("row count mismatch".to_string());
        assert_eq!(error.to_string(), "dataset error: row count mismatch");
    }

    #[test]
    fn test_checkpoint_error_display() {
        let error = PdfClassifierError::Checkpoint("save failed".to_string());
        assert_eq!(error.to_string(), "checkpoint error: save failed");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: PdfClassifierError = io_error.into();
        assert!(matches!(error, PdfClassifierError::Io(_)));
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_config_parse_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("a: b: :::").unwrap_err();
        let error: PdfClassifierError = yaml_error.into();
        assert!(error.to_string().contains("invalid config file"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(PdfClassifierError::Config("x".into()).exit_code(), 2);
        assert_eq!(PdfClassifierError::Training("x".into()).exit_code(), 1);
        assert_eq!(PdfClassifierError::Checkpoint("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;
        let io_error = io::Error::new(io::ErrorKind::NotFound, "train.libsvm not found");
        let error: PdfClassifierError = io_error.into();
        assert!(error.source().is_some());
    }
}
