//! Accuracy and false-positive-rate evaluation.

use crate::dataset::Dataset;
use crate::error::Result;
use crate::model::{batch_tensors, Model};

/// 2x2 tally of (true/false) x (positive/negative) prediction outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfusionMatrix {
    /// Benign predicted benign.
    pub tn: usize,
    /// Benign predicted malicious.
    pub fp: usize,
    /// Malicious predicted benign.
    pub fn_: usize,
    /// Malicious predicted malicious.
    pub tp: usize,
}

impl ConfusionMatrix {
    /// Tally true and predicted label vectors. A label above 0.5 counts
    /// as the positive (malicious) class.
    ///
    /// # Panics
    /// Panics if the slices have different lengths; callers pair them by
    /// construction.
    #[must_use]
    pub fn from_labels(y_true: &[f32], y_pred: &[u8]) -> Self {
        assert_eq!(y_true.len(), y_pred.len(), "label/prediction length mismatch");
        let mut matrix = Self {
            tn: 0,
            fp: 0,
            fn_: 0,
            tp: 0,
        };
        for (&truth, &pred) in y_true.iter().zip(y_pred) {
            match (truth > 0.5, pred > 0) {
                (false, false) => matrix.tn += 1,
                (false, true) => matrix.fp += 1,
                (true, false) => matrix.fn_ += 1,
                (true, true) => matrix.tp += 1,
            }
        }
        matrix
    }

    /// `(TP + TN) / (TP + TN + FP + FN)`.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let total = self.tp + self.tn + self.fp + self.fn_;
        (self.tp + self.tn) as f64 / total as f64
    }

    /// `FP / (FP + TN)`.
    #[must_use]
    pub fn false_positive_rate(&self) -> f64 {
        self.fp as f64 / (self.fp + self.tn) as f64
    }
}

/// Result of evaluating predictions against true labels.
///
/// `false_positive_rate` is absent when the true-label set is degenerate
/// (fewer than two classes present), where a 2x2 confusion matrix is
/// ill-defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Fraction of correct predictions.
    pub accuracy: f64,
    /// Fraction of benign samples flagged malicious, when defined.
    pub false_positive_rate: Option<f64>,
}

impl std::fmt::Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.false_positive_rate {
            Some(fpr) => write!(f, "acc: {:.4} fpr: {:.4}", self.accuracy, fpr),
            None => write!(f, "acc: {:.4} fpr: n/a", self.accuracy),
        }
    }
}

/// Compute accuracy and false-positive rate for a prediction vector.
///
/// The degeneracy check runs before any ratio is formed: with a single
/// class in `y_true` this falls back to plain accuracy and reports the
/// false-positive rate as absent rather than dividing by zero.
///
/// # Panics
/// Panics on empty or length-mismatched inputs; callers evaluate
/// non-empty datasets.
#[must_use]
pub fn classification_metrics(y_true: &[f32], y_pred: &[u8]) -> Evaluation {
    assert!(!y_true.is_empty(), "evaluating an empty label vector");

    let has_negative = y_true.iter().any(|&y| y <= 0.5);
    let has_positive = y_true.iter().any(|&y| y > 0.5);
    if !(has_negative && has_positive) {
        let correct = y_true
            .iter()
            .zip(y_pred)
            .filter(|(&truth, &pred)| (truth > 0.5) == (pred > 0))
            .count();
        return Evaluation {
            accuracy: correct as f64 / y_true.len() as f64,
            false_positive_rate: None,
        };
    }

    let matrix = ConfusionMatrix::from_labels(y_true, y_pred);
    Evaluation {
        accuracy: matrix.accuracy(),
        false_positive_rate: Some(matrix.false_positive_rate()),
    }
}

/// Evaluate a model over a full held-out dataset with a single bulk
/// prediction call.
///
/// # Errors
/// Returns an error if prediction fails.
pub fn evaluate(model: &dyn Model, dataset: &Dataset) -> Result<Evaluation> {
    let (x, _) = batch_tensors(&dataset.full_batch(), model.device())?;
    let predictions = model.predict(&x)?;
    Ok(classification_metrics(dataset.labels(), &predictions))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_matrix_scenario() {
        // y=[0,0,1,1], y_pred=[0,1,1,1] -> TN=1 FP=1 FN=0 TP=2.
        let matrix = ConfusionMatrix::from_labels(&[0.0, 0.0, 1.0, 1.0], &[0, 1, 1, 1]);
        assert_eq!(matrix.tn, 1);
        assert_eq!(matrix.fp, 1);
        assert_eq!(matrix.fn_, 0);
        assert_eq!(matrix.tp, 2);
        assert!((matrix.accuracy() - 0.75).abs() < 1e-12);
        assert!((matrix.false_positive_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_metrics_two_class() {
        let eval = classification_metrics(&[0.0, 0.0, 1.0, 1.0], &[0, 1, 1, 1]);
        assert!((eval.accuracy - 0.75).abs() < 1e-12);
        assert!((eval.false_positive_rate.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_metrics_all_positive_fallback() {
        // Single-class labels: plain accuracy, no false-positive rate,
        // regardless of what was predicted.
        let eval = classification_metrics(&[1.0, 1.0, 1.0, 1.0], &[0, 1, 1, 0]);
        assert!((eval.accuracy - 0.5).abs() < 1e-12);
        assert!(eval.false_positive_rate.is_none());
        assert!(eval.accuracy.is_finite());
    }

    #[test]
    fn test_metrics_all_negative_fallback() {
        let eval = classification_metrics(&[0.0, 0.0, 0.0], &[0, 0, 1]);
        assert!((eval.accuracy - 2.0 / 3.0).abs() < 1e-12);
        assert!(eval.false_positive_rate.is_none());
    }

    #[test]
    fn test_metrics_perfect_predictions() {
        let eval = classification_metrics(&[0.0, 1.0, 0.0, 1.0], &[0, 1, 0, 1]);
        assert_eq!(eval.accuracy, 1.0);
        assert_eq!(eval.false_positive_rate, Some(0.0));
    }

    #[test]
    fn test_metrics_no_benign_misfires() {
        // Both classes present, every benign sample classified benign.
        let eval = classification_metrics(&[0.0, 0.0, 1.0], &[0, 0, 0]);
        assert_eq!(eval.false_positive_rate, Some(0.0));
    }

    #[test]
    fn test_display_formats_absent_fpr() {
        let eval = Evaluation {
            accuracy: 0.5,
            false_positive_rate: None,
        };
        assert_eq!(eval.to_string(), "acc: 0.5000 fpr: n/a");
    }
}
