//! Dataset loading, merging, and shuffling.
//!
//! A dataset is an ordered sequence of samples held as two parallel dense
//! arrays: a row-major feature matrix and a label vector of equal length.
//! Batches are borrowed contiguous views; only a shuffle rebuilds storage.

use std::ops::Range;
use std::path::Path;

use candle_core::{DType, Tensor};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{PdfClassifierError, Result};

/// File name of the dense feature matrix inside an interval data directory.
pub const INTERVAL_VECTORS_FILE: &str = "vectors_all.npy";
/// File name of the label vector inside an interval data directory.
pub const INTERVAL_LABELS_FILE: &str = "y_input.npy";

/// Parallel feature matrix / label vector pair.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Row-major feature values, `rows * n_features` long.
    features: Vec<f32>,
    /// Binary labels (0 or 1), one per row.
    labels: Vec<f32>,
    /// Fixed feature dimensionality.
    n_features: usize,
}

/// Borrowed contiguous slice of a [`Dataset`] used for one optimizer step.
#[derive(Debug, Clone, Copy)]
pub struct BatchView<'a> {
    /// Row-major feature values for the batch.
    pub features: &'a [f32],
    /// Labels for the batch.
    pub labels: &'a [f32],
    /// Feature dimensionality.
    pub n_features: usize,
}

impl BatchView<'_> {
    /// Number of samples in the batch.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.labels.len()
    }
}

impl Dataset {
    /// Build a dataset from raw parts, checking the pairing invariant.
    ///
    /// # Errors
    /// Returns a `Dataset` error if the feature matrix length is not
    /// `labels.len() * n_features`.
    pub fn from_parts(features: Vec<f32>, labels: Vec<f32>, n_features: usize) -> Result<Self> {
        if features.len() != labels.len() * n_features {
            return Err(PdfClassifierError::Dataset(format!(
                "feature matrix has {} values, expected {} rows * {} features",
                features.len(),
                labels.len(),
                n_features
            )));
        }
        Ok(Self {
            features,
            labels,
            n_features,
        })
    }

    /// Load a sparse labeled feature-vector file.
    ///
    /// One sample per row: a numeric label followed by `index:value` pairs
    /// with 1-based indices and fixed dimensionality `n_features`.
    ///
    /// # Errors
    /// Returns a `Dataset` error naming the path for unreadable files,
    /// malformed rows, or out-of-range feature indices.
    pub fn from_libsvm<P: AsRef<Path>>(path: P, n_features: usize) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PdfClassifierError::Dataset(format!("cannot read {}: {e}", path.display()))
        })?;

        let mut features = Vec::new();
        let mut labels = Vec::new();

        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let label: f32 = tokens
                .next()
                .ok_or_else(|| {
                    PdfClassifierError::Dataset(format!(
                        "{}:{}: empty row",
                        path.display(),
                        lineno + 1
                    ))
                })?
                .parse()
                .map_err(|e| {
                    PdfClassifierError::Dataset(format!(
                        "{}:{}: bad label: {e}",
                        path.display(),
                        lineno + 1
                    ))
                })?;

            let mut row = vec![0.0f32; n_features];
            for pair in tokens {
                let (idx, value) = pair.split_once(':').ok_or_else(|| {
                    PdfClassifierError::Dataset(format!(
                        "{}:{}: expected index:value, got {pair:?}",
                        path.display(),
                        lineno + 1
                    ))
                })?;
                let idx: usize = idx.parse().map_err(|e| {
                    PdfClassifierError::Dataset(format!(
                        "{}:{}: bad feature index: {e}",
                        path.display(),
                        lineno + 1
                    ))
                })?;
                if idx == 0 || idx > n_features {
                    return Err(PdfClassifierError::Dataset(format!(
                        "{}:{}: feature index {idx} out of range 1..={n_features}",
                        path.display(),
                        lineno + 1
                    )));
                }
                let value: f32 = value.parse().map_err(|e| {
                    PdfClassifierError::Dataset(format!(
                        "{}:{}: bad feature value: {e}",
                        path.display(),
                        lineno + 1
                    ))
                })?;
                row[idx - 1] = value;
            }

            features.extend_from_slice(&row);
            labels.push(label);
        }

        Self::from_parts(features, labels, n_features)
    }

    /// Load a dense interval-bound dataset from a directory holding
    /// `vectors_all.npy` (2-D feature matrix) and `y_input.npy` (1-D
    /// label vector).
    ///
    /// # Errors
    /// Returns a `Dataset` error naming the path if either array is
    /// missing, has the wrong rank, or the row counts disagree.
    pub fn from_npy_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let vectors_path = dir.join(INTERVAL_VECTORS_FILE);
        let labels_path = dir.join(INTERVAL_LABELS_FILE);

        let vectors = read_npy(&vectors_path)?;
        let (rows, n_features) = vectors.dims2().map_err(|_| {
            PdfClassifierError::Dataset(format!(
                "{}: expected a 2-D feature matrix, got shape {:?}",
                vectors_path.display(),
                vectors.dims()
            ))
        })?;
        let features = vectors
            .to_dtype(DType::F32)?
            .flatten_all()?
            .to_vec1::<f32>()?;

        let labels_tensor = read_npy(&labels_path)?;
        let label_rows = labels_tensor.dims1().map_err(|_| {
            PdfClassifierError::Dataset(format!(
                "{}: expected a 1-D label vector, got shape {:?}",
                labels_path.display(),
                labels_tensor.dims()
            ))
        })?;
        let labels = labels_tensor.to_dtype(DType::F32)?.to_vec1::<f32>()?;

        if rows != label_rows {
            return Err(PdfClassifierError::Dataset(format!(
                "{}: {rows} feature rows but {label_rows} labels",
                dir.display()
            )));
        }

        Self::from_parts(features, labels, n_features)
    }

    /// Concatenate a clean and an interval-bound dataset along the sample
    /// axis. After merging the two are indistinguishable.
    ///
    /// # Errors
    /// Returns a `Dataset` error if the feature widths differ.
    pub fn merge(mut clean: Dataset, interval: Dataset) -> Result<Dataset> {
        if clean.n_features != interval.n_features {
            return Err(PdfClassifierError::Dataset(format!(
                "cannot merge datasets with {} and {} features",
                clean.n_features, interval.n_features
            )));
        }
        clean.features.extend_from_slice(&interval.features);
        clean.labels.extend_from_slice(&interval.labels);
        Ok(clean)
    }

    /// Apply a uniformly random joint permutation to rows and labels.
    ///
    /// The multiset of (feature row, label) pairs is unchanged; only the
    /// order changes. Entropy comes from the caller-owned seeded RNG.
    pub fn shuffle(&mut self, rng: &mut StdRng) {
        let rows = self.rows();
        let mut perm: Vec<usize> = (0..rows).collect();
        perm.shuffle(rng);

        let mut features = Vec::with_capacity(self.features.len());
        let mut labels = Vec::with_capacity(rows);
        for &i in &perm {
            let start = i * self.n_features;
            features.extend_from_slice(&self.features[start..start + self.n_features]);
            labels.push(self.labels[i]);
        }
        self.features = features;
        self.labels = labels;
    }

    /// Borrow the contiguous row range `range` as a batch.
    ///
    /// # Panics
    /// Panics if the range is out of bounds; schedulers only hand out
    /// in-bounds ranges.
    #[must_use]
    pub fn batch(&self, range: Range<usize>) -> BatchView<'_> {
        BatchView {
            features: &self.features[range.start * self.n_features..range.end * self.n_features],
            labels: &self.labels[range.clone()],
            n_features: self.n_features,
        }
    }

    /// The whole dataset as one batch view.
    #[must_use]
    pub fn full_batch(&self) -> BatchView<'_> {
        self.batch(0..self.rows())
    }

    /// Number of samples.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.labels.len()
    }

    /// Whether the dataset holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Feature dimensionality.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Label vector.
    #[must_use]
    pub fn labels(&self) -> &[f32] {
        &self.labels
    }
}

fn read_npy(path: &Path) -> Result<Tensor> {
    if !path.exists() {
        return Err(PdfClassifierError::Dataset(format!(
            "interval array not found: {}",
            path.display()
        )));
    }
    Tensor::read_npy(path).map_err(|e| {
        PdfClassifierError::Dataset(format!("cannot read {}: {e}", path.display()))
    })
}
