//! The model contract and the reference classifier.
//!
//! The training core depends on an external collaborator through the
//! [`Model`] trait only: two input slots (the feature-matrix and
//! label-vector tensors built by [`batch_tensors`]), a gradient-carrying
//! scalar loss, a prediction function, and the trainable parameter
//! surface. Nothing else about the classifier is inspected.

use candle_core::{DType, Device, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder, VarMap};

use crate::dataset::BatchView;
use crate::error::{PdfClassifierError, Result};

/// Contract between the training core and the classifier.
pub trait Model {
    /// Fixed input feature dimensionality.
    fn n_features(&self) -> usize;

    /// Device the model's parameters live on.
    fn device(&self) -> &Device;

    /// Scalar loss for a batch, carrying the gradient graph.
    ///
    /// `x` is a `[rows, n_features]` feature matrix, `y` a `[rows]` u32
    /// label vector.
    ///
    /// # Errors
    /// Returns an error if the forward pass fails.
    fn loss(&self, x: &Tensor, y: &Tensor) -> Result<Tensor>;

    /// Predicted label vector for a feature matrix.
    ///
    /// # Errors
    /// Returns an error if the forward pass fails.
    fn predict(&self, x: &Tensor) -> Result<Vec<u8>>;

    /// Trainable parameters, for the optimizer and checkpointing.
    fn vars(&self) -> &VarMap;

    /// Mutable trainable parameters, for checkpoint restore.
    fn vars_mut(&mut self) -> &mut VarMap;
}

/// Build the two model input slots from a borrowed batch.
///
/// # Errors
/// Returns an error if tensor construction fails.
pub fn batch_tensors(batch: &BatchView<'_>, device: &Device) -> Result<(Tensor, Tensor)> {
    let rows = batch.rows();
    let x = Tensor::from_slice(batch.features, (rows, batch.n_features), device)?;
    let y: Vec<u32> = batch.labels.iter().map(|&l| u32::from(l > 0.5)).collect();
    let y = Tensor::from_vec(y, rows, device)?;
    Ok((x, y))
}

/// Width of each hidden layer in the reference classifier.
const HIDDEN_DIM: usize = 200;

/// Reference feed-forward classifier: two 200-unit ReLU hidden layers
/// over the input features, with 2-way logits and cross-entropy loss.
pub struct MlpClassifier {
    varmap: VarMap,
    fc1: Linear,
    fc2: Linear,
    out: Linear,
    n_features: usize,
    device: Device,
}

impl MlpClassifier {
    /// Create a classifier with freshly initialized parameters.
    ///
    /// # Errors
    /// Returns an error if parameter initialization fails.
    pub fn new(n_features: usize, device: Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let fc1 = candle_nn::linear(n_features, HIDDEN_DIM, vb.pp("fc1"))?;
        let fc2 = candle_nn::linear(HIDDEN_DIM, HIDDEN_DIM, vb.pp("fc2"))?;
        let out = candle_nn::linear(HIDDEN_DIM, 2, vb.pp("out"))?;
        Ok(Self {
            varmap,
            fc1,
            fc2,
            out,
            n_features,
            device,
        })
    }

    fn logits(&self, x: &Tensor) -> Result<Tensor> {
        let (_, width) = x.dims2()?;
        if width != self.n_features {
            return Err(PdfClassifierError::Model(format!(
                "input has {width} features, model expects {}",
                self.n_features
            )));
        }
        let h = self.fc1.forward(x)?.relu()?;
        let h = self.fc2.forward(&h)?.relu()?;
        Ok(self.out.forward(&h)?)
    }
}

impl Model for MlpClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn loss(&self, x: &Tensor, y: &Tensor) -> Result<Tensor> {
        let logits = self.logits(x)?;
        Ok(candle_nn::loss::cross_entropy(&logits, y)?)
    }

    fn predict(&self, x: &Tensor) -> Result<Vec<u8>> {
        let logits = self.logits(x)?;
        let classes = logits.argmax(D::Minus1)?.to_vec1::<u32>()?;
        Ok(classes.into_iter().map(|c| u8::from(c > 0)).collect())
    }

    fn vars(&self) -> &VarMap {
        &self.varmap
    }

    fn vars_mut(&mut self) -> &mut VarMap {
        &mut self.varmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    fn tiny_dataset() -> Dataset {
        Dataset::from_parts(
            vec![0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0],
            vec![0.0, 1.0, 1.0, 0.0],
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_batch_tensors_shapes() {
        let dataset = tiny_dataset();
        let (x, y) = batch_tensors(&dataset.batch(0..3), &Device::Cpu).unwrap();
        assert_eq!(x.dims(), &[3, 2]);
        assert_eq!(y.dims(), &[3]);
        assert_eq!(y.to_vec1::<u32>().unwrap(), vec![0, 1, 1]);
    }

    #[test]
    fn test_predict_returns_binary_labels() {
        let model = MlpClassifier::new(2, Device::Cpu).unwrap();
        let dataset = tiny_dataset();
        let (x, _) = batch_tensors(&dataset.full_batch(), &Device::Cpu).unwrap();

        let predictions = model.predict(&x).unwrap();
        assert_eq!(predictions.len(), 4);
        assert!(predictions.iter().all(|&p| p <= 1));
    }

    #[test]
    fn test_loss_is_finite_scalar() {
        let model = MlpClassifier::new(2, Device::Cpu).unwrap();
        let dataset = tiny_dataset();
        let (x, y) = batch_tensors(&dataset.full_batch(), &Device::Cpu).unwrap();

        let loss = model.loss(&x, &y).unwrap();
        let value = loss.to_vec0::<f32>().unwrap();
        assert!(value.is_finite());
        assert!(value >= 0.0);
    }

    #[test]
    fn test_width_mismatch_is_model_error() {
        let model = MlpClassifier::new(4, Device::Cpu).unwrap();
        let x = Tensor::zeros((2, 3), DType::F32, &Device::Cpu).unwrap();
        let err = model.predict(&x).unwrap_err();
        assert!(matches!(err, PdfClassifierError::Model(_)));
    }

    #[test]
    fn test_vars_are_populated() {
        let model = MlpClassifier::new(2, Device::Cpu).unwrap();
        // Three linear layers: weight + bias each.
        assert_eq!(model.vars().all_vars().len(), 6);
    }
}
