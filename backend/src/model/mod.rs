pub mod preprocess;

use std::sync::{Arc, Mutex};

use tch::{CModule, Device, Kind, Tensor};

use crate::config::{ModelConfig, NormalizationSpec};

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Preprocessing error: {0}")]
    Preprocessing(String),
    #[error("Model error: {0}")]
    Model(#[from] tch::TchError),
    #[error("Model artifact has no `{method}` method: {source}")]
    Backbone {
        method: String,
        source: tch::TchError,
    },
    #[error("Gradient computation returned no result")]
    Gradient,
    #[error("Unexpected tensor shape {0:?}")]
    Shape(Vec<i64>),
    #[error("Model returned {probs} probabilities for {labels} class labels")]
    LabelMismatch { probs: usize, labels: usize },
}

/// Read-only handle to the once-loaded classifier. Holds nothing when the
/// artifact failed to load at startup; inference endpoints then fail fast.
pub struct ModelHandle {
    classifier: Option<Classifier>,
}

impl ModelHandle {
    pub fn new(classifier: Option<Classifier>) -> Self {
        Self { classifier }
    }

    pub fn get(&self) -> Option<&Classifier> {
        self.classifier.as_ref()
    }
}

pub struct Classifier {
    module: Arc<Mutex<CModule>>,
    device: Device,
    labels: Vec<String>,
    input_size: u32,
    normalization: NormalizationSpec,
    features_method: String,
    head_method: String,
}

impl Classifier {
    pub fn load(config: &ModelConfig) -> Result<Self, InferenceError> {
        let device = Device::cuda_if_available();
        let module = CModule::load_on_device(&config.model.path, device)?;
        Ok(Self {
            module: Arc::new(Mutex::new(module)),
            device,
            labels: config.model.labels.clone(),
            input_size: config.image.size,
            normalization: config.image.normalization.clone(),
            features_method: config.gradcam.features_method.clone(),
            head_method: config.gradcam.head_method.clone(),
        })
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    pub fn normalization(&self) -> &NormalizationSpec {
        &self.normalization
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Softmax probabilities over the class set.
    pub fn predict(&self, input: &Tensor) -> Result<Vec<f32>, InferenceError> {
        let module = self.module.lock().unwrap();
        let output = tch::no_grad(|| module.forward_ts(&[input]))?;
        let probs = output.softmax(-1, Kind::Float).view([-1]);
        let num_elements = probs.size()[0] as usize;
        let mut predictions = vec![0.0f32; num_elements];
        probs.copy_data(&mut predictions, num_elements);
        Ok(predictions)
    }

    pub fn top_prediction(&self, predictions: &[f32]) -> Result<(String, f32), InferenceError> {
        if predictions.len() != self.labels.len() {
            return Err(InferenceError::LabelMismatch {
                probs: predictions.len(),
                labels: self.labels.len(),
            });
        }
        let (idx, confidence) = predictions
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .ok_or(InferenceError::LabelMismatch {
                probs: 0,
                labels: self.labels.len(),
            })?;
        Ok((self.labels[idx].clone(), *confidence))
    }

    /// Gradient of the target class score with respect to the input pixels.
    /// Defaults to the predicted class when none is given.
    pub fn input_gradient(
        &self,
        input: &Tensor,
        class_idx: Option<i64>,
    ) -> Result<(Tensor, i64), InferenceError> {
        let input = input.set_requires_grad(true);
        let logits = {
            let module = self.module.lock().unwrap();
            module.forward_ts(&[&input])?
        };
        let class_idx = match class_idx {
            Some(idx) => idx,
            None => logits.argmax(-1, false).int64_value(&[0]),
        };
        let score = logits.select(1, class_idx).select(0, 0);
        let mut grads = Tensor::f_run_backward(&[&score], &[&input], false, false)?;
        let grad = grads.pop().ok_or(InferenceError::Gradient)?;
        Ok((grad, class_idx))
    }

    /// Gradient-weighted class-activation map at the configured backbone
    /// output: channel activations weighted by the spatially-averaged
    /// gradient of the class score, summed and rectified.
    pub fn class_activation_map(
        &self,
        input: &Tensor,
        class_idx: Option<i64>,
    ) -> Result<(Tensor, i64), InferenceError> {
        let input = input.set_requires_grad(true);
        let (features, logits) = {
            let module = self.module.lock().unwrap();
            let features = module
                .method_ts(&self.features_method, &[&input])
                .map_err(|source| InferenceError::Backbone {
                    method: self.features_method.clone(),
                    source,
                })?;
            let logits = module
                .method_ts(&self.head_method, &[&features])
                .map_err(|source| InferenceError::Backbone {
                    method: self.head_method.clone(),
                    source,
                })?;
            (features, logits)
        };
        let class_idx = match class_idx {
            Some(idx) => idx,
            None => logits.argmax(-1, false).int64_value(&[0]),
        };
        let score = logits.select(1, class_idx).select(0, 0);
        let mut grads = Tensor::f_run_backward(&[&score], &[&features], false, false)?;
        let grad = grads.pop().ok_or(InferenceError::Gradient)?;
        let weights = grad.adaptive_avg_pool2d([1i64, 1].as_slice());
        let cam = (&features * &weights)
            .sum_dim_intlist([1i64].as_slice(), false, Kind::Float)
            .relu()
            .squeeze_dim(0);
        Ok((cam, class_idx))
    }
}
