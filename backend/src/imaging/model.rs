use image::RgbImage;
use ndarray::{Array1, Array4};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use super::transform::to_input_tensor;
use crate::error::ModelError;

/// Classes and input resolution the classifier was trained with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelMeta {
    pub class_names: Vec<String>,
    #[serde(default = "default_input_size")]
    pub input_size: u32,
}

fn default_input_size() -> u32 {
    224
}

impl ModelMeta {
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let meta: ModelMeta = serde_json::from_str(&raw).map_err(|source| ModelError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if meta.class_names.is_empty() {
            return Err(ModelError::Invalid("class_names is empty".into()));
        }
        if meta.input_size == 0 {
            return Err(ModelError::Invalid("input_size must be positive".into()));
        }
        Ok(meta)
    }
}

/// Forward pass of an image network: one normalized `[1, 3, H, W]` batch in,
/// raw class logits out.
pub trait ImageClassifier: Send + Sync {
    fn forward(&self, input: &Array4<f32>) -> Result<Vec<f32>, ModelError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub index: usize,
    pub label: String,
    pub confidence: f32,
}

/// Classifier plus the metadata needed to interpret it. Cheap to clone.
#[derive(Clone)]
pub struct ImagePredictor {
    model: Arc<dyn ImageClassifier>,
    meta: Arc<ModelMeta>,
}

impl ImagePredictor {
    pub fn new(model: Arc<dyn ImageClassifier>, meta: ModelMeta) -> Self {
        Self {
            model,
            meta: Arc::new(meta),
        }
    }

    pub fn classify(&self, image: &RgbImage) -> Result<Classification, ModelError> {
        let input = to_input_tensor(image, self.meta.input_size);
        let logits = self.model.forward(&input)?;
        if logits.len() != self.meta.class_names.len() {
            return Err(ModelError::OutputShape {
                expected: self.meta.class_names.len(),
                got: logits.len(),
            });
        }

        let probabilities = softmax(&logits);
        let (index, confidence) = argmax(&probabilities);
        Ok(Classification {
            index,
            label: self.meta.class_names[index].clone(),
            confidence,
        })
    }
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Array1<f32> {
    let logits = Array1::from(logits.to_vec());
    let max = logits.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
    let exp = logits.mapv(|v| (v - max).exp());
    let total = exp.sum();
    exp / total
}

/// First maximum wins on ties.
fn argmax(probabilities: &Array1<f32>) -> (usize, f32) {
    probabilities
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &p)| {
            if p > best.1 { (i, p) } else { best }
        })
}

/// Builds the classifier named by `model_path`. `.ot` / `.safetensors`
/// weights go into a ResNet-18 with one output per class; `.pt` is loaded
/// as TorchScript.
pub fn load(model_path: &Path, meta: &ModelMeta) -> Result<Arc<dyn ImageClassifier>, ModelError> {
    match model_path.extension().and_then(|e| e.to_str()) {
        #[cfg(feature = "torch")]
        Some("ot") | Some("safetensors") => Ok(Arc::new(crate::torch::ResNetClassifier::load(
            model_path,
            meta.class_names.len(),
        )?)),
        #[cfg(feature = "torch")]
        Some("pt") => Ok(Arc::new(crate::torch::TorchScriptClassifier::load(model_path)?)),
        #[cfg(not(feature = "torch"))]
        Some("ot") | Some("safetensors") | Some("pt") => {
            let _ = meta;
            Err(ModelError::BackendUnavailable(
                "image models need the `torch` feature".into(),
            ))
        }
        _ => Err(ModelError::Unsupported(model_path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    struct FixedLogits(Vec<f32>);

    impl ImageClassifier for FixedLogits {
        fn forward(&self, input: &Array4<f32>) -> Result<Vec<f32>, ModelError> {
            assert_eq!(input.shape()[..2], [1, 3]);
            Ok(self.0.clone())
        }
    }

    fn meta() -> ModelMeta {
        ModelMeta {
            class_names: vec!["NORMAL".into(), "PNEUMONIA".into()],
            input_size: 32,
        }
    }

    #[test]
    fn softmax_sums_to_one() {
        let probabilities = softmax(&[1.0, 2.0, 3.0]);
        assert!((probabilities.sum() - 1.0).abs() < 1e-6);
        assert!(probabilities[2] > probabilities[1] && probabilities[1] > probabilities[0]);
    }

    #[test]
    fn softmax_handles_large_logits() {
        let probabilities = softmax(&[1000.0, 1000.0]);
        assert!((probabilities[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn classify_maps_argmax_to_label() {
        let predictor = ImagePredictor::new(Arc::new(FixedLogits(vec![-1.0, 2.5])), meta());
        let image = RgbImage::from_pixel(10, 10, Rgb([40, 40, 40]));

        let result = predictor.classify(&image).unwrap();
        assert_eq!(result.index, 1);
        assert_eq!(result.label, "PNEUMONIA");
        assert!(result.confidence > 0.5 && result.confidence <= 1.0);
    }

    #[test]
    fn wrong_number_of_logits_is_an_error() {
        let predictor = ImagePredictor::new(Arc::new(FixedLogits(vec![0.1, 0.2, 0.3])), meta());
        let image = RgbImage::new(4, 4);
        assert!(matches!(
            predictor.classify(&image),
            Err(ModelError::OutputShape { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn meta_defaults_input_size() {
        let meta: ModelMeta = serde_json::from_str(r#"{"class_names": ["NORMAL", "PNEUMONIA"]}"#).unwrap();
        assert_eq!(meta.input_size, 224);
    }
}
