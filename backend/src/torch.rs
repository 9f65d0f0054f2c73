//! libtorch backends, compiled with the `torch` feature.

use ndarray::Array4;
use std::path::Path;
use std::sync::Mutex;
use tch::nn::{self, ModuleT};
use tch::{CModule, Device, Kind, Tensor};

use crate::error::ModelError;
use crate::imaging::model::ImageClassifier;
use crate::tabular::form::{FEATURE_COLUMNS, FeatureRecord};
use crate::tabular::model::TabularModel;

fn to_tensor(input: &Array4<f32>, device: Device) -> Result<Tensor, ModelError> {
    let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
    let data = input
        .as_slice()
        .ok_or_else(|| ModelError::Invalid("input tensor is not contiguous".into()))?;
    Ok(Tensor::from_slice(data).view(shape.as_slice()).to_device(device))
}

fn flatten(output: &Tensor) -> Vec<f32> {
    let output_flat = output
        .to_device(Device::Cpu)
        .to_kind(Kind::Float)
        .view([-1]);
    let num_elements = output_flat.size()[0] as usize;
    let mut output_vec = vec![0.0f32; num_elements];
    output_flat.copy_data(&mut output_vec, num_elements);
    output_vec
}

/// TorchScript module mapping `[1, 3, H, W]` to `[1, n_classes]` logits.
pub struct TorchScriptClassifier {
    model: Mutex<CModule>,
    device: Device,
}

impl TorchScriptClassifier {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let device = Device::cuda_if_available();
        let mut model = CModule::load_on_device(path, device)?;
        model.set_eval();
        Ok(Self {
            model: Mutex::new(model),
            device,
        })
    }
}

impl ImageClassifier for TorchScriptClassifier {
    fn forward(&self, input: &Array4<f32>) -> Result<Vec<f32>, ModelError> {
        let tensor = to_tensor(input, self.device)?;
        let model = self
            .model
            .lock()
            .map_err(|_| ModelError::Worker("model lock poisoned".into()))?;
        let output = tch::no_grad(|| model.forward_ts(&[tensor]))?;
        Ok(flatten(&output))
    }
}

struct ResNet {
    // Owns the parameters `net` reads from.
    _vs: nn::VarStore,
    net: nn::FuncT<'static>,
}

/// ResNet-18 whose final linear layer has one output per class, with
/// weights read from a `.ot` or `.safetensors` file.
pub struct ResNetClassifier {
    inner: Mutex<ResNet>,
    device: Device,
}

impl ResNetClassifier {
    pub fn load(path: &Path, num_classes: usize) -> Result<Self, ModelError> {
        let device = Device::cuda_if_available();
        let mut vs = nn::VarStore::new(device);
        let net = tch::vision::resnet::resnet18(&vs.root(), num_classes as i64);
        vs.load(path)?;
        log::info!(
            "Loaded ResNet-18 weights from {} ({} classes, {:?})",
            path.display(),
            num_classes,
            device
        );
        Ok(Self {
            inner: Mutex::new(ResNet { _vs: vs, net }),
            device,
        })
    }
}

impl ImageClassifier for ResNetClassifier {
    fn forward(&self, input: &Array4<f32>) -> Result<Vec<f32>, ModelError> {
        let tensor = to_tensor(input, self.device)?;
        let inner = self
            .inner
            .lock()
            .map_err(|_| ModelError::Worker("model lock poisoned".into()))?;
        let output = tch::no_grad(|| inner.net.forward_t(&tensor, false));
        Ok(flatten(&output))
    }
}

/// TorchScript survival model taking a `[1, 10]` float row. A single output
/// is read as the label itself; several outputs are read as class scores.
pub struct TorchScriptTabular {
    model: Mutex<CModule>,
}

impl TorchScriptTabular {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let mut model = CModule::load_on_device(path, Device::Cpu)?;
        model.set_eval();
        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl TabularModel for TorchScriptTabular {
    fn predict(&self, record: &FeatureRecord) -> Result<i64, ModelError> {
        let row = Tensor::from_slice(&record.to_vector()).view([1, FEATURE_COLUMNS.len() as i64]);
        let model = self
            .model
            .lock()
            .map_err(|_| ModelError::Worker("model lock poisoned".into()))?;
        let output = flatten(&tch::no_grad(|| model.forward_ts(&[row]))?);

        match output.as_slice() {
            [] => Err(ModelError::OutputShape {
                expected: 1,
                got: 0,
            }),
            [label] => Ok(label.round() as i64),
            scores => Ok(scores
                .iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |best, (i, &s)| {
                    if s > best.1 { (i, s) } else { best }
                })
                .0 as i64),
        }
    }
}
