use std::path::Path;

use ndarray::{Array4, ArrayD};
use ort::session::Session;

use crate::detection::domain::errors::{ConfigError, FrameError};
use crate::detection::domain::inference_model::InferenceModel;

/// ONNX Runtime session behind the [`InferenceModel`] interface.
pub struct OrtModel {
    session: Session,
}

impl OrtModel {
    /// Loads an ONNX model, preferring the platform's accelerated provider.
    pub fn load(model_path: &Path) -> Result<Self, ConfigError> {
        let load_error = |e: &dyn std::fmt::Display| ConfigError::ModelLoad {
            path: model_path.to_path_buf(),
            message: e.to_string(),
        };

        let session = Session::builder()
            .map_err(|e| load_error(&e))?
            .with_execution_providers(preferred_execution_providers())
            .map_err(|e| load_error(&e))?
            .commit_from_file(model_path)
            .map_err(|e| load_error(&e))?;

        log::info!("Loaded model {}", model_path.display());
        Ok(Self { session })
    }
}

impl InferenceModel for OrtModel {
    fn forward(&mut self, input: Array4<f32>) -> Result<Vec<ArrayD<f32>>, FrameError> {
        let input_value = ort::value::Tensor::from_array(input)
            .map_err(|e| FrameError::Inference(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(|e| FrameError::Inference(e.to_string()))?;
        if outputs.len() == 0 {
            return Err(FrameError::OutputShape("model produced no outputs".into()));
        }

        let mut tensors = Vec::with_capacity(outputs.len());
        for index in 0..outputs.len() {
            let tensor = outputs[index]
                .try_extract_array::<f32>()
                .map_err(|e| FrameError::OutputShape(e.to_string()))?;
            tensors.push(tensor.to_owned());
        }
        Ok(tensors)
    }
}

/// Preferred ONNX execution providers for the current platform.
///
/// An empty list leaves ONNX Runtime on its default CPU provider.
fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}
