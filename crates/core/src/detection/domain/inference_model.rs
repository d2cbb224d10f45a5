use ndarray::{Array4, ArrayD};

use crate::detection::domain::errors::FrameError;

/// A loaded network: one NCHW float tensor in, its output tensors out.
pub trait InferenceModel: Send {
    fn forward(&mut self, input: Array4<f32>) -> Result<Vec<ArrayD<f32>>, FrameError>;
}
