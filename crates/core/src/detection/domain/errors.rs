use std::path::PathBuf;

use thiserror::Error;

use crate::shared::capabilities::PixelFormat;

/// Configuration failures raised while selecting or constructing a detector.
///
/// These are fatal at startup and never retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unsupported input pixel format {0}")]
    UnsupportedPixelFormat(PixelFormat),
    #[error("invalid frame geometry {width}x{height}")]
    InvalidCapabilities { width: u16, height: u16 },
    #[error("unknown model '{name}' (available: {available})")]
    UnknownModel { name: String, available: String },
    #[error("model file not found: {0}")]
    ModelNotFound(PathBuf),
    #[error("failed to load model {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },
    #[error("failed to set up color conversion: {0}")]
    Scaler(String),
}

/// Failures of a single `detect` call.
///
/// Fatal to that call only; the frame-delivery loop decides whether to skip
/// the frame or stop.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("input buffer is {actual} bytes, expected {expected}")]
    InputSize { expected: usize, actual: usize },
    #[error("output buffer holds {actual} bytes, needs at least {required}")]
    OutputCapacity { required: usize, actual: usize },
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("unexpected model output: {0}")]
    OutputShape(String),
    #[error("color conversion failed: {0}")]
    Conversion(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_names_fourcc() {
        let err = ConfigError::UnsupportedPixelFormat(PixelFormat::from_fourcc(0x3231_564E));
        assert_eq!(err.to_string(), "unsupported input pixel format NV12");
    }

    #[test]
    fn test_unknown_model_lists_available() {
        let err = ConfigError::UnknownModel {
            name: "nope".to_string(),
            available: "a, b".to_string(),
        };
        assert_eq!(err.to_string(), "unknown model 'nope' (available: a, b)");
    }

    #[test]
    fn test_input_size_message() {
        let err = FrameError::InputSize {
            expected: 12,
            actual: 10,
        };
        assert_eq!(err.to_string(), "input buffer is 10 bytes, expected 12");
    }
}
