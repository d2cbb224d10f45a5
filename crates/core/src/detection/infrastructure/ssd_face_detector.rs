/// ResNet-10 SSD face detector: fixed 300×300 grid, single-shot output.
///
/// Each output row is an independent proposal; every row above threshold is
/// drawn, with no suppression pass.
use std::path::Path;

use ndarray::ArrayD;

use crate::detection::domain::detection::{BoundingBox, Detection};
use crate::detection::domain::detector_config::DetectorConfig;
use crate::detection::domain::errors::{ConfigError, FrameError};
use crate::detection::domain::inference_model::InferenceModel;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::capabilities::CapabilityDescriptor;
use crate::shared::constants::SSD_MODEL_FILE;

use super::annotation::draw_detection;
use super::input_stage::InputStage;
use super::model_resolver::model_file;
use super::ort_model::OrtModel;
use super::preprocessing::{blob_from_frame, BlobParams};

pub const NAME: &str = "ResNet10SSDFaceDetector";

/// Used whenever the configured threshold is outside `(0, 1]`.
pub const DEFAULT_CONFIDENCE: f32 = 0.6;

/// Network input size.
const INPUT_SIZE: usize = 300;

/// Caffe training means, BGR order.
const MEAN_BGR: [f32; 3] = [104.0, 177.0, 123.0];

/// `[image_id, class_id, confidence, x1, y1, x2, y2]`
const ROW_LEN: usize = 7;

const BLOB: BlobParams = BlobParams {
    size: INPUT_SIZE,
    scale: 1.0,
    mean: MEAN_BGR,
    swap_rb: false,
};

pub struct SsdFaceDetector {
    input: InputStage,
    model: Box<dyn InferenceModel>,
    threshold: f32,
}

impl SsdFaceDetector {
    /// Loads the model from `model_dir`.
    ///
    /// The pixel format is checked before any model file is touched.
    pub fn new(
        model_dir: &Path,
        caps: CapabilityDescriptor,
        config: &DetectorConfig,
    ) -> Result<Self, ConfigError> {
        let input = InputStage::new(caps)?;
        let model = OrtModel::load(&model_file(model_dir, SSD_MODEL_FILE)?)?;
        Ok(Self::assemble(input, Box::new(model), config))
    }

    /// Builds a detector around an already loaded model.
    pub fn with_model(
        model: Box<dyn InferenceModel>,
        caps: CapabilityDescriptor,
        config: &DetectorConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self::assemble(InputStage::new(caps)?, model, config))
    }

    fn assemble(input: InputStage, model: Box<dyn InferenceModel>, config: &DetectorConfig) -> Self {
        Self {
            input,
            model,
            threshold: config.threshold_or(DEFAULT_CONFIDENCE),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl ObjectDetector for SsdFaceDetector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn capabilities(&self) -> CapabilityDescriptor {
        self.input.capabilities()
    }

    fn annotate(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<Vec<Detection>, FrameError> {
        let mut frame = self.input.load(input, output)?;

        let blob = blob_from_frame(&frame, &BLOB);
        let outputs = self.model.forward(blob)?;
        let tensor = outputs
            .first()
            .ok_or_else(|| FrameError::OutputShape("model produced no outputs".into()))?;

        let detections = decode(tensor, self.threshold, frame.width(), frame.height())?;
        for detection in &detections {
            draw_detection(&mut frame, detection);
        }
        frame.copy_to(output);

        log::debug!("{NAME}: {} detection(s)", detections.len());
        Ok(detections)
    }
}

/// Turns the raw `[.., N, 7]` tensor into pixel-space detections.
///
/// Rows with `confidence > threshold` are scaled by the frame size and
/// truncated to whole pixels.
fn decode(
    tensor: &ArrayD<f32>,
    threshold: f32,
    frame_w: u32,
    frame_h: u32,
) -> Result<Vec<Detection>, FrameError> {
    if tensor.len() % ROW_LEN != 0 {
        return Err(FrameError::OutputShape(format!(
            "expected rows of {ROW_LEN} values, got shape {:?}",
            tensor.shape()
        )));
    }
    let values: Vec<f32> = tensor.iter().copied().collect();
    let (fw, fh) = (frame_w as f32, frame_h as f32);

    let detections = values
        .chunks_exact(ROW_LEN)
        .filter(|row| row[2] > threshold)
        .map(|row| Detection {
            confidence: row[2],
            bbox: BoundingBox::new(
                (row[3] * fw).trunc(),
                (row[4] * fh).trunc(),
                (row[5] * fw).trunc(),
                (row[6] * fh).trunc(),
            ),
            landmarks: Vec::new(),
        })
        .collect();
    Ok(detections)
}
