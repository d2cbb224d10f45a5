/// YOLOv5-face detector: three strided grids, three anchors per grid, five
/// facial landmarks per box, greedy NMS.
use std::borrow::Cow;
use std::path::Path;

use ndarray::ArrayD;

use crate::detection::domain::detection::{BoundingBox, Detection};
use crate::detection::domain::detector_config::DetectorConfig;
use crate::detection::domain::errors::{ConfigError, FrameError};
use crate::detection::domain::inference_model::InferenceModel;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::capabilities::CapabilityDescriptor;
use crate::shared::constants::YOLO_FACE_MODEL_FILE;

use super::annotation::draw_detection;
use super::input_stage::InputStage;
use super::math::{non_max_suppression, sigmoid};
use super::model_resolver::model_file;
use super::ort_model::OrtModel;
use super::preprocessing::{blob_from_frame, BlobParams};

pub const NAME: &str = "Yolo5sPersonDetector";

pub const DEFAULT_CONFIDENCE: f32 = 0.3;

const INPUT_SIZE: usize = 640;
const NMS_IOU_THRESH: f32 = 0.5;

const STRIDES: [usize; 3] = [8, 16, 32];

/// `(width, height)` priors in input pixels, one row per stride.
const ANCHORS: [[(f32, f32); 3]; 3] = [
    [(4.0, 5.0), (8.0, 10.0), (13.0, 16.0)],
    [(23.0, 29.0), (43.0, 55.0), (73.0, 105.0)],
    [(146.0, 217.0), (231.0, 300.0), (335.0, 433.0)],
];

/// `[cx, cy, w, h, box_score, lx1, ly1, .., lx5, ly5, face_score]`
const VALUES_PER_ROW: usize = 16;
const LANDMARKS: usize = 5;

const BLOB: BlobParams = BlobParams {
    size: INPUT_SIZE,
    scale: 1.0 / 255.0,
    mean: [0.0; 3],
    swap_rb: true,
};

pub struct AnchorGridFaceDetector {
    input: InputStage,
    model: Box<dyn InferenceModel>,
    threshold: f32,
}

impl AnchorGridFaceDetector {
    pub fn new(
        model_dir: &Path,
        caps: CapabilityDescriptor,
        config: &DetectorConfig,
    ) -> Result<Self, ConfigError> {
        let input = InputStage::new(caps)?;
        let model = OrtModel::load(&model_file(model_dir, YOLO_FACE_MODEL_FILE)?)?;
        Ok(Self::assemble(input, Box::new(model), config))
    }

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

    /// Used both as the objectness cut and as the NMS score threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl ObjectDetector for AnchorGridFaceDetector {
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
        let data = flatten(&outputs);

        let candidates = decode_candidates(&data, frame.width(), frame.height(), self.threshold)?;
        let candidate_count = candidates.len();
        let detections = non_max_suppression(candidates, self.threshold, NMS_IOU_THRESH);

        for detection in &detections {
            draw_detection(&mut frame, detection);
        }
        frame.copy_to(output);

        log::debug!(
            "{NAME}: {candidate_count} candidate(s), {} kept after NMS",
            detections.len()
        );
        Ok(detections)
    }
}

/// Number of rows the model emits across all strides and anchors.
fn expected_rows() -> usize {
    STRIDES
        .iter()
        .map(|&stride| {
            let cells = INPUT_SIZE / stride;
            ANCHORS[0].len() * cells * cells
        })
        .sum()
}

/// Joins the model outputs, in order, into one flat row buffer.
fn flatten(outputs: &[ArrayD<f32>]) -> Cow<'_, [f32]> {
    match outputs {
        [single] => match single.as_slice() {
            Some(slice) => Cow::Borrowed(slice),
            None => Cow::Owned(single.iter().copied().collect()),
        },
        many => Cow::Owned(many.iter().flat_map(|t| t.iter().copied()).collect()),
    }
}

/// Walks every (stride, anchor, grid row, grid column) in row order and
/// decodes the cells whose objectness exceeds `obj_threshold`.
fn decode_candidates(
    data: &[f32],
    frame_w: u32,
    frame_h: u32,
    obj_threshold: f32,
) -> Result<Vec<Detection>, FrameError> {
    let expected = expected_rows();
    if data.len() < expected * VALUES_PER_ROW {
        return Err(FrameError::OutputShape(format!(
            "expected {expected} rows of {VALUES_PER_ROW} values, got {} values",
            data.len()
        )));
    }

    let ratio = (
        frame_w as f32 / INPUT_SIZE as f32,
        frame_h as f32 / INPUT_SIZE as f32,
    );
    let mut rows = data.chunks_exact(VALUES_PER_ROW);
    let mut candidates = Vec::new();

    for (&stride, anchors) in STRIDES.iter().zip(ANCHORS.iter()) {
        let cells = INPUT_SIZE / stride;
        for &anchor in anchors {
            for grid_row in 0..cells {
                for (grid_col, row) in (0..cells).zip(rows.by_ref()) {
                    if sigmoid(row[4]) <= obj_threshold {
                        continue;
                    }
                    candidates.push(decode_cell(
                        row,
                        stride as f32,
                        anchor,
                        grid_row,
                        grid_col,
                        ratio,
                    ));
                }
            }
        }
    }
    Ok(candidates)
}

/// Decodes one grid cell into frame pixel space.
///
/// `ratio` is frame size over network input size, per axis. The box origin,
/// the box size and each landmark are truncated to whole pixels, landmarks
/// once in input space and again after scaling.
fn decode_cell(
    row: &[f32],
    stride: f32,
    anchor: (f32, f32),
    grid_row: usize,
    grid_col: usize,
    ratio: (f32, f32),
) -> Detection {
    let (anchor_w, anchor_h) = anchor;
    let (ratio_w, ratio_h) = ratio;
    let (col, grid_y) = (grid_col as f32, grid_row as f32);

    let cx = (sigmoid(row[0]) * 2.0 - 0.5 + col) * stride;
    let cy = (sigmoid(row[1]) * 2.0 - 0.5 + grid_y) * stride;
    let w = (sigmoid(row[2]) * 2.0).powi(2) * anchor_w;
    let h = (sigmoid(row[3]) * 2.0).powi(2) * anchor_h;

    let left = ((cx - 0.5 * w) * ratio_w).trunc();
    let top = ((cy - 0.5 * h) * ratio_h).trunc();
    let bbox = BoundingBox::new(
        left,
        top,
        left + (w * ratio_w).trunc(),
        top + (h * ratio_h).trunc(),
    );

    let landmarks = row[5..5 + LANDMARKS * 2]
        .chunks_exact(2)
        .map(|point| {
            (
                ((point[0] * anchor_w + col * stride).trunc() * ratio_w).trunc(),
                ((point[1] * anchor_h + grid_y * stride).trunc() * ratio_h).trunc(),
            )
        })
        .collect();

    Detection {
        confidence: sigmoid(row[15]),
        bbox,
        landmarks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::infrastructure::annotation::{BOX_COLOR, LANDMARK_COLOR};
    use crate::shared::capabilities::PixelFormat;
    use approx::assert_relative_eq;
    use ndarray::{Array4, IxDyn};
    use rstest::rstest;

    /// `σ(CENTERED) * 2 - 0.5 == 0`, so the decoded center sits exactly on
    /// `grid_index * stride`.
    const CENTERED: f32 = -1.098_612_3; // ln(1/3)
    const OFF: f32 = -10.0;
    const ON: f32 = 5.0;

    fn row_index(stride_idx: usize, anchor_idx: usize, grid_row: usize, grid_col: usize) -> usize {
        let offset: usize = STRIDES[..stride_idx]
            .iter()
            .map(|&s| 3 * (INPUT_SIZE / s) * (INPUT_SIZE / s))
            .sum();
        let cells = INPUT_SIZE / STRIDES[stride_idx];
        offset + anchor_idx * cells * cells + grid_row * cells + grid_col
    }

    fn cell(face_score: f32) -> [f32; VALUES_PER_ROW] {
        let mut row = [0.0; VALUES_PER_ROW];
        row[0] = CENTERED;
        row[1] = CENTERED;
        row[4] = ON;
        row[15] = face_score;
        row
    }

    /// Full-size output with every objectness switched off unless set.
    struct FakeGridModel {
        data: Vec<f32>,
        split: bool,
    }

    impl FakeGridModel {
        fn empty() -> Self {
            Self {
                data: vec![OFF; expected_rows() * VALUES_PER_ROW],
                split: false,
            }
        }

        fn set(mut self, index: usize, row: [f32; VALUES_PER_ROW]) -> Self {
            let start = index * VALUES_PER_ROW;
            self.data[start..start + VALUES_PER_ROW].copy_from_slice(&row);
            self
        }

        fn split_per_stride(mut self) -> Self {
            self.split = true;
            self
        }
    }

    impl InferenceModel for FakeGridModel {
        fn forward(&mut self, input: Array4<f32>) -> Result<Vec<ArrayD<f32>>, FrameError> {
            assert_eq!(input.shape(), &[1, 3, INPUT_SIZE, INPUT_SIZE]);
            if !self.split {
                let rows = self.data.len() / VALUES_PER_ROW;
                let tensor =
                    ArrayD::from_shape_vec(IxDyn(&[1, rows, VALUES_PER_ROW]), self.data.clone())
                        .unwrap();
                return Ok(vec![tensor]);
            }
            let mut start = 0;
            let mut tensors = Vec::new();
            for stride in STRIDES {
                let cells = INPUT_SIZE / stride;
                let len = 3 * cells * cells * VALUES_PER_ROW;
                let chunk = self.data[start..start + len].to_vec();
                tensors.push(
                    ArrayD::from_shape_vec(IxDyn(&[1, 3, cells, cells, VALUES_PER_ROW]), chunk)
                        .unwrap(),
                );
                start += len;
            }
            Ok(tensors)
        }
    }

    struct ShortModel;

    impl InferenceModel for ShortModel {
        fn forward(&mut self, _input: Array4<f32>) -> Result<Vec<ArrayD<f32>>, FrameError> {
            Ok(vec![ArrayD::zeros(IxDyn(&[1, 100, VALUES_PER_ROW]))])
        }
    }

    struct FailingModel;

    impl InferenceModel for FailingModel {
        fn forward(&mut self, _input: Array4<f32>) -> Result<Vec<ArrayD<f32>>, FrameError> {
            Err(FrameError::Inference("session run failed".into()))
        }
    }

    fn square_caps() -> CapabilityDescriptor {
        CapabilityDescriptor::new(640, 640, PixelFormat::Bgr24)
    }

    fn detector(model: impl InferenceModel + 'static) -> AnchorGridFaceDetector {
        AnchorGridFaceDetector::with_model(Box::new(model), square_caps(), &DetectorConfig::new(0.3))
            .unwrap()
    }

    fn run(detector: &mut AnchorGridFaceDetector) -> Result<(Vec<Detection>, Vec<u8>), FrameError> {
        let caps = detector.capabilities();
        let input = vec![0u8; caps.frame_len()];
        let mut output = vec![0u8; caps.output_len()];
        let detections = detector.annotate(&input, &mut output)?;
        Ok((detections, output))
    }

    #[test]
    fn test_expected_rows_covers_all_scales() {
        assert_eq!(expected_rows(), 3 * (80 * 80 + 40 * 40 + 20 * 20));
    }

    #[rstest]
    #[case::stride_8(8.0, 40)]
    #[case::stride_16(16.0, 20)]
    #[case::stride_32(32.0, 10)]
    fn test_decoding_is_stride_invariant(#[case] stride: f32, #[case] index: usize) {
        let det = decode_cell(&cell(0.0), stride, (16.0, 16.0), index, index, (1.0, 1.0));

        assert_relative_eq!(det.bbox.left, 312.0, epsilon = 1e-3);
        assert_relative_eq!(det.bbox.top, 312.0, epsilon = 1e-3);
        assert_relative_eq!(det.bbox.right, 328.0, epsilon = 1e-3);
        assert_relative_eq!(det.bbox.bottom, 328.0, epsilon = 1e-3);
        for &(x, y) in &det.landmarks {
            assert_relative_eq!(x, 320.0, epsilon = 1e-3);
            assert_relative_eq!(y, 320.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_decode_cell_scales_to_frame_and_uses_anchor_per_axis() {
        let mut row = cell(0.0);
        row[5] = 1.0;
        row[6] = 1.0;
        let det = decode_cell(&row, 8.0, (4.0, 5.0), 10, 20, (2.0, 1.5));

        // w = 4, h = 5 before scaling; center (160, 80).
        assert_relative_eq!(det.bbox.left, 316.0, epsilon = 1e-3);
        // 116.25 and 7.5 truncate to whole pixels.
        assert_relative_eq!(det.bbox.top, 116.0, epsilon = 1e-3);
        assert_relative_eq!(det.bbox.width(), 8.0, epsilon = 1e-3);
        assert_relative_eq!(det.bbox.height(), 7.0, epsilon = 1e-3);
        assert_eq!(det.landmarks.len(), 5);
        assert_relative_eq!(det.landmarks[0].0, (4.0 + 160.0) * 2.0, epsilon = 1e-3);
        // (5 + 80) * 1.5 = 127.5
        assert_relative_eq!(det.landmarks[0].1, 127.0, epsilon = 1e-3);
        assert_relative_eq!(det.confidence, 0.5);
    }

    #[test]
    fn test_landmark_is_truncated_before_scaling() {
        let mut row = cell(0.0);
        row[5] = 0.9;
        row[6] = 0.9;
        let det = decode_cell(&row, 8.0, (1.0, 1.0), 0, 0, (3.0, 3.0));

        // 0.9 truncates to 0 in input space, so the scaled point stays at 0
        // rather than landing at 2.
        assert_eq!(det.landmarks[0], (0.0, 0.0));
    }

    #[test]
    fn test_objectness_at_threshold_is_skipped() {
        let mut data = vec![OFF; expected_rows() * VALUES_PER_ROW];
        // σ(0) == 0.5, which does not exceed a 0.5 threshold.
        data[4] = 0.0;
        assert!(decode_candidates(&data, 640, 640, 0.5).unwrap().is_empty());
        assert_eq!(decode_candidates(&data, 640, 640, 0.49).unwrap().len(), 1);
    }

    #[test]
    fn test_iteration_order_is_stride_anchor_row_col() {
        let mut data = vec![OFF; expected_rows() * VALUES_PER_ROW];
        let index = row_index(1, 2, 3, 7);
        data[index * VALUES_PER_ROW..(index + 1) * VALUES_PER_ROW].copy_from_slice(&cell(0.0));

        let candidates = decode_candidates(&data, 640, 640, 0.3).unwrap();

        assert_eq!(candidates.len(), 1);
        let bbox = candidates[0].bbox;
        // stride 16, anchor (73, 105), center (7 * 16, 3 * 16); origin
        // (75.5, -4.5) truncates toward zero.
        assert_relative_eq!(bbox.width(), 73.0, epsilon = 1e-3);
        assert_relative_eq!(bbox.height(), 105.0, epsilon = 1e-3);
        assert_relative_eq!(bbox.left, 75.0, epsilon = 1e-3);
        assert_relative_eq!(bbox.top, -4.0, epsilon = 1e-3);
    }

    #[test]
    fn test_overlapping_candidates_keep_only_the_best() {
        // Anchor (146, 217) at stride 32: centers 32 px apart give IoU ~0.64,
        // 96 px apart give IoU ~0.21.
        let model = FakeGridModel::empty()
            .set(row_index(2, 0, 5, 5), cell(2.0))
            .set(row_index(2, 0, 5, 6), cell(1.0))
            .set(row_index(2, 0, 5, 8), cell(0.5));
        let mut det = detector(model);

        let (detections, _) = run(&mut det).unwrap();

        assert_eq!(detections.len(), 2);
        assert_relative_eq!(detections[0].confidence, sigmoid(2.0));
        assert_relative_eq!(detections[1].confidence, sigmoid(0.5));
        assert_relative_eq!(detections[0].bbox.left, 160.0 - 73.0, epsilon = 1e-3);
        assert_relative_eq!(detections[1].bbox.left, 256.0 - 73.0, epsilon = 1e-3);
    }

    #[test]
    fn test_low_face_score_is_filtered_by_suppression_step() {
        // Objectness passes, face score σ(-3) ≈ 0.05 does not.
        let model = FakeGridModel::empty().set(row_index(2, 0, 5, 5), cell(-3.0));
        let mut det = detector(model);
        let (detections, _) = run(&mut det).unwrap();
        assert!(detections.is_empty());
    }

    #[test]
    fn test_kept_detection_is_drawn_with_landmarks() {
        let model = FakeGridModel::empty().set(row_index(2, 0, 5, 5), cell(2.0));
        let mut det = detector(model);

        let (detections, output) = run(&mut det).unwrap();

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].landmarks.len(), 5);
        let pixel = |x: usize, y: usize| {
            let idx = (y * 640 + x) * 3;
            [output[idx], output[idx + 1], output[idx + 2]]
        };
        // Landmarks with zero offsets land on the cell origin (160, 160).
        assert_eq!(pixel(160, 160), LANDMARK_COLOR);
        let bbox = detections[0].bbox;
        assert_eq!(pixel(bbox.left as usize, 160), BOX_COLOR);
    }

    #[test]
    fn test_per_stride_outputs_are_concatenated() {
        let model = FakeGridModel::empty()
            .set(row_index(0, 1, 2, 3), cell(2.0))
            .set(row_index(2, 2, 1, 1), cell(2.0))
            .split_per_stride();
        let mut det = detector(model);
        let (detections, _) = run(&mut det).unwrap();
        assert_eq!(detections.len(), 2);
    }

    #[test]
    fn test_zero_candidates_is_success() {
        let mut det = detector(FakeGridModel::empty());
        let (detections, output) = run(&mut det).unwrap();
        assert!(detections.is_empty());
        assert!(output.iter().all(|&v| v == 0));
    }

    fn wide_detector(model: impl InferenceModel + 'static) -> AnchorGridFaceDetector {
        let caps = CapabilityDescriptor::new(640, 480, PixelFormat::Bgr24);
        AnchorGridFaceDetector::with_model(Box::new(model), caps, &DetectorConfig::new(0.3))
            .unwrap()
    }

    fn gradient(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_zero_objects_on_640x480_leaves_frame_unchanged() {
        let mut det = wide_detector(FakeGridModel::empty());
        let input = gradient(640 * 480 * 3);
        let mut output = vec![0u8; det.capabilities().output_len()];

        assert!(det.detect(&input, &mut output).unwrap());
        assert_eq!(output.len(), 640 * 480 * 3);
        assert_eq!(output, input);

        let mut output = vec![0u8; 640 * 480 * 3];
        assert!(det.annotate(&input, &mut output).unwrap().is_empty());
        assert_eq!(output, input);
    }

    #[test]
    fn test_640x480_scales_vertical_axis_only() {
        // Stride 32, anchor (146, 217), center (160, 160) in input space.
        let model = FakeGridModel::empty().set(row_index(2, 0, 5, 5), cell(2.0));
        let mut det = wide_detector(model);
        let input = vec![0u8; 640 * 480 * 3];
        let mut output = vec![0u8; 640 * 480 * 3];

        let detections = det.annotate(&input, &mut output).unwrap();

        assert_eq!(detections.len(), 1);
        let bbox = detections[0].bbox;
        assert_relative_eq!(bbox.left, 87.0, epsilon = 1e-3);
        assert_relative_eq!(bbox.width(), 146.0, epsilon = 1e-3);
        // (160 - 108.5) * 0.75 = 38.625, 217 * 0.75 = 162.75
        assert_relative_eq!(bbox.top, 38.0, epsilon = 1e-3);
        assert_relative_eq!(bbox.height(), 162.0, epsilon = 1e-3);
        assert_eq!(detections[0].landmarks[0], (160.0, 120.0));
        let idx = (120 * 640 + 160) * 3;
        assert_eq!(output[idx..idx + 3], LANDMARK_COLOR);
    }

    #[test]
    fn test_short_output_is_shape_error() {
        let mut det = detector(ShortModel);
        assert!(matches!(run(&mut det), Err(FrameError::OutputShape(_))));
    }

    #[test]
    fn test_inference_error_propagates() {
        let mut det = detector(FailingModel);
        assert!(matches!(run(&mut det), Err(FrameError::Inference(_))));
    }

    #[test]
    fn test_threshold_substitution() {
        let caps = square_caps();
        for bad in [0.0, 1.2] {
            let det = AnchorGridFaceDetector::with_model(
                Box::new(FakeGridModel::empty()),
                caps,
                &DetectorConfig::new(bad),
            )
            .unwrap();
            assert_relative_eq!(det.threshold(), DEFAULT_CONFIDENCE);
        }
    }

    #[test]
    fn test_yuyv_frame_is_annotated_in_bgr() {
        let caps = CapabilityDescriptor::new(64, 48, PixelFormat::Yuyv);
        let mut det =
            AnchorGridFaceDetector::with_model(Box::new(FakeGridModel::empty()), caps, &DetectorConfig::new(0.3))
                .unwrap();
        let input = vec![128u8; caps.frame_len()];
        let mut output = vec![0u8; caps.output_len()];

        assert!(det.detect(&input, &mut output).unwrap());
        assert_eq!(output.len(), 64 * 48 * 3);
    }

    #[test]
    fn test_missing_model_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AnchorGridFaceDetector::new(dir.path(), square_caps(), &DetectorConfig::new(0.3));
        assert!(matches!(result, Err(ConfigError::ModelNotFound(_))));
    }
}
