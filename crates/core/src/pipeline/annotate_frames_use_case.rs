use std::time::Instant;

use crate::detection::domain::object_detector::ObjectDetector;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::shared::stream_metadata::StreamMetadata;
use crate::video::domain::frame_sink::FrameSink;
use crate::video::domain::frame_source::FrameSource;

/// Outcome of one annotation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnnotationSummary {
    pub processed: usize,
    pub skipped: usize,
}

/// Frame-delivery loop: read → detect → forward.
///
/// A frame the detector fails on, or reports as unusable, is dropped and the
/// loop moves on. Source and sink failures end the run.
pub struct AnnotateFramesUseCase {
    source: Box<dyn FrameSource>,
    sink: Box<dyn FrameSink>,
    detector: Box<dyn ObjectDetector>,
    logger: Box<dyn PipelineLogger>,
}

impl AnnotateFramesUseCase {
    /// `source` must already be open; its metadata is passed to `execute`.
    pub fn new(
        source: Box<dyn FrameSource>,
        sink: Box<dyn FrameSink>,
        detector: Box<dyn ObjectDetector>,
        logger: Option<Box<dyn PipelineLogger>>,
    ) -> Self {
        Self {
            source,
            sink,
            detector,
            logger: logger.unwrap_or_else(|| Box::new(NullPipelineLogger)),
        }
    }

    pub fn execute(
        &mut self,
        metadata: &StreamMetadata,
    ) -> Result<AnnotationSummary, Box<dyn std::error::Error>> {
        let caps = self.detector.capabilities();
        if metadata.capabilities != caps {
            return Err(format!(
                "source delivers {}x{} {}, detector expects {}x{} {}",
                metadata.capabilities.width(),
                metadata.capabilities.height(),
                metadata.capabilities.pixel_format(),
                caps.width(),
                caps.height(),
                caps.pixel_format()
            )
            .into());
        }

        let mut summary = AnnotationSummary::default();
        let result = self.annotate_all(metadata, &mut summary);

        // Frames already forwarded are flushed even when the run fails.
        self.source.close();
        let finished = self.sink.finish();
        result?;
        finished?;
        self.logger.summary();
        Ok(summary)
    }

    fn annotate_all(
        &mut self,
        metadata: &StreamMetadata,
        summary: &mut AnnotationSummary,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let caps = self.detector.capabilities();
        for (index, frame) in self.source.frames().enumerate() {
            let frame = frame?;
            let mut output = vec![0u8; caps.output_len()];

            let start = Instant::now();
            let result = self.detector.detect(&frame, &mut output);
            let detect_ms = start.elapsed().as_secs_f64() * 1000.0;

            match result {
                Ok(true) => {
                    self.sink.write(index, &output, &caps)?;
                    self.logger.frame_annotated(index, detect_ms);
                    summary.processed += 1;
                }
                Ok(false) => {
                    log::warn!("Frame {index}: no usable result, skipping");
                    self.logger.frame_skipped(index, "no usable result");
                    summary.skipped += 1;
                }
                Err(e) => {
                    log::warn!("Detector error on frame {index}: {e}");
                    self.logger.frame_skipped(index, &e.to_string());
                    summary.skipped += 1;
                }
            }
            self.logger.progress(index + 1, metadata.total_frames);
        }
        Ok(())
    }
}
