use std::time::Instant;

/// Cross-cutting logger for frame-delivery events.
///
/// Decouples the annotation loop from specific output mechanisms so callers
/// can observe per-frame behavior without changing the orchestration code.
pub trait PipelineLogger: Send {
    /// Report frame-level progress. `total` is 0 when unknown.
    fn progress(&mut self, current: usize, total: usize);

    /// Record a frame that was annotated and forwarded.
    fn frame_annotated(&mut self, index: usize, detect_ms: f64);

    /// Record a frame that was dropped instead of forwarded.
    fn frame_skipped(&mut self, index: usize, reason: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn frame_annotated(&mut self, _index: usize, _detect_ms: f64) {}
    fn frame_skipped(&mut self, _index: usize, _reason: &str) {}
}

/// CLI-oriented logger that tracks detect latency and skipped frames and
/// reports a summary at the end of the run.
///
/// Only running totals and the first skipped frame are kept, so memory stays
/// flat on unbounded capture streams. Progress output is throttled to every
/// `throttle_frames` frames.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    annotated: usize,
    total_detect_ms: f64,
    max_detect_ms: f64,
    skipped: usize,
    first_skipped: Option<(usize, String)>,
    start_time: Instant,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            annotated: 0,
            total_detect_ms: 0.0,
            max_detect_ms: 0.0,
            skipped: 0,
            first_skipped: None,
            start_time: Instant::now(),
        }
    }

    /// Returns the formatted summary string, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.annotated == 0 && self.skipped == 0 {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let annotated = self.annotated;
        let mut lines = vec![format!(
            "Annotation summary ({annotated} annotated, {} skipped, {:.1}s total):",
            self.skipped,
            elapsed_ms / 1000.0
        )];

        if annotated > 0 {
            let total_ms = self.total_detect_ms;
            let avg_ms = total_ms / annotated as f64;
            let max_ms = self.max_detect_ms;
            lines.push(format!(
                "  detect: avg {avg_ms:6.1}ms  max {max_ms:6.1}ms  total {total_ms:7.0}ms"
            ));
        }

        if let Some((index, reason)) = &self.first_skipped {
            lines.push(format!("  first skipped frame {index}: {reason}"));
        }

        if annotated > 0 && elapsed_ms > 0.0 {
            let fps = annotated as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn annotated_count(&self) -> usize {
        self.annotated
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped
    }

    /// Index of the first dropped frame and why it was dropped.
    pub fn first_skipped(&self) -> Option<(usize, &str)> {
        self.first_skipped
            .as_ref()
            .map(|(index, reason)| (*index, reason.as_str()))
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        if current % self.throttle_frames == 0 || current == total {
            if total > 0 {
                let pct = current as f64 / total as f64 * 100.0;
                log::info!("Annotating: {current}/{total} frames ({pct:.1}%)");
            } else {
                log::info!("Annotating: {current} frames");
            }
        }
    }

    fn frame_annotated(&mut self, _index: usize, detect_ms: f64) {
        self.annotated += 1;
        self.total_detect_ms += detect_ms;
        self.max_detect_ms = self.max_detect_ms.max(detect_ms);
    }

    fn frame_skipped(&mut self, index: usize, reason: &str) {
        self.skipped += 1;
        if self.first_skipped.is_none() {
            self.first_skipped = Some((index, reason.to_string()));
        }
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
