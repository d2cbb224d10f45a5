use crate::detection::domain::detection::Detection;
use crate::detection::domain::errors::FrameError;
use crate::shared::capabilities::CapabilityDescriptor;

/// Domain interface every detection algorithm implements.
///
/// Calls take `&mut self`: implementations reuse an internal scratch buffer,
/// so a detector is not reentrant. Run one detector per thread if frames are
/// ever processed in parallel.
pub trait ObjectDetector: Send {
    /// Registry name of the algorithm.
    fn name(&self) -> &'static str;

    /// Geometry and pixel layout this detector was built for.
    fn capabilities(&self) -> CapabilityDescriptor;

    /// Runs the full per-frame pipeline and returns what was drawn.
    ///
    /// `input` must be exactly `capabilities().frame_len()` bytes and
    /// `output` at least `capabilities().output_len()` bytes. On success
    /// `output` holds the annotated BGR frame, even when nothing was found.
    fn annotate(&mut self, input: &[u8], output: &mut [u8])
        -> Result<Vec<Detection>, FrameError>;

    /// Annotates one frame; `Ok(false)` means there is no usable result to
    /// forward. An empty frame is still a usable result.
    fn detect(&mut self, input: &[u8], output: &mut [u8]) -> Result<bool, FrameError> {
        self.annotate(input, output).map(|_| true)
    }
}
