use std::path::Path;

use crate::shared::stream_metadata::StreamMetadata;

/// Yields raw frames in the layout described by the returned metadata.
///
/// Each item is exactly `capabilities.frame_len()` bytes, ready to hand to
/// a detector.
pub trait FrameSource: Send {
    /// Opens the source and reports its geometry and pixel format.
    fn open(&mut self, path: &Path) -> Result<StreamMetadata, Box<dyn std::error::Error>>;

    /// Returns an iterator over raw frames in capture order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Vec<u8>, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held by the source.
    fn close(&mut self);
}
