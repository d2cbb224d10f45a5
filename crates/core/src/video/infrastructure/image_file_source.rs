use std::path::Path;

use crate::shared::capabilities::{CapabilityDescriptor, PixelFormat};
use crate::shared::stream_metadata::StreamMetadata;
use crate::video::domain::frame_source::FrameSource;

/// Adapts a single image file to the [`FrameSource`] interface.
///
/// The image is decoded with the `image` crate and delivered as one BGR24
/// frame, the same layout a BGR capture device would produce.
pub struct ImageFileSource {
    frame: Option<Vec<u8>>,
}

impl ImageFileSource {
    pub fn new() -> Self {
        Self { frame: None }
    }
}

impl Default for ImageFileSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Reorders interleaved RGB into BGR in place.
fn swap_red_blue(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
}

impl FrameSource for ImageFileSource {
    fn open(&mut self, path: &Path) -> Result<StreamMetadata, Box<dyn std::error::Error>> {
        let img = image::open(path)?.to_rgb8();
        let width = u16::try_from(img.width())
            .map_err(|_| format!("image width {} exceeds 65535", img.width()))?;
        let height = u16::try_from(img.height())
            .map_err(|_| format!("image height {} exceeds 65535", img.height()))?;

        let mut pixels = img.into_raw();
        swap_red_blue(&mut pixels);
        self.frame = Some(pixels);

        Ok(StreamMetadata {
            capabilities: CapabilityDescriptor::new(width, height, PixelFormat::Bgr24),
            total_frames: 1,
            source_path: Some(path.to_path_buf()),
        })
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Vec<u8>, Box<dyn std::error::Error>>> + '_> {
        match self.frame.take() {
            Some(frame) => Box::new(std::iter::once(Ok(frame))),
            None => Box::new(std::iter::once(Err("ImageFileSource: not opened".into()))),
        }
    }

    fn close(&mut self) {
        self.frame = None;
    }
}
