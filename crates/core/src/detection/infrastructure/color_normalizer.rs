/// Converts raw capture frames into the canonical BGR layout.
///
/// The conversion is chosen once, at construction: BGR input is aliased as-is,
/// YUYV input goes through ffmpeg's software scaler, anything else is rejected.
use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling::{Context as ScalingContext, Flags};
use ffmpeg_next::util::frame::video::Video;

use crate::detection::domain::errors::{ConfigError, FrameError};
use crate::shared::capabilities::{CapabilityDescriptor, PixelFormat};
use crate::shared::frame::Frame;

/// Which conversion a normalizer applies to each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorConversion {
    /// Input is already interleaved BGR.
    None,
    /// Packed YUYV 4:2:2 to BGR.
    YuyvToBgr,
}

pub struct ColorNormalizer {
    caps: CapabilityDescriptor,
    conversion: ColorConversion,
    converter: Option<YuyvConverter>,
}

// Safety: the normalizer is owned by exactly one detector and only used from
// the thread currently holding that detector. The raw pointers inside the
// ffmpeg scaler and frames are never shared.
unsafe impl Send for ColorNormalizer {}

impl ColorNormalizer {
    pub fn new(caps: CapabilityDescriptor) -> Result<Self, ConfigError> {
        let (conversion, converter) = match caps.pixel_format() {
            PixelFormat::Bgr24 => (ColorConversion::None, None),
            PixelFormat::Yuyv => (
                ColorConversion::YuyvToBgr,
                Some(YuyvConverter::new(caps.width() as u32, caps.height() as u32)?),
            ),
            other => return Err(ConfigError::UnsupportedPixelFormat(other)),
        };
        log::debug!(
            "Color normalizer for {}x{} {}: {:?}",
            caps.width(),
            caps.height(),
            caps.pixel_format(),
            conversion
        );
        Ok(Self {
            caps,
            conversion,
            converter,
        })
    }

    pub fn conversion(&self) -> ColorConversion {
        self.conversion
    }

    /// Views `raw` as a canonical BGR frame.
    ///
    /// Without conversion the returned frame aliases `raw`; otherwise it owns
    /// freshly converted pixels. `raw` must be `frame_len()` bytes.
    pub fn normalize<'a>(&mut self, raw: &'a mut [u8]) -> Result<Frame<'a>, FrameError> {
        let width = self.caps.width() as u32;
        let height = self.caps.height() as u32;
        match self.converter.as_mut() {
            None => Ok(Frame::borrowed(raw, width, height)),
            Some(converter) => {
                let pixels = converter.convert(raw)?;
                Ok(Frame::owned(pixels, width, height))
            }
        }
    }
}

struct YuyvConverter {
    scaler: ScalingContext,
    source: Video,
    target: Video,
    width: usize,
    height: usize,
}

impl YuyvConverter {
    fn new(width: u32, height: u32) -> Result<Self, ConfigError> {
        ffmpeg_next::init().map_err(|e| ConfigError::Scaler(e.to_string()))?;
        let scaler = ScalingContext::get(
            Pixel::YUYV422,
            width,
            height,
            Pixel::BGR24,
            width,
            height,
            Flags::BILINEAR,
        )
        .map_err(|e| ConfigError::Scaler(e.to_string()))?;

        Ok(Self {
            scaler,
            source: Video::new(Pixel::YUYV422, width, height),
            target: Video::empty(),
            width: width as usize,
            height: height as usize,
        })
    }

    fn convert(&mut self, raw: &[u8]) -> Result<Vec<u8>, FrameError> {
        let src_row = self.width * 2;
        let stride = self.source.stride(0);
        let plane = self.source.data_mut(0);
        for (row, line) in raw.chunks_exact(src_row).take(self.height).enumerate() {
            let start = row * stride;
            plane[start..start + src_row].copy_from_slice(line);
        }

        self.scaler
            .run(&self.source, &mut self.target)
            .map_err(|e| FrameError::Conversion(e.to_string()))?;

        let dst_row = self.width * 3;
        let stride = self.target.stride(0);
        let data = self.target.data(0);
        let mut pixels = Vec::with_capacity(dst_row * self.height);
        for row in 0..self.height {
            let start = row * stride;
            pixels.extend_from_slice(&data[start..start + dst_row]);
        }
        Ok(pixels)
    }
}
