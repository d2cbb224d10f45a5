use std::fmt;
use std::str::FromStr;

const fn fourcc(code: &[u8; 4]) -> u32 {
    (code[0] as u32) | (code[1] as u32) << 8 | (code[2] as u32) << 16 | (code[3] as u32) << 24
}

/// V4L2 fourcc for packed 24-bit BGR.
pub const V4L2_PIX_FMT_BGR24: u32 = fourcc(b"BGR3");

/// V4L2 fourcc for packed YUYV 4:2:2.
pub const V4L2_PIX_FMT_YUYV: u32 = fourcc(b"YUYV");

/// Pixel layout of frames delivered by the capture device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Interleaved 3-channel BGR, the canonical layout detectors consume.
    Bgr24,
    /// Packed luma-chroma 4:2:2, two bytes per pixel.
    Yuyv,
    /// Any other fourcc reported by the device.
    Other(u32),
}

impl PixelFormat {
    pub fn from_fourcc(code: u32) -> Self {
        match code {
            V4L2_PIX_FMT_BGR24 => PixelFormat::Bgr24,
            V4L2_PIX_FMT_YUYV => PixelFormat::Yuyv,
            other => PixelFormat::Other(other),
        }
    }

    pub fn fourcc(&self) -> u32 {
        match self {
            PixelFormat::Bgr24 => V4L2_PIX_FMT_BGR24,
            PixelFormat::Yuyv => V4L2_PIX_FMT_YUYV,
            PixelFormat::Other(code) => *code,
        }
    }

    /// Bytes per pixel, or 0 when the layout is unknown.
    pub fn channels(&self) -> u8 {
        match self {
            PixelFormat::Bgr24 => 3,
            PixelFormat::Yuyv => 2,
            PixelFormat::Other(_) => 0,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.fourcc();
        let text: String = (0..4)
            .map(|i| {
                let byte = ((code >> (i * 8)) & 0xFF) as u8;
                if byte.is_ascii_graphic() || byte == b' ' {
                    byte as char
                } else {
                    '.'
                }
            })
            .collect();
        f.write_str(&text)
    }
}

impl FromStr for PixelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bgr24" | "bgr3" | "bgr" => Ok(PixelFormat::Bgr24),
            "yuyv" | "yuy2" | "yuyv422" => Ok(PixelFormat::Yuyv),
            other => Err(format!(
                "unknown pixel format '{other}' (expected one of: bgr24, yuyv)"
            )),
        }
    }
}

/// Frame geometry and pixel layout reported by the capture device.
///
/// Fixed for the lifetime of a detector; every buffer handed to the detector
/// is sized from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapabilityDescriptor {
    width: u16,
    height: u16,
    pixel_format: PixelFormat,
    channels: u8,
}

impl CapabilityDescriptor {
    /// Builds a descriptor, deriving the channel count from the pixel format.
    pub fn new(width: u16, height: u16, pixel_format: PixelFormat) -> Self {
        Self {
            width,
            height,
            pixel_format,
            channels: pixel_format.channels(),
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Size in bytes of one raw input frame.
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }

    /// Size in bytes of one annotated BGR output frame.
    pub fn output_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}
