use std::path::{Path, PathBuf};

use crate::shared::capabilities::CapabilityDescriptor;
use crate::video::domain::frame_sink::FrameSink;

/// Writes each annotated frame to an image file using the `image` crate.
///
/// Frame 0 goes to the configured path; later frames get an index suffix
/// (`out.png`, `out_1.png`, `out_2.png`, ...).
pub struct ImageFileSink {
    path: PathBuf,
}

impl ImageFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn path_for(&self, index: usize) -> PathBuf {
        if index == 0 {
            return self.path.clone();
        }
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match self.path.extension() {
            Some(ext) => format!("{stem}_{index}.{}", ext.to_string_lossy()),
            None => format!("{stem}_{index}"),
        };
        self.path.with_file_name(name)
    }
}

fn write_bgr(path: &Path, data: &[u8], width: u32, height: u32) -> Result<(), Box<dyn std::error::Error>> {
    // Ensure parent directory exists (infrastructure concern)
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut rgb = data[..(width * height * 3) as usize].to_vec();
    for px in rgb.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
    let img = image::RgbImage::from_raw(width, height, rgb)
        .ok_or("Failed to create image from frame data")?;
    img.save(path)?;
    Ok(())
}

impl FrameSink for ImageFileSink {
    fn write(
        &mut self,
        index: usize,
        data: &[u8],
        caps: &CapabilityDescriptor,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let required = caps.output_len();
        if data.len() < required {
            return Err(format!("frame holds {} bytes, needs {required}", data.len()).into());
        }
        let path = self.path_for(index);
        write_bgr(&path, data, caps.width() as u32, caps.height() as u32)?;
        log::debug!("Wrote frame {index} to {}", path.display());
        Ok(())
    }
}
