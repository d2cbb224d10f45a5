use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::shared::capabilities::CapabilityDescriptor;
use crate::shared::stream_metadata::StreamMetadata;
use crate::video::domain::frame_source::FrameSource;

/// Reads a dump of back-to-back raw frames, as a capture device would
/// deliver them.
///
/// Raw files carry no header, so the geometry and pixel format are supplied
/// up front. The file length must be a whole number of frames.
pub struct RawFrameSource {
    caps: CapabilityDescriptor,
    reader: Option<BufReader<File>>,
    remaining: usize,
}

impl RawFrameSource {
    pub fn new(caps: CapabilityDescriptor) -> Self {
        Self {
            caps,
            reader: None,
            remaining: 0,
        }
    }
}

impl FrameSource for RawFrameSource {
    fn open(&mut self, path: &Path) -> Result<StreamMetadata, Box<dyn std::error::Error>> {
        let frame_len = self.caps.frame_len();
        if frame_len == 0 {
            return Err("raw frame geometry must be non-zero".into());
        }

        let file = File::open(path)?;
        let file_len = file.metadata()?.len() as usize;
        if file_len == 0 || file_len % frame_len != 0 {
            return Err(format!(
                "{} is {file_len} bytes, not a multiple of the {frame_len}-byte frame size",
                path.display()
            )
            .into());
        }

        self.remaining = file_len / frame_len;
        self.reader = Some(BufReader::new(file));
        log::debug!(
            "Opened {} with {} raw {} frame(s)",
            path.display(),
            self.remaining,
            self.caps.pixel_format()
        );

        Ok(StreamMetadata {
            capabilities: self.caps,
            total_frames: self.remaining,
            source_path: Some(path.to_path_buf()),
        })
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Vec<u8>, Box<dyn std::error::Error>>> + '_> {
        let frame_len = self.caps.frame_len();
        let Some(reader) = self.reader.as_mut() else {
            return Box::new(std::iter::once(Err("RawFrameSource: not opened".into())));
        };
        let remaining = &mut self.remaining;

        Box::new(std::iter::from_fn(move || {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
            let mut frame = vec![0u8; frame_len];
            Some(
                reader
                    .read_exact(&mut frame)
                    .map(|_| frame)
                    .map_err(|e| Box::new(e) as Box<dyn std::error::Error>),
            )
        }))
    }

    fn close(&mut self) {
        self.reader = None;
        self.remaining = 0;
    }
}
