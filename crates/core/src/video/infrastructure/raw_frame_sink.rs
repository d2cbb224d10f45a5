use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::shared::capabilities::CapabilityDescriptor;
use crate::video::domain::frame_sink::FrameSink;

/// Appends annotated BGR frames back-to-back into one file.
///
/// The file is created on the first write, so a run that produces no frames
/// leaves nothing behind.
pub struct RawFrameSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl RawFrameSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
        }
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>, std::io::Error> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => {
                if let Some(parent) = self.path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                BufWriter::new(File::create(&self.path)?)
            }
        };
        Ok(self.writer.insert(writer))
    }
}

impl FrameSink for RawFrameSink {
    fn write(
        &mut self,
        _index: usize,
        data: &[u8],
        caps: &CapabilityDescriptor,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let len = caps.output_len();
        if data.len() < len {
            return Err(format!("frame holds {} bytes, needs {len}", data.len()).into());
        }
        self.writer()?.write_all(&data[..len])?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}
