use crate::shared::capabilities::CapabilityDescriptor;

/// Receives annotated BGR frames.
pub trait FrameSink: Send {
    /// Writes one annotated frame. `data` holds `caps.output_len()` bytes of
    /// interleaved BGR.
    fn write(
        &mut self,
        index: usize,
        data: &[u8],
        caps: &CapabilityDescriptor,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes anything buffered. Default: no-op.
    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}
