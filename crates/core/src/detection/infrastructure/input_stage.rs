use crate::detection::domain::errors::{ConfigError, FrameError};
use crate::detection::infrastructure::color_normalizer::ColorNormalizer;
use crate::shared::capabilities::CapabilityDescriptor;
use crate::shared::frame::Frame;

/// Front half of every detector: boundary checks, scratch copy, color
/// normalization.
///
/// The scratch buffer is sized once from the capabilities and overwritten on
/// every frame, which is what makes detectors non-reentrant.
pub struct InputStage {
    caps: CapabilityDescriptor,
    normalizer: ColorNormalizer,
    scratch: Box<[u8]>,
}

impl InputStage {
    pub fn new(caps: CapabilityDescriptor) -> Result<Self, ConfigError> {
        if caps.width() == 0 || caps.height() == 0 {
            return Err(ConfigError::InvalidCapabilities {
                width: caps.width(),
                height: caps.height(),
            });
        }
        let normalizer = ColorNormalizer::new(caps)?;
        Ok(Self {
            caps,
            normalizer,
            scratch: vec![0u8; caps.frame_len()].into_boxed_slice(),
        })
    }

    pub fn capabilities(&self) -> CapabilityDescriptor {
        self.caps
    }

    /// Checks caller buffers against the capabilities.
    pub fn validate(&self, input: &[u8], output: &[u8]) -> Result<(), FrameError> {
        let expected = self.caps.frame_len();
        if input.len() != expected {
            return Err(FrameError::InputSize {
                expected,
                actual: input.len(),
            });
        }
        let required = self.caps.output_len();
        if output.len() < required {
            return Err(FrameError::OutputCapacity {
                required,
                actual: output.len(),
            });
        }
        Ok(())
    }

    /// Validates the buffers, copies `input` into scratch and returns the
    /// canonical frame to draw on.
    pub fn load(&mut self, input: &[u8], output: &[u8]) -> Result<Frame<'_>, FrameError> {
        self.validate(input, output)?;
        self.scratch.copy_from_slice(input);
        self.normalizer.normalize(&mut self.scratch)
    }
}
