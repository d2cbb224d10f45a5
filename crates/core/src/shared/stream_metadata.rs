use std::path::PathBuf;

use crate::shared::capabilities::CapabilityDescriptor;

/// Describes an opened frame source.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamMetadata {
    pub capabilities: CapabilityDescriptor,
    /// Number of frames the source will yield, 0 when unknown.
    pub total_frames: usize,
    pub source_path: Option<PathBuf>,
}
