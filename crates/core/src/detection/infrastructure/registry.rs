use std::path::Path;

use crate::detection::domain::detector_config::DetectorConfig;
use crate::detection::domain::errors::ConfigError;
use crate::shared::capabilities::CapabilityDescriptor;

use super::anchor_grid_face_detector::{self, AnchorGridFaceDetector};
use super::detector::Detector;
use super::ssd_face_detector::{self, SsdFaceDetector};

/// Builds a detector from a model directory, capabilities and settings.
pub type ConstructFn =
    fn(&Path, CapabilityDescriptor, &DetectorConfig) -> Result<Detector, ConfigError>;

pub struct RegistryEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub construct: ConstructFn,
}

pub const DEFAULT_MODEL: &str = ssd_face_detector::NAME;

static REGISTRY: &[RegistryEntry] = &[
    RegistryEntry {
        name: ssd_face_detector::NAME,
        description: "ResNet-10 SSD face detector, 300x300 input",
        construct: construct_ssd,
    },
    RegistryEntry {
        name: anchor_grid_face_detector::NAME,
        description: "YOLOv5s face detector with landmarks, 640x640 input",
        construct: construct_anchor_grid,
    },
];

fn construct_ssd(
    dir: &Path,
    caps: CapabilityDescriptor,
    config: &DetectorConfig,
) -> Result<Detector, ConfigError> {
    SsdFaceDetector::new(dir, caps, config).map(Detector::from)
}

fn construct_anchor_grid(
    dir: &Path,
    caps: CapabilityDescriptor,
    config: &DetectorConfig,
) -> Result<Detector, ConfigError> {
    AnchorGridFaceDetector::new(dir, caps, config).map(Detector::from)
}

pub fn entries() -> &'static [RegistryEntry] {
    REGISTRY
}

/// Exact-name lookup.
pub fn lookup(name: &str) -> Option<&'static RegistryEntry> {
    REGISTRY.iter().find(|entry| entry.name == name)
}

pub fn model_names() -> Vec<&'static str> {
    REGISTRY.iter().map(|entry| entry.name).collect()
}

/// Selects and constructs the detector registered under `name`.
pub fn create_detector(
    name: &str,
    model_dir: &Path,
    caps: CapabilityDescriptor,
    config: &DetectorConfig,
) -> Result<Detector, ConfigError> {
    let entry = lookup(name).ok_or_else(|| ConfigError::UnknownModel {
        name: name.to_string(),
        available: model_names().join(", "),
    })?;
    log::info!(
        "Creating detector {} for {}x{} {} from {}",
        entry.name,
        caps.width(),
        caps.height(),
        caps.pixel_format(),
        model_dir.display()
    );
    (entry.construct)(model_dir, caps, config)
}
