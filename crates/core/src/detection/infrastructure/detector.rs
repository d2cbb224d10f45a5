use crate::detection::domain::detection::Detection;
use crate::detection::domain::errors::FrameError;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::capabilities::CapabilityDescriptor;

use super::anchor_grid_face_detector::AnchorGridFaceDetector;
use super::ssd_face_detector::SsdFaceDetector;

/// Every detection algorithm this crate ships, as one closed type.
pub enum Detector {
    Ssd(SsdFaceDetector),
    AnchorGrid(AnchorGridFaceDetector),
}

impl Detector {
    fn inner(&self) -> &dyn ObjectDetector {
        match self {
            Detector::Ssd(d) => d,
            Detector::AnchorGrid(d) => d,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ObjectDetector {
        match self {
            Detector::Ssd(d) => d,
            Detector::AnchorGrid(d) => d,
        }
    }
}

impl ObjectDetector for Detector {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn capabilities(&self) -> CapabilityDescriptor {
        self.inner().capabilities()
    }

    fn annotate(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<Vec<Detection>, FrameError> {
        self.inner_mut().annotate(input, output)
    }

    fn detect(&mut self, input: &[u8], output: &mut [u8]) -> Result<bool, FrameError> {
        self.inner_mut().detect(input, output)
    }
}

impl From<SsdFaceDetector> for Detector {
    fn from(detector: SsdFaceDetector) -> Self {
        Detector::Ssd(detector)
    }
}

impl From<AnchorGridFaceDetector> for Detector {
    fn from(detector: AnchorGridFaceDetector) -> Self {
        Detector::AnchorGrid(detector)
    }
}
