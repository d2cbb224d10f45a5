/// Axis-aligned box in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Intersection-over-union; 0 when the boxes do not overlap.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.left.max(other.left);
        let y1 = self.top.max(other.top);
        let x2 = self.right.min(other.right);
        let y2 = self.bottom.min(other.bottom);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }
}

/// One detected object in a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub confidence: f32,
    pub bbox: BoundingBox,
    /// Keypoints in pixel coordinates; empty for models without landmarks.
    pub landmarks: Vec<(f32, f32)>,
}
