//! In-place drawing of detections onto canonical BGR frames.

use ndarray::ArrayViewMut3;

use crate::detection::domain::detection::{BoundingBox, Detection};
use crate::shared::frame::Frame;

pub const BOX_COLOR: [u8; 3] = [0, 255, 0];
pub const LANDMARK_COLOR: [u8; 3] = [0, 0, 255];
pub const BOX_THICKNESS: i32 = 3;
pub const LANDMARK_RADIUS: i32 = 5;
const MAX_THICKNESS: i32 = 1 << 12;

/// Draws the box outline and, when present, filled landmark dots.
pub fn draw_detection(frame: &mut Frame<'_>, detection: &Detection) {
    draw_rectangle(frame, &detection.bbox, BOX_COLOR, BOX_THICKNESS);
    let (width, height) = (frame.width() as i32, frame.height() as i32);
    for &(x, y) in &detection.landmarks {
        let cx = to_pixel(x, width, LANDMARK_RADIUS);
        let cy = to_pixel(y, height, LANDMARK_RADIUS);
        fill_circle(frame, cx, cy, LANDMARK_RADIUS, LANDMARK_COLOR);
    }
}

/// Outlines `bbox` with a line of `thickness` pixels centered on its edges.
///
/// Corners are truncated to integer pixels; anything outside the frame is
/// clipped.
pub fn draw_rectangle(frame: &mut Frame<'_>, bbox: &BoundingBox, color: [u8; 3], thickness: i32) {
    let thickness = thickness.clamp(1, MAX_THICKNESS);
    let (width, height) = (frame.width() as i32, frame.height() as i32);
    let (x1, x2) = ordered(
        to_pixel(bbox.left, width, thickness),
        to_pixel(bbox.right, width, thickness),
    );
    let (y1, y2) = ordered(
        to_pixel(bbox.top, height, thickness),
        to_pixel(bbox.bottom, height, thickness),
    );
    let lo = (thickness - 1) / 2;
    let hi = thickness - 1 - lo;

    let mut view = frame.as_ndarray_mut();
    fill_rect(&mut view, x1 - lo, y1 - lo, x2 + hi, y1 + hi, color);
    fill_rect(&mut view, x1 - lo, y2 - lo, x2 + hi, y2 + hi, color);
    fill_rect(&mut view, x1 - lo, y1 - lo, x1 + hi, y2 + hi, color);
    fill_rect(&mut view, x2 - lo, y1 - lo, x2 + hi, y2 + hi, color);
}

/// Paints a filled disc of `radius` around `(cx, cy)`, clipped to the frame.
pub fn fill_circle(frame: &mut Frame<'_>, cx: i32, cy: i32, radius: i32, color: [u8; 3]) {
    let mut view = frame.as_ndarray_mut();
    let (height, width) = (view.shape()[0] as i32, view.shape()[1] as i32);
    let radius = radius.clamp(0, MAX_THICKNESS);
    let r2 = i64::from(radius * radius);
    let ys = cy.saturating_sub(radius).max(0)..=cy.saturating_add(radius).min(height - 1);
    for y in ys {
        let xs = cx.saturating_sub(radius).max(0)..=cx.saturating_add(radius).min(width - 1);
        for x in xs {
            let (dx, dy) = (i64::from(x) - i64::from(cx), i64::from(y) - i64::from(cy));
            if dx * dx + dy * dy <= r2 {
                put_pixel(&mut view, x as usize, y as usize, color);
            }
        }
    }
}

/// Fills the inclusive rectangle `[x1, x2] × [y1, y2]`, clipped to the frame.
fn fill_rect(view: &mut ArrayViewMut3<'_, u8>, x1: i32, y1: i32, x2: i32, y2: i32, color: [u8; 3]) {
    let (height, width) = (view.shape()[0] as i32, view.shape()[1] as i32);
    let (x1, x2) = (x1.max(0), x2.min(width - 1));
    let (y1, y2) = (y1.max(0), y2.min(height - 1));
    for y in y1..=y2 {
        for x in x1..=x2 {
            put_pixel(view, x as usize, y as usize, color);
        }
    }
}

fn put_pixel(view: &mut ArrayViewMut3<'_, u8>, x: usize, y: usize, color: [u8; 3]) {
    for (c, &value) in color.iter().enumerate() {
        view[[y, x, c]] = value;
    }
}

/// Truncates `v` to a pixel index kept within `margin` of `[0, extent)`.
///
/// Anything further out is invisible once clipped, and the bound keeps the
/// edge arithmetic well inside `i32`. NaN maps to 0.
fn to_pixel(v: f32, extent: i32, margin: i32) -> i32 {
    let (lo, hi) = (-(margin as f32) - 1.0, (extent + margin) as f32);
    v.clamp(lo, hi) as i32
}

fn ordered(a: i32, b: i32) -> (i32, i32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
