//! Numeric helpers shared by the decoders: logistic activation and greedy
//! non-max suppression.

use crate::detection::domain::detection::Detection;

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Greedy NMS.
///
/// Candidates whose confidence does not exceed `score_threshold` are dropped
/// first. The rest are sorted by confidence (descending, stable); each kept
/// box suppresses every later box whose IoU with it exceeds `iou_threshold`.
pub fn non_max_suppression(
    candidates: Vec<Detection>,
    score_threshold: f32,
    iou_threshold: f32,
) -> Vec<Detection> {
    let mut dets: Vec<Detection> = candidates
        .into_iter()
        .filter(|d| d.confidence > score_threshold)
        .collect();
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut suppressed = vec![false; dets.len()];
    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        for j in (i + 1)..dets.len() {
            if !suppressed[j] && dets[i].bbox.iou(&dets[j].bbox) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    dets.into_iter()
        .zip(suppressed)
        .filter_map(|(det, gone)| (!gone).then_some(det))
        .collect()
}
