//! Greedy, class-agnostic non-maximum suppression.

use crate::extract::{Candidate, Detection};

/// Indices of the candidates kept by greedy NMS, highest score first.
///
/// Candidates are visited by descending score (ties keep input order). A
/// candidate is dropped when its IoU with an already kept box is strictly
/// greater than `iou_threshold`. Class ids are ignored.
pub fn suppress_indices(candidates: &[Candidate], iou_threshold: f32) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    // stable: equal scores stay in extraction order
    order.sort_by(|&a, &b| candidates[b].score.total_cmp(&candidates[a].score));

    let mut keep: Vec<usize> = Vec::new();
    let mut suppressed = vec![false; candidates.len()];

    for (pos, &i) in order.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        keep.push(i);

        let kept_box = &candidates[i].bbox;
        for &j in &order[pos + 1..] {
            if !suppressed[j] && kept_box.iou(&candidates[j].bbox) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}

/// Kept candidates in keep order.
#[tracing::instrument(skip(candidates), fields(candidates = candidates.len()))]
pub fn suppress(candidates: &[Candidate], iou_threshold: f32) -> Vec<Detection> {
    let detections: Vec<Detection> = suppress_indices(candidates, iou_threshold)
        .into_iter()
        .map(|i| candidates[i])
        .collect();

    tracing::debug!(kept = detections.len(), "Suppressed overlapping candidates");
    detections
}
