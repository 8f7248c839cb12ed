use crate::geometry::{BoundingBox, ScaleFactors};
use crate::tensor::RawOutput;

/// A provisional detection, before suppression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub bbox: BoundingBox,
    pub score: f32,
    pub class_id: usize,
}

/// A candidate that survived suppression.
pub type Detection = Candidate;

/// Keep every row whose best class score reaches `confidence_threshold`
/// and map its box into original image pixels.
#[tracing::instrument(skip_all, fields(candidates = raw.num_candidates(), classes = raw.num_classes()))]
pub fn extract(raw: &RawOutput<'_>, scale: &ScaleFactors, confidence_threshold: f32) -> Vec<Candidate> {
    let candidates: Vec<Candidate> = raw
        .rows()
        .filter_map(|row| {
            let (class_id, score) = row.best_class();
            if score.is_nan() || score < confidence_threshold {
                return None;
            }
            Some(Candidate {
                bbox: scale.scale_box(row.bbox()),
                score,
                class_id,
            })
        })
        .collect();

    tracing::debug!(kept = candidates.len(), "Extracted candidates");
    candidates
}
