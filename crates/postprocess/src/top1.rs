use crate::error::PostprocessError;
use crate::extract::Detection;

/// Class names indexed by class id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, class_id: usize) -> Result<&str, PostprocessError> {
        self.labels
            .get(class_id)
            .map(String::as_str)
            .ok_or(PostprocessError::Lookup {
                class_id,
                num_labels: self.labels.len(),
            })
    }
}

/// Top-1 outcome. Name and score are either both set or both empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Prediction {
    top1: Option<(String, f32)>,
}

impl Prediction {
    pub fn new(class_name: impl Into<String>, score: f32) -> Self {
        Self {
            top1: Some((class_name.into(), score)),
        }
    }

    pub fn empty() -> Self {
        Self { top1: None }
    }

    pub fn is_empty(&self) -> bool {
        self.top1.is_none()
    }

    pub fn top1_class_name(&self) -> Option<&str> {
        self.top1.as_ref().map(|(name, _)| name.as_str())
    }

    pub fn top1_score(&self) -> Option<f32> {
        self.top1.as_ref().map(|(_, score)| *score)
    }
}

/// Highest scoring detection mapped to its label. Earliest wins ties.
pub fn reduce_top1(detections: &[Detection], labels: &LabelTable) -> Result<Prediction, PostprocessError> {
    let best = detections.iter().fold(None::<&Detection>, |best, det| match best {
        Some(b) if det.score <= b.score => Some(b),
        _ => Some(det),
    });

    match best {
        None => Ok(Prediction::empty()),
        Some(det) => {
            let class_name = labels.get(det.class_id)?;
            Ok(Prediction::new(class_name, det.score))
        }
    }
}
