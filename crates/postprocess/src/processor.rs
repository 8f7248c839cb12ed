use crate::error::PostprocessError;
use crate::extract::{Detection, extract};
use crate::geometry::ScaleFactors;
use crate::nms::suppress;
use crate::tensor::RawOutput;
use crate::top1::{LabelTable, Prediction, reduce_top1};

/// A surviving detection together with its class name.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDetection {
    pub detection: Detection,
    pub class_name: String,
}

/// Detection head post-processing: extraction, NMS and top-1 reduction.
///
/// Holds only immutable configuration, so one instance can be shared by
/// every request.
#[derive(Debug, Clone)]
pub struct PostProcessor {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    /// Model input `(width, height)`.
    pub input_shape: (u32, u32),
    pub labels: LabelTable,
}

impl PostProcessor {
    pub fn new(
        confidence_threshold: f32,
        iou_threshold: f32,
        input_shape: (u32, u32),
        labels: LabelTable,
    ) -> Self {
        Self {
            confidence_threshold,
            iou_threshold,
            input_shape,
            labels,
        }
    }

    /// All detections that survive thresholding and suppression, highest
    /// score first. Fails if any of them has no label.
    #[tracing::instrument(skip(self, raw))]
    pub fn detect(
        &self,
        raw: &RawOutput<'_>,
        img_shape: (u32, u32),
    ) -> Result<Vec<LabeledDetection>, PostprocessError> {
        let scale = ScaleFactors::new(self.input_shape, img_shape)?;

        let candidates = extract(raw, &scale, self.confidence_threshold);
        let detections = suppress(&candidates, self.iou_threshold);

        detections
            .into_iter()
            .map(|detection| {
                let class_name = self.labels.get(detection.class_id)?.to_string();
                Ok(LabeledDetection {
                    detection,
                    class_name,
                })
            })
            .collect()
    }

    /// Top-1 prediction for one image of size `img_shape` (`(width, height)`).
    pub fn process(&self, raw: &RawOutput<'_>, img_shape: (u32, u32)) -> Result<Prediction, PostprocessError> {
        let detections: Vec<Detection> = self
            .detect(raw, img_shape)?
            .into_iter()
            .map(|labeled| labeled.detection)
            .collect();

        let prediction = reduce_top1(&detections, &self.labels)?;

        tracing::debug!(
            detections = detections.len(),
            top1 = ?prediction.top1_class_name(),
            "Post-processing finished"
        );

        Ok(prediction)
    }
}
