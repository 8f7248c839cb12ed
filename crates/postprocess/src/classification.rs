use crate::error::PostprocessError;
use crate::top1::{LabelTable, Prediction};
use ndarray::{ArrayViewD, Axis};

/// Top-1 of a classification head shaped `[1, num_classes]` or `[num_classes]`.
pub fn classify_top1(output: ArrayViewD<'_, f32>, labels: &LabelTable) -> Result<Prediction, PostprocessError> {
    let probabilities = match output.ndim() {
        1 => output,
        2 if output.shape()[0] == 1 => output.index_axis_move(Axis(0), 0),
        _ => {
            return Err(PostprocessError::Shape(format!(
                "expected [1, num_classes] or [num_classes], got {:?}",
                output.shape()
            )));
        }
    };

    let (class_id, score) = probabilities
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.is_nan())
        .fold(None::<(usize, f32)>, |best, (i, &p)| match best {
            Some((_, b)) if p <= b => best,
            _ => Some((i, p)),
        })
        .ok_or_else(|| PostprocessError::Shape("classification output has no scores".to_string()))?;

    Ok(Prediction::new(labels.get(class_id)?, score))
}
