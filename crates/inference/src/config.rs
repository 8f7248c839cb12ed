use crate::backend::ExecutionProvider;
use std::str::FromStr;

/// Which post-processing head the model output goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTask {
    /// `[1, 4 + num_classes, num_candidates]` boxes + class scores.
    Detection,
    /// `[1, num_classes]` class scores.
    Classification,
}

impl FromStr for ModelTask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "detection" => Ok(Self::Detection),
            "classification" => Ok(Self::Classification),
            other => Err(format!(
                "{} is not a supported model task. Use either `detection` or `classification`.",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub model_path: String,
    pub task: ModelTask,
    pub execution_provider: ExecutionProvider,
    /// Model input `(width, height)`.
    pub input_size: (u32, u32),
    pub input_name: String,
    pub output_name: String,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub labels: Vec<String>,
}

impl InferenceConfig {
    /// Create default configuration for testing
    #[cfg(test)]
    pub fn test_default() -> Self {
        Self {
            model_path: "/models/clothes.onnx".to_string(),
            task: ModelTask::Detection,
            execution_provider: ExecutionProvider::Cpu,
            input_size: (640, 640),
            input_name: "images".to_string(),
            output_name: "output0".to_string(),
            confidence_threshold: 0.25,
            iou_threshold: 0.5,
            labels: vec!["jacket".to_string(), "coat".to_string(), "dress".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_task_from_str() {
        assert_eq!("Detection".parse(), Ok(ModelTask::Detection));
        assert_eq!("classification".parse(), Ok(ModelTask::Classification));
        assert!("segmentation".parse::<ModelTask>().is_err());
    }
}
