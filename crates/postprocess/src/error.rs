use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PostprocessError {
    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Class id {class_id} is outside the label table ({num_labels} labels)")]
    Lookup { class_id: usize, num_labels: usize },

    #[error("Invalid scale factors: x={x_factor}, y={y_factor}")]
    InvalidScale { x_factor: f64, y_factor: f64 },
}
