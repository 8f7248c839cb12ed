pub mod backend;
pub mod config;
pub mod error;
pub mod processing;
pub mod service;

// Re-export commonly used types for convenience
pub use backend::{ExecutionProvider, InferenceBackend, InferenceOutput};
pub use config::{InferenceConfig, ModelTask};
pub use error::PredictError;
pub use postprocess::Prediction;
pub use service::{PredictionHead, Predictor};
