use postprocess::PostprocessError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Preprocessing failed: {0}")]
    Preprocess(String),

    #[error("Inference failed: {0:#}")]
    Inference(anyhow::Error),

    #[error(transparent)]
    Postprocess(#[from] PostprocessError),

    #[error("Inference backend lock poisoned")]
    BackendPoisoned,
}
