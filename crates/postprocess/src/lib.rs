pub mod classification;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod nms;
pub mod processor;
pub mod tensor;
pub mod top1;

// Re-export commonly used types for convenience
pub use classification::classify_top1;
pub use error::PostprocessError;
pub use extract::{Candidate, Detection, extract};
pub use geometry::{BoundingBox, ScaleFactors};
pub use nms::{suppress, suppress_indices};
pub use processor::{LabeledDetection, PostProcessor};
pub use tensor::RawOutput;
pub use top1::{LabelTable, Prediction, reduce_top1};
