use crate::{
    backend::{InferenceBackend, InferenceOutput},
    config::{InferenceConfig, ModelTask},
    error::PredictError,
    processing::pre::PreProcessor,
};
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use postprocess::{LabelTable, PostProcessor, Prediction, RawOutput, classify_top1};
use std::sync::Mutex;
use std::time::Instant;

pub enum PredictionHead {
    Detection(PostProcessor),
    Classification(LabelTable),
}

impl PredictionHead {
    pub fn from_config(config: &InferenceConfig) -> Self {
        let labels = LabelTable::new(config.labels.iter().cloned());
        match config.task {
            ModelTask::Detection => Self::Detection(PostProcessor::new(
                config.confidence_threshold,
                config.iou_threshold,
                config.input_size,
                labels,
            )),
            ModelTask::Classification => Self::Classification(labels),
        }
    }

    fn apply(
        &self,
        output: &InferenceOutput,
        original_size: (u32, u32),
    ) -> Result<Prediction, PredictError> {
        let _s = tracing::info_span!("postprocess").entered();
        match self {
            Self::Detection(post) => {
                let raw = RawOutput::from_view(output.raw.view())?;
                Ok(post.process(&raw, original_size)?)
            }
            Self::Classification(labels) => Ok(classify_top1(output.raw.view(), labels)?),
        }
    }
}

struct PredictorMetrics {
    duration_histogram: Histogram<f64>,
    predictions_counter: Counter<u64>,
    failures_counter: Counter<u64>,
}

fn init_metrics(meter_name: &'static str) -> PredictorMetrics {
    let meter = global::meter(meter_name);
    let latency_buckets = [
        0.005, 0.01, 0.02, 0.03, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 1.0, 2.0,
    ];
    let duration_histogram: Histogram<f64> = meter
        .f64_histogram("prediction_duration_seconds")
        .with_description("Time to predict one image (preprocess + infer + postprocess)")
        .with_unit("s")
        .with_boundaries(latency_buckets.to_vec())
        .build();
    let predictions_counter: Counter<u64> = meter
        .u64_counter("predictions_total")
        .with_description("Total predictions, labeled by whether anything was detected")
        .build();
    let failures_counter: Counter<u64> = meter
        .u64_counter("prediction_failures_total")
        .with_description("Total failed predictions")
        .build();

    PredictorMetrics {
        duration_histogram,
        predictions_counter,
        failures_counter,
    }
}

/// Image bytes in, top-1 prediction out.
///
/// The backend sits behind a mutex because model sessions need `&mut`;
/// everything else is read-only and shared by concurrent callers. `predict`
/// blocks, async callers should run it on a blocking thread.
pub struct Predictor {
    backend: Mutex<Box<dyn InferenceBackend + Send>>,
    preprocessor: PreProcessor,
    head: PredictionHead,
    metrics: PredictorMetrics,
}

impl Predictor {
    pub fn new<B>(backend: B, config: &InferenceConfig) -> Self
    where
        B: InferenceBackend + Send + 'static,
    {
        Self {
            backend: Mutex::new(Box::new(backend)),
            preprocessor: PreProcessor::new(config.input_size),
            head: PredictionHead::from_config(config),
            metrics: init_metrics("inference"),
        }
    }

    pub fn predict(&self, image_bytes: &[u8]) -> Result<Prediction, PredictError> {
        let start = Instant::now();
        let result = self.run(image_bytes);
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(prediction) => {
                self.metrics.duration_histogram.record(elapsed, &[]);
                self.metrics.predictions_counter.add(
                    1,
                    &[KeyValue::new("detected", !prediction.is_empty())],
                );
                tracing::debug!(
                    elapsed_ms = elapsed * 1000.0,
                    top1 = ?prediction.top1_class_name(),
                    score = ?prediction.top1_score(),
                    "Prediction finished"
                );
            }
            Err(e) => {
                self.metrics.failures_counter.add(1, &[]);
                tracing::warn!(error = %e, "Prediction failed");
            }
        }

        result
    }

    fn run(&self, image_bytes: &[u8]) -> Result<Prediction, PredictError> {
        let preprocessed = self.preprocessor.preprocess(image_bytes)?;

        let output = {
            let _infer_span = tracing::info_span!("model_inference").entered();
            let mut backend = self
                .backend
                .lock()
                .map_err(|_| PredictError::BackendPoisoned)?;
            backend
                .infer(&preprocessed.tensor)
                .map_err(PredictError::Inference)?
        };

        self.head.apply(&output, preprocessed.original_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use ndarray::{Array, ArrayD, IxDyn};
    use postprocess::PostprocessError;
    use std::io::Cursor;

    /// Backend returning a canned output and checking the input shape
    struct MockBackend {
        output: ArrayD<f32>,
        expected_input: Vec<usize>,
    }

    impl InferenceBackend for MockBackend {
        fn load_model(config: &InferenceConfig) -> anyhow::Result<Self> {
            Ok(Self {
                output: ArrayD::zeros(IxDyn(&[1, 4 + config.labels.len(), 0])),
                expected_input: vec![1, 3, config.input_size.1 as usize, config.input_size.0 as usize],
            })
        }

        fn infer(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput> {
            anyhow::ensure!(
                images.shape() == self.expected_input.as_slice(),
                "unexpected input shape {:?}",
                images.shape()
            );
            Ok(InferenceOutput {
                raw: self.output.clone(),
            })
        }
    }

    struct FailingBackend;

    impl InferenceBackend for FailingBackend {
        fn load_model(_config: &InferenceConfig) -> anyhow::Result<Self> {
            Ok(Self)
        }

        fn infer(&mut self, _images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput> {
            anyhow::bail!("device lost")
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 20, 30])))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    /// `[1, 4 + 3, n]` detection output from `(cxcywh, class_id, score)` rows
    fn detection_output(rows: &[([f32; 4], usize, f32)]) -> ArrayD<f32> {
        let n = rows.len();
        let mut data = vec![0.0f32; 7 * n];
        for (i, (bbox, class_id, score)) in rows.iter().enumerate() {
            for (a, value) in bbox.iter().enumerate() {
                data[a * n + i] = *value;
            }
            data[(4 + class_id) * n + i] = *score;
        }
        Array::from_shape_vec(IxDyn(&[1, 7, n]), data).unwrap()
    }

    #[test]
    fn test_detection_prediction() {
        let config = InferenceConfig::test_default();
        let mut backend = MockBackend::load_model(&config).unwrap();
        backend.output = detection_output(&[
            ([100.0, 100.0, 50.0, 50.0], 1, 0.6),
            ([102.0, 101.0, 50.0, 50.0], 2, 0.5),
            ([400.0, 400.0, 50.0, 50.0], 0, 0.3),
        ]);

        let predictor = Predictor::new(backend, &config);
        let prediction = predictor.predict(&png_bytes(1280, 960)).unwrap();

        assert_eq!(prediction.top1_class_name(), Some("coat"));
        assert_eq!(prediction.top1_score(), Some(0.6));
    }

    #[test]
    fn test_nothing_detected() {
        let config = InferenceConfig::test_default();
        let backend = MockBackend::load_model(&config).unwrap();

        let predictor = Predictor::new(backend, &config);
        let prediction = predictor.predict(&png_bytes(64, 64)).unwrap();

        assert!(prediction.is_empty());
    }

    #[test]
    fn test_classification_head() {
        let mut config = InferenceConfig::test_default();
        config.task = ModelTask::Classification;
        let mut backend = MockBackend::load_model(&config).unwrap();
        backend.output = Array::from_shape_vec(IxDyn(&[1, 3]), vec![0.1, 0.2, 0.7]).unwrap();

        let predictor = Predictor::new(backend, &config);
        let prediction = predictor.predict(&png_bytes(64, 64)).unwrap();

        assert_eq!(prediction.top1_class_name(), Some("dress"));
    }

    #[test]
    fn test_error_kinds() {
        let config = InferenceConfig::test_default();

        let predictor = Predictor::new(FailingBackend, &config);
        assert!(matches!(
            predictor.predict(&png_bytes(64, 64)),
            Err(PredictError::Inference(_))
        ));
        assert!(matches!(
            predictor.predict(b"not an image"),
            Err(PredictError::Decode(_))
        ));

        let mut backend = MockBackend::load_model(&config).unwrap();
        backend.output = ArrayD::zeros(IxDyn(&[1, 3, 10]));
        let predictor = Predictor::new(backend, &config);
        assert!(matches!(
            predictor.predict(&png_bytes(64, 64)),
            Err(PredictError::Postprocess(PostprocessError::Shape(_)))
        ));
    }
}
