use common::Environment;
use inference::{ExecutionProvider, InferenceConfig, ModelTask};
use serde::Deserialize;
use std::env;

/// Class names of the clothes detection model, in class id order.
pub const CLOTHES_LABELS: [&str; 13] = [
    "jacket",
    "short pants",
    "tailored pants",
    "jumper",
    "shirts",
    "coat",
    "dress",
    "casual pants",
    "blouse",
    "tshirts",
    "skirt",
    "tearing",
    "pollution",
];

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub path: String,
    pub task: String,
    pub execution_provider: String,
    pub input_width: u32,
    pub input_height: u32,
    pub input_name: String,
    pub output_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostprocessConfig {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub log_level: LogLevel,
    pub environment: Environment,
    pub otel_endpoint: Option<String>,
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub postprocess: PostprocessConfig,
    pub fetch: FetchConfig,
}

impl Config {
    /// Validated settings for the prediction pipeline.
    pub fn inference_config(&self) -> anyhow::Result<InferenceConfig> {
        let task: ModelTask = self.model.task.parse().map_err(anyhow::Error::msg)?;
        let execution_provider: ExecutionProvider = self
            .model
            .execution_provider
            .parse()
            .map_err(anyhow::Error::msg)?;

        let in_unit_range = |v: f32| (0.0..=1.0).contains(&v);
        anyhow::ensure!(
            in_unit_range(self.postprocess.confidence_threshold),
            "confidence_threshold must be within [0, 1], got {}",
            self.postprocess.confidence_threshold
        );
        anyhow::ensure!(
            in_unit_range(self.postprocess.iou_threshold),
            "iou_threshold must be within [0, 1], got {}",
            self.postprocess.iou_threshold
        );
        anyhow::ensure!(
            self.model.input_width > 0 && self.model.input_height > 0,
            "model input size must be non-zero, got {}x{}",
            self.model.input_width,
            self.model.input_height
        );
        anyhow::ensure!(!self.postprocess.labels.is_empty(), "label table is empty");

        Ok(InferenceConfig {
            model_path: self.model.path.clone(),
            task,
            execution_provider,
            input_size: (self.model.input_width, self.model.input_height),
            input_name: self.model.input_name.clone(),
            output_name: self.model.output_name.clone(),
            confidence_threshold: self.postprocess.confidence_threshold,
            iou_threshold: self.postprocess.iou_threshold,
            labels: self.postprocess.labels.clone(),
        })
    }
}

/// Defaults, then the file named by `CLOTHES_CONFIG_FILE` if set, then
/// `CLOTHES_*` environment variables (`__` separates nested keys).
pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder()
        .set_default("log_level", "info")?
        .set_default("environment", "development")?
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("model.path", "models/clothes.onnx")?
        .set_default("model.task", "detection")?
        .set_default("model.execution_provider", "cpu")?
        .set_default("model.input_width", 640)?
        .set_default("model.input_height", 640)?
        .set_default("model.input_name", "images")?
        .set_default("model.output_name", "output0")?
        .set_default("postprocess.confidence_threshold", 0.25)?
        .set_default("postprocess.iou_threshold", 0.5)?
        .set_default("postprocess.labels", CLOTHES_LABELS.to_vec())?
        .set_default("fetch.timeout_ms", 10_000)?
        .set_default("fetch.max_retries", 3)?
        .set_default("fetch.retry_base_delay_ms", 200)?
        .set_default("fetch.max_bytes", 20 * 1024 * 1024)?;

    if let Ok(path) = env::var("CLOTHES_CONFIG_FILE") {
        builder = builder.add_source(config::File::with_name(&path));
    }

    let config = builder
        .add_source(
            config::Environment::with_prefix("CLOTHES")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("postprocess.labels"),
        )
        .build()?;

    config.try_deserialize::<Config>()
}
