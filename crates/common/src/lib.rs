pub mod config;
pub mod logging;
#[cfg(feature = "async")]
pub mod retry;
pub mod telemetry;

pub use config::Environment;
pub use logging::setup_logging;
#[cfg(feature = "async")]
pub use retry::retry_with_backoff;
pub use opentelemetry_sdk::trace::SdkTracer;
pub use telemetry::TelemetryGuard;
