use crate::config::Config;
use common::SdkTracer;

pub fn setup_logging(config: &Config, tracer: Option<SdkTracer>) {
    common::setup_logging(config.log_level.as_str(), config.environment, tracer);
}
