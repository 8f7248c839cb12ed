use api::{ImageFetcher, build_router, get_configuration, logging::setup_logging, state::AppState};
use common::TelemetryGuard;
use inference::{InferenceBackend, Predictor, backend::ort::OrtBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_configuration()?;

    let telemetry = match &config.otel_endpoint {
        Some(endpoint) => Some(TelemetryGuard::init("clothes-api", endpoint)?),
        None => None,
    };
    setup_logging(&config, telemetry.as_ref().map(TelemetryGuard::tracer));

    let inference_config = config.inference_config()?;
    tracing::info!(
        environment = config.environment.as_str(),
        model = %inference_config.model_path,
        task = ?inference_config.task,
        provider = ?inference_config.execution_provider,
        labels = inference_config.labels.len(),
        "Loading model"
    );

    let backend = OrtBackend::load_model(&inference_config)?;
    let predictor = Predictor::new(backend, &inference_config);
    let fetcher = ImageFetcher::new(&config.fetch)?;

    let app = build_router(AppState::new(predictor, fetcher));

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
