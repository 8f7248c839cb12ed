pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod routes;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use state::AppState;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::{Config, get_configuration};
pub use error::{ApiError, ErrorResponse};
pub use fetch::{FetchError, ImageFetcher};
pub use routes::{PredictRequest, PredictResponse};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/models/clothes/predict", post(routes::predict_clothes))
        .route("/health-check", get(routes::health_check))
        .route("/health-check/", get(routes::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
