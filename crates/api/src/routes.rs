use crate::{
    error::{ApiError, ErrorResponse, RequestContext},
    state::AppState,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, Method, Uri},
};
use inference::Prediction;
use reqwest::Url;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub url: String,
}

impl PredictRequest {
    /// Only absolute http(s) URLs are fetched.
    pub fn validate(&self) -> Result<Url, ApiError> {
        let url = Url::parse(&self.url)
            .map_err(|e| ApiError::Validation(format!("invalid url {:?}: {}", self.url, e)))?;

        match url.scheme() {
            "http" | "https" if url.has_host() => Ok(url),
            scheme => Err(ApiError::Validation(format!(
                "unsupported url scheme {:?}, expected http or https",
                scheme
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    pub top1_class_name: Option<String>,
    pub top1_score: Option<f32>,
}

impl From<Prediction> for PredictResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            top1_class_name: prediction.top1_class_name().map(str::to_string),
            top1_score: prediction.top1_score(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[tracing::instrument(skip_all)]
pub async fn predict_clothes(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ErrorResponse> {
    let context = RequestContext::new(&method, &uri, &headers);
    let fail = |error: ApiError| ErrorResponse::new(error, context.clone());

    let Json(request) = payload.map_err(|e| fail(ApiError::Validation(e.body_text())))?;
    let url = request.validate().map_err(fail)?;

    tracing::info!(%url, "Predicting clothes");

    let image = state
        .fetcher
        .fetch(url.as_str())
        .await
        .map_err(|e| fail(e.into()))?;

    let predictor = state.predictor.clone();
    let prediction = tokio::task::spawn_blocking(move || predictor.predict(&image))
        .await
        .map_err(|e| fail(ApiError::Join(e.to_string())))?
        .map_err(|e| fail(e.into()))?;

    Ok(Json(prediction.into()))
}
