use crate::fetch::FetchError;
use axum::{
    Json,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use inference::PredictError;
use serde::Serialize;
use std::collections::BTreeMap;

const REDACTED_HEADERS: [&str; 3] = ["authorization", "cookie", "proxy-authorization"];

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Predict(#[from] PredictError),
    #[error("prediction task failed: {0}")]
    Join(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Fetch(_) => StatusCode::BAD_GATEWAY,
            ApiError::Predict(PredictError::Decode(_)) => StatusCode::BAD_REQUEST,
            ApiError::Predict(_) | ApiError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "ValidationError",
            ApiError::Fetch(_) => "FetchError",
            ApiError::Predict(PredictError::Decode(_)) => "DecodeError",
            ApiError::Predict(PredictError::Postprocess(_)) => "PostprocessError",
            ApiError::Predict(_) => "InferenceError",
            ApiError::Join(_) => "InternalError",
        }
    }
}

/// What the error body echoes back about the failed request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestContext {
    pub request_info: RequestInfo,
    pub request_headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestInfo {
    pub url: String,
    pub method: String,
}

impl RequestContext {
    pub fn new(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        let request_headers = headers
            .iter()
            .map(|(name, value)| {
                let value = if REDACTED_HEADERS.contains(&name.as_str()) {
                    "[redacted]".to_string()
                } else {
                    String::from_utf8_lossy(value.as_bytes()).into_owned()
                };
                (name.as_str().to_string(), value)
            })
            .collect();

        Self {
            request_info: RequestInfo {
                url: uri.to_string(),
                method: method.to_string(),
            },
            request_headers,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    metadata: RequestContext,
}

/// An [`ApiError`] paired with the request it happened on.
pub struct ErrorResponse {
    pub error: ApiError,
    pub context: RequestContext,
}

impl ErrorResponse {
    pub fn new(error: impl Into<ApiError>, context: RequestContext) -> Self {
        Self {
            error: error.into(),
            context,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.error, kind = self.error.kind(), "Request failed");
        } else {
            tracing::info!(error = %self.error, kind = self.error.kind(), "Request rejected");
        }

        let body = ErrorBody {
            error: self.error.kind(),
            message: self.error.to_string(),
            metadata: self.context,
        };

        (status, Json(body)).into_response()
    }
}
