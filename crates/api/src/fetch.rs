use crate::config::FetchConfig;
use axum::body::Bytes;
use common::retry_with_backoff;
use reqwest::{Client, StatusCode};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to fetch {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("fetching {url} returned status {status}")]
    Status { url: String, status: StatusCode },
    #[error("image at {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: usize },
}

impl FetchError {
    /// Timeouts, connection failures and 5xx/429 answers are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Request { source, .. } => source.is_timeout() || source.is_connect(),
            FetchError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            FetchError::TooLarge { .. } => false,
        }
    }
}

/// Downloads images over HTTP(S) with a timeout, a size cap and retries.
pub struct ImageFetcher {
    client: Client,
    max_retries: u32,
    retry_base_delay_ms: u64,
    max_bytes: usize,
}

impl ImageFetcher {
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            retry_base_delay_ms: config.retry_base_delay_ms,
            max_bytes: config.max_bytes,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let bytes = retry_with_backoff(
            || self.fetch_once(url),
            FetchError::is_transient,
            self.max_retries,
            self.retry_base_delay_ms,
            "image fetch",
        )
        .await?;

        tracing::debug!(bytes = bytes.len(), "Image fetched");
        Ok(bytes)
    }

    async fn fetch_once(&self, url: &str) -> Result<Bytes, FetchError> {
        let request_error = |source: reqwest::Error| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let mut response = self.client.get(url).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let too_large = || FetchError::TooLarge {
            url: url.to_string(),
            limit: self.max_bytes,
        };

        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(request_error)? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(Bytes::from(body))
    }
}
