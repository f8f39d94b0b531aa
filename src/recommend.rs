//! Recommendation Service client.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::AdvisorConfig;
use crate::dialogue::model::{PredictRequest, PredictResponse};
use crate::error::{ConfigError, RecommendError};

/// Something that turns a completed survey into a course label.
#[async_trait]
pub trait RecommendationService: Send + Sync {
    /// Return the recommended course for the given answers.
    async fn recommend(&self, request: &PredictRequest) -> Result<String, RecommendError>;
}

/// Recommendation Service reached over HTTP.
///
/// `POST`s the answers as JSON and expects `{"predicted_course": "..."}`.
pub struct HttpRecommendationService {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl HttpRecommendationService {
    pub fn new(client: reqwest::Client, endpoint: reqwest::Url) -> Self {
        Self { client, endpoint }
    }

    /// Build from config, with the configured request timeout applied to
    /// the underlying client.
    pub fn from_config(config: &AdvisorConfig) -> Result<Self, ConfigError> {
        let client = http_client(config.request_timeout)?;
        Ok(Self::new(client, config.endpoint(&config.predict_path)?))
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

#[async_trait]
impl RecommendationService for HttpRecommendationService {
    async fn recommend(&self, request: &PredictRequest) -> Result<String, RecommendError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| RecommendError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RecommendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| RecommendError::RequestFailed(e.to_string()))?;
        let parsed: PredictResponse = serde_json::from_str(&body)
            .map_err(|e| RecommendError::InvalidResponse(e.to_string()))?;

        tracing::debug!(course = %parsed.predicted_course, "Recommendation received");
        Ok(parsed.predicted_course)
    }
}

/// Shared HTTP client construction for the backend services.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}
