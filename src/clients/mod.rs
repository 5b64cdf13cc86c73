/// External API clients module
use crate::domain::{ModelRequest, PredictionRequest, PredictionResponse};
use crate::errors::{ApiResult, ProviderError};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// HTTP client wrapper with common configuration
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("rail-control/1.0")
            .build()?;
        Ok(Self { client })
    }

    pub fn get_client(&self) -> &Client {
        &self.client
    }
}

/// Recommendation model client (single attempt, no retry)
#[derive(Clone, Debug)]
pub struct ModelClient {
    http_client: HttpClient,
    endpoint: Option<String>,
    api_key: Option<String>,
}

impl ModelClient {
    pub fn new(
        endpoint: Option<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> ApiResult<Self> {
        Ok(Self {
            http_client: HttpClient::new(timeout)?,
            endpoint,
            api_key,
        })
    }

    /// POST the request and return the raw response body
    pub async fn recommend(&self, body: &ModelRequest<'_>) -> Result<Value, ProviderError> {
        let endpoint = self.endpoint.as_deref().ok_or(ProviderError::NotConfigured)?;

        let mut req = self.http_client.get_client().post(endpoint).json(body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(ProviderError::Status(resp.status()));
        }

        let json = resp.json().await?;
        Ok(json)
    }
}

/// Backend priority predictor client
#[derive(Clone, Debug)]
pub struct PredictorClient {
    http_client: HttpClient,
    url: String,
}

impl PredictorClient {
    pub fn new(url: String, timeout: Duration) -> ApiResult<Self> {
        Ok(Self {
            http_client: HttpClient::new(timeout)?,
            url,
        })
    }

    pub async fn predict(&self, body: &PredictionRequest) -> ApiResult<PredictionResponse> {
        let resp = self
            .http_client
            .get_client()
            .post(&self.url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        let json = resp.json().await?;
        Ok(json)
    }
}
