use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::FetchError;

/// Instantaneous state of the tracked object as reported by the position source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "altitude")]
    pub altitude_km: f64,
    /// Passed through in the source's own units.
    pub velocity: f64,
}

#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn fetch_current(&self) -> Result<PositionSample, FetchError>;
}

/// Single GET against a JSON endpoint exposing `latitude`, `longitude`,
/// `altitude` and `velocity`.
pub struct HttpPositionSource {
    client: reqwest::Client,
    url: String,
}

impl HttpPositionSource {
    pub fn new(url: String, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl PositionSource for HttpPositionSource {
    async fn fetch_current(&self) -> Result<PositionSample, FetchError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let body = response.text().await?;
        parse_position(&body)
    }
}

pub fn parse_position(body: &str) -> Result<PositionSample, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::MalformedResponse(e.to_string()))
}
