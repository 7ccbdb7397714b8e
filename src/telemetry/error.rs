use thiserror::Error;

use crate::orbit::OrbitError;

/// Failure to obtain data from an upstream source. Every variant means "no
/// data this cycle"; none is fatal and none is retried before the next tick.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(#[from] reqwest::Error),
    #[error("source returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("malformed elements: {0}")]
    MalformedElements(#[from] OrbitError),
}

/// Why a broadcast cycle ended without publishing.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("position fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}
