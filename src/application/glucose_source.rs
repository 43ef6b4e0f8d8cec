// Source trait for glucose data access
use crate::domain::reading::GlucoseFetch;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The account has no active sensor connection
    #[error("glucose data not found")]
    NotFound,

    #[error("vendor request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("vendor responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("vendor response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound)
    }
}

#[async_trait]
pub trait GlucoseSource: Send + Sync {
    /// Fetch the current reading and the trailing series
    async fn fetch_glucose(&self) -> Result<GlucoseFetch, FetchError>;
}
