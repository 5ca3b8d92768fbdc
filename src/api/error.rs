//! Ledger API Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: connect, TLS, timeout
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("not signed in")]
    NotAuthenticated,
}

impl ApiError {
    /// 404 from the service
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}
