//! Client error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {detail}")]
    Status { status: u16, detail: String },
}

impl ClientError {
    /// True for failures worth retrying from the UI: transport errors and
    /// server-side (5xx) responses. 4xx responses indicate a bad request and
    /// repeat identically.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(_) => true,
            ClientError::Status { status, .. } => *status >= 500,
            ClientError::Config(_) => false,
        }
    }
}
