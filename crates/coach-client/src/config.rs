//! Client configuration from environment variables.

use std::env;

use crate::error::ClientError;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the coaching backend, without a trailing slash.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Interval between sync-status polls in seconds.
    pub sync_poll_secs: u64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 30,
            sync_poll_secs: 30,
        }
    }

    pub fn from_env() -> Result<Self, ClientError> {
        let base_url =
            env::var("COACH_API_URL").map_err(|_| ClientError::Config("COACH_API_URL not set"))?;

        let timeout_secs = env::var("COACH_API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let sync_poll_secs = env::var("COACH_SYNC_POLL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            base_url,
            timeout_secs,
            sync_poll_secs,
        })
    }
}
