//! Configuration for the card service client.

use crate::error::{ApiError, Result};
use std::time::Duration;
use url::Url;

/// Environment variable holding the web app endpoint URL.
pub const ENV_API_BASE: &str = "MEISHI_API_BASE";
/// Environment variable holding the shared API token.
pub const ENV_API_TOKEN: &str = "MEISHI_API_TOKEN";

/// Which relay mechanism the read chain substitutes when the direct
/// request cannot produce a readable reply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadFallback {
    /// Script-tag style: the reply arrives as a payload wrapped in
    /// callback padding and is routed by the invoked name.
    #[default]
    ScriptRelay,
    /// Cross-document style: the reply document embeds a correlated
    /// envelope that is routed by callback id.
    MessageBridge,
}

/// Configuration for the card service client.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Web app endpoint every operation is addressed to.
    pub base_url: Url,
    /// Shared static token sent with every request.
    pub api_token: String,
    /// Window for ordinary write dispatches (`update`).
    pub post_timeout: Duration,
    /// Window for the `add` dispatch, which covers the upload itself.
    pub add_dispatch_timeout: Duration,
    /// Window for read primitives (`search`, `get`).
    pub read_timeout: Duration,
    /// Delay between reconciliation polls after an `add` dispatch.
    pub poll_interval: Duration,
    /// Total time the reconciler waits for a new card to become readable.
    pub poll_deadline: Duration,
    /// Relay mechanism used when the direct read leg fails.
    pub read_fallback: ReadFallback,
}

impl ApiConfig {
    /// Creates a configuration for the given endpoint and token.
    /// The endpoint must be an absolute URL; the token must be non-empty.
    pub fn new(base_url: impl AsRef<str>, api_token: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())
            .map_err(|e| ApiError::Config(format!("invalid base URL: {}", e)))?;
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(ApiError::Config("api_token must not be empty".to_string()));
        }
        Ok(Self {
            base_url,
            api_token,
            post_timeout: Duration::from_secs(20),
            add_dispatch_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_secs(2),
            poll_deadline: Duration::from_secs(180),
            read_fallback: ReadFallback::default(),
        })
    }

    /// Reads `MEISHI_API_BASE` and `MEISHI_API_TOKEN` from the
    /// environment. A missing value is a configuration error, not
    /// something a caller can retry around.
    pub fn from_env() -> Result<Self> {
        let base = std::env::var(ENV_API_BASE)
            .map_err(|_| ApiError::Config(format!("missing {} in environment", ENV_API_BASE)))?;
        let token = std::env::var(ENV_API_TOKEN)
            .map_err(|_| ApiError::Config(format!("missing {} in environment", ENV_API_TOKEN)))?;
        Self::new(base, token)
    }

    #[must_use]
    pub fn with_post_timeout(mut self, duration: Duration) -> Self {
        self.post_timeout = duration;
        self
    }

    #[must_use]
    pub fn with_add_dispatch_timeout(mut self, duration: Duration) -> Self {
        self.add_dispatch_timeout = duration;
        self
    }

    #[must_use]
    pub fn with_read_timeout(mut self, duration: Duration) -> Self {
        self.read_timeout = duration;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, duration: Duration) -> Self {
        self.poll_interval = duration;
        self
    }

    #[must_use]
    pub fn with_poll_deadline(mut self, duration: Duration) -> Self {
        self.poll_deadline = duration;
        self
    }

    #[must_use]
    pub fn with_read_fallback(mut self, fallback: ReadFallback) -> Self {
        self.read_fallback = fallback;
        self
    }
}
