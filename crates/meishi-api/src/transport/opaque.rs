//! Fire-and-forget JSON POST.

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::transport::request::{body_with_token, build_url};
use crate::transport::{ApiRequest, Transport, TransportReply};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Write dispatch whose reply is never read. The backend accepts the
/// POST but the client cannot see the response, so arrival of any reply
/// at all counts as dispatched and the status is deliberately ignored.
/// Only a connection-level failure or the timeout rejects.
pub struct OpaquePostTransport {
    http: reqwest::Client,
    config: Arc<ApiConfig>,
}

impl OpaquePostTransport {
    pub fn new(http: reqwest::Client, config: Arc<ApiConfig>) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl Transport for OpaquePostTransport {
    fn name(&self) -> &'static str {
        "opaque-post"
    }

    async fn attempt(&self, request: &ApiRequest) -> Result<TransportReply> {
        let url = build_url(&self.config, request);
        debug!("opaque post {}", request.path);

        let dispatch = async {
            let reply = self
                .http
                .post(url.clone())
                .json(&body_with_token(&self.config, request))
                .send()
                .await
                .map_err(|e| {
                    ApiError::Transport(format!("opaque post {}: {}", request.path, e))
                })?;
            // Reply headers arrived, so the write reached the backend.
            // The body and status stay unread.
            drop(reply);
            Ok(TransportReply::Opaque)
        };

        match tokio::time::timeout(request.timeout, dispatch).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ApiError::Timeout(format!(
                "opaque post {}: no dispatch within {:?}",
                request.path, request.timeout
            ))),
        }
    }
}
