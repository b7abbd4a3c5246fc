//! Plain HTTP transport: request out, JSON reply back.

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::transport::request::{body_with_token, build_url};
use crate::transport::{ApiRequest, Method, Transport, TransportReply};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// The first-choice mechanism. Fails whenever the deployment answers
/// with anything but readable JSON, which is exactly when the chain
/// should try a relay instead.
pub struct DirectTransport {
    http: reqwest::Client,
    config: Arc<ApiConfig>,
}

impl DirectTransport {
    pub fn new(http: reqwest::Client, config: Arc<ApiConfig>) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl Transport for DirectTransport {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn attempt(&self, request: &ApiRequest) -> Result<TransportReply> {
        let url = build_url(&self.config, request);
        debug!("direct {} {}", request.path, url);

        let exchange = async {
            let builder = match request.method {
                Method::Get => self.http.get(url.clone()),
                Method::Post => self
                    .http
                    .post(url.clone())
                    .json(&body_with_token(&self.config, request)),
            };
            let reply = builder
                .send()
                .await
                .map_err(|e| ApiError::Transport(format!("direct {}: {}", request.path, e)))?;
            let status = reply.status();
            if !status.is_success() {
                return Err(ApiError::Transport(format!(
                    "direct {}: status {}",
                    request.path, status
                )));
            }
            let body = reply
                .bytes()
                .await
                .map_err(|e| ApiError::Transport(format!("direct {}: {}", request.path, e)))?;
            // A deployment that is not answering us serves an HTML page
            // here. Treat any non-JSON reply as a carrier failure so the
            // relay leg gets its turn.
            if serde_json::from_slice::<serde_json::Value>(&body).is_err() {
                return Err(ApiError::Transport(format!(
                    "direct {}: reply is not JSON",
                    request.path
                )));
            }
            Ok(TransportReply::Body(body))
        };

        match tokio::time::timeout(request.timeout, exchange).await {
            Ok(outcome) => outcome,
            // Dropping the exchange future aborts the in-flight request.
            Err(_) => Err(ApiError::Timeout(format!(
                "direct {}: no reply within {:?}",
                request.path, request.timeout
            ))),
        }
    }
}
