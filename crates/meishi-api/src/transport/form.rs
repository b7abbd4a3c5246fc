//! Form-encoded write dispatch.

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::transport::request::{body_with_token, build_url};
use crate::transport::{ApiRequest, Transport, TransportReply};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Second write mechanism: the JSON body travels as a single `payload`
/// form field, the shape a plain form submission produces. Some
/// deployments that drop JSON POSTs still accept these. The reply is
/// drained and discarded; like the opaque post, arrival is the only
/// signal.
pub struct FormPostTransport {
    http: reqwest::Client,
    config: Arc<ApiConfig>,
}

impl FormPostTransport {
    pub fn new(http: reqwest::Client, config: Arc<ApiConfig>) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl Transport for FormPostTransport {
    fn name(&self) -> &'static str {
        "form-post"
    }

    async fn attempt(&self, request: &ApiRequest) -> Result<TransportReply> {
        let url = build_url(&self.config, request);
        let payload = serde_json::to_string(&body_with_token(&self.config, request))?;
        debug!("form post {}", request.path);

        let dispatch = async {
            let reply = self
                .http
                .post(url.clone())
                .form(&[("path", request.path.as_str()), ("payload", payload.as_str())])
                .send()
                .await
                .map_err(|e| ApiError::Transport(format!("form post {}: {}", request.path, e)))?;
            let _ = reply.bytes().await;
            Ok(TransportReply::Opaque)
        };

        match tokio::time::timeout(request.timeout, dispatch).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ApiError::Timeout(format!(
                "form post {}: no dispatch within {:?}",
                request.path, request.timeout
            ))),
        }
    }
}
