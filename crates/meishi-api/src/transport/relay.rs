//! Script-relay read transport.
//!
//! The request carries a freshly minted callback name; the reply comes
//! back as that name applied to a JSON payload, the way a script tag
//! would execute it. The payload is routed through the waiter registry
//! by the name the reply actually invoked, so a mismatched or stale
//! reply can never resolve the wrong call. A call whose name is never
//! invoked times out and releases its slot.

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::transport::registry::{correlation_id, RelayRegistry};
use crate::transport::request::build_url;
use crate::transport::{ApiRequest, Transport, TransportReply};
use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

static PADDING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*(?:/\*\*/\s*)?([A-Za-z_$][0-9A-Za-z_$.]*)\s*\((.*)\)\s*;?\s*$").unwrap()
});

/// Splits a callback-padded reply into the invoked name and the JSON
/// payload it wraps.
pub(crate) fn parse_padding(reply: &str) -> Result<(String, Value)> {
    let caps = PADDING_REGEX
        .captures(reply)
        .ok_or_else(|| ApiError::Transport("relay reply is not callback padding".to_string()))?;
    let name = caps[1].to_string();
    let payload: Value = serde_json::from_str(caps[2].trim())
        .map_err(|e| ApiError::Transport(format!("relay payload is not JSON: {}", e)))?;
    Ok((name, payload))
}

/// Read transport for deployments whose plain replies are unreadable.
pub struct ScriptRelayTransport {
    http: reqwest::Client,
    config: Arc<ApiConfig>,
    registry: RelayRegistry,
}

impl ScriptRelayTransport {
    pub fn new(http: reqwest::Client, config: Arc<ApiConfig>) -> Self {
        Self {
            http,
            config,
            registry: RelayRegistry::new(),
        }
    }

    /// The waiter registry, exposed for leak checks.
    #[must_use]
    pub fn registry(&self) -> &RelayRegistry {
        &self.registry
    }
}

#[async_trait]
impl Transport for ScriptRelayTransport {
    fn name(&self) -> &'static str {
        "script-relay"
    }

    async fn attempt(&self, request: &ApiRequest) -> Result<TransportReply> {
        let callback = correlation_id("cb");
        let (_slot, rx) = self.registry.register(&callback);

        let mut url = build_url(&self.config, request);
        url.query_pairs_mut().append_pair("callback", &callback);
        debug!("script relay {} as {}", request.path, callback);

        let http = self.http.clone();
        let registry = self.registry.clone();
        let path = request.path.clone();
        let exchange = async move {
            let reply = http
                .get(url)
                .send()
                .await
                .map_err(|e| ApiError::Transport(format!("script relay {}: {}", path, e)))?;
            let status = reply.status();
            if !status.is_success() {
                return Err(ApiError::Transport(format!(
                    "script relay {}: status {}",
                    path, status
                )));
            }
            let text = reply
                .text()
                .await
                .map_err(|e| ApiError::Transport(format!("script relay {}: {}", path, e)))?;
            let (invoked, payload) = parse_padding(&text)?;
            if !registry.deliver(&invoked, payload) {
                warn!("relay reply invoked unknown callback {}", invoked);
            }
            // Resolve through our own slot: only a reply that named this
            // call's id completes it.
            rx.await
                .map_err(|_| ApiError::Transport("relay waiter dropped".to_string()))
        };

        match tokio::time::timeout(request.timeout, exchange).await {
            Ok(Ok(payload)) => Ok(TransportReply::Body(Bytes::from(serde_json::to_vec(
                &payload,
            )?))),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ApiError::Timeout(format!(
                "script relay {}: no reply within {:?}",
                request.path, request.timeout
            ))),
        }
    }
}
