//! Message-bridge read transport.
//!
//! The request names a callback id and asks the backend for a bridge
//! document instead of a plain reply. The document embeds a correlated
//! [`BridgeEnvelope`]; fetching and extraction happen on a detached
//! task, envelopes flow over a channel to a pump task, and the pump
//! routes each one to the waiter registered under its `callback_id`.
//! The caller only ever waits on its own slot, so a late or misrouted
//! envelope cannot resolve the wrong call.

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::transport::registry::{correlation_id, RelayRegistry};
use crate::transport::request::build_url;
use crate::transport::{ApiRequest, Transport, TransportReply};
use crate::types::BridgeEnvelope;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Pulls the first correlated envelope out of a bridge document. The
/// document is either the envelope itself or a page with the envelope
/// embedded as a JSON literal.
pub(crate) fn extract_envelope(document: &str) -> Result<BridgeEnvelope> {
    if let Ok(envelope) = serde_json::from_str::<BridgeEnvelope>(document) {
        return Ok(envelope);
    }
    let mut offset = 0;
    while let Some(pos) = document[offset..].find('{') {
        let candidate = &document[offset + pos..];
        let mut values = serde_json::Deserializer::from_str(candidate).into_iter::<BridgeEnvelope>();
        if let Some(Ok(envelope)) = values.next() {
            if !envelope.callback_id.is_empty() {
                return Ok(envelope);
            }
        }
        offset += pos + 1;
    }
    Err(ApiError::Transport(
        "bridge reply carried no envelope".to_string(),
    ))
}

/// Read transport that correlates replies by envelope rather than by
/// connection. Must be constructed inside a Tokio runtime: it spawns
/// the pump task that drains the envelope bus.
pub struct MessageBridgeTransport {
    http: reqwest::Client,
    config: Arc<ApiConfig>,
    registry: RelayRegistry,
    bus: async_channel::Sender<BridgeEnvelope>,
}

impl MessageBridgeTransport {
    pub fn new(http: reqwest::Client, config: Arc<ApiConfig>) -> Self {
        let registry = RelayRegistry::new();
        let (bus, bus_rx) = async_channel::unbounded::<BridgeEnvelope>();

        let pump_registry = registry.clone();
        tokio::spawn(async move {
            while let Ok(envelope) = bus_rx.recv().await {
                if !pump_registry.deliver(&envelope.callback_id, envelope.payload) {
                    warn!(
                        "bridge envelope for unknown callback {}",
                        envelope.callback_id
                    );
                }
            }
        });

        Self {
            http,
            config,
            registry,
            bus,
        }
    }

    /// Feeds an envelope the embedding surface captured out-of-band.
    /// The normal path extracts envelopes from fetched bridge documents;
    /// this lets a host that received one by other means hand it over.
    pub fn deliver_envelope(&self, envelope: BridgeEnvelope) {
        let _ = self.bus.try_send(envelope);
    }

    /// The waiter registry, exposed for leak checks.
    #[must_use]
    pub fn registry(&self) -> &RelayRegistry {
        &self.registry
    }

    fn spawn_fetch(&self, url: Url, callback_id: String) {
        let http = self.http.clone();
        let bus = self.bus.clone();
        tokio::spawn(async move {
            let outcome = async {
                let reply = http
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| ApiError::Transport(e.to_string()))?;
                let text = reply
                    .text()
                    .await
                    .map_err(|e| ApiError::Transport(e.to_string()))?;
                extract_envelope(&text)
            }
            .await;
            match outcome {
                Ok(envelope) => {
                    let _ = bus.send(envelope).await;
                }
                // A dead bridge document never reports back; the waiter
                // learns about it through its timeout.
                Err(e) => debug!("bridge fetch for {} failed: {}", callback_id, e),
            }
        });
    }
}

#[async_trait]
impl Transport for MessageBridgeTransport {
    fn name(&self) -> &'static str {
        "message-bridge"
    }

    async fn attempt(&self, request: &ApiRequest) -> Result<TransportReply> {
        let callback_id = correlation_id("pm");
        let (_slot, rx) = self.registry.register(&callback_id);

        let mut url = build_url(&self.config, request);
        url.query_pairs_mut()
            .append_pair("transport", "postmessage")
            .append_pair("callback_id", &callback_id);
        debug!("message bridge {} as {}", request.path, callback_id);

        self.spawn_fetch(url, callback_id.clone());

        match tokio::time::timeout(request.timeout, rx).await {
            Ok(Ok(payload)) => Ok(TransportReply::Body(Bytes::from(serde_json::to_vec(
                &payload,
            )?))),
            Ok(Err(_)) => Err(ApiError::Transport(
                "bridge waiter dropped".to_string(),
            )),
            Err(_) => Err(ApiError::Timeout(format!(
                "message bridge {}: no envelope within {:?}",
                request.path, request.timeout
            ))),
        }
    }
}
