//! High-level card operations.
//!
//! [`CardClient`] owns the transport chains and exposes the four
//! operations the card service supports. Callers never pick a
//! mechanism: reads try the direct transport and fall back to a relay,
//! writes try the opaque post and fall back to the form post.

use crate::config::{ApiConfig, ReadFallback};
use crate::error::{ApiError, Result};
use crate::reconcile::{self, CancelToken};
use crate::transport::{
    correlation_id, ApiRequest, DirectTransport, FallbackChain, FormPostTransport,
    MessageBridgeTransport, OpaquePostTransport, ScriptRelayTransport, Transport,
};
use crate::types::{CardFields, CardPatch, CardRecord, GetReply, SearchParams, SearchReply};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// A captured card image ready to dispatch.
#[derive(Clone, Debug)]
pub struct NewCardImage {
    /// Base64 of the image bytes, without any data-URL prefix.
    pub image_base64: String,
    /// Original filename, when known.
    pub filename: Option<String>,
}

/// Outcome of a confirmed add: the stored id and the fields the backend
/// extracted from the image, ready for correction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedCard {
    pub id: String,
    pub fields: CardFields,
}

/// Client for the card service.
pub struct CardClient {
    config: Arc<ApiConfig>,
    reads: FallbackChain,
    writes: FallbackChain,
    bridge: Option<Arc<MessageBridgeTransport>>,
}

impl CardClient {
    /// Builds a client with its own connection pool.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Config(format!("http client: {}", e)))?;
        Ok(Self::with_http_client(http, config))
    }

    /// Builds a client on a caller-supplied connection pool.
    pub fn with_http_client(http: reqwest::Client, config: ApiConfig) -> Self {
        let config = Arc::new(config);

        let direct: Arc<dyn Transport> =
            Arc::new(DirectTransport::new(http.clone(), config.clone()));
        let (relay, bridge): (Arc<dyn Transport>, Option<Arc<MessageBridgeTransport>>) =
            match config.read_fallback {
                ReadFallback::ScriptRelay => (
                    Arc::new(ScriptRelayTransport::new(http.clone(), config.clone())),
                    None,
                ),
                ReadFallback::MessageBridge => {
                    let bridge =
                        Arc::new(MessageBridgeTransport::new(http.clone(), config.clone()));
                    (bridge.clone() as Arc<dyn Transport>, Some(bridge))
                }
            };
        let reads = FallbackChain::new(vec![direct, relay]);

        let opaque: Arc<dyn Transport> =
            Arc::new(OpaquePostTransport::new(http.clone(), config.clone()));
        let form: Arc<dyn Transport> = Arc::new(FormPostTransport::new(http, config.clone()));
        let writes = FallbackChain::new(vec![opaque, form]);

        Self {
            config,
            reads,
            writes,
            bridge,
        }
    }

    /// Client configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// The relay stage of the read chain when it is the message bridge,
    /// for hosts that capture envelopes out-of-band.
    #[must_use]
    pub fn message_bridge(&self) -> Option<&MessageBridgeTransport> {
        self.bridge.as_deref()
    }

    /// Captures a card. Dispatches the image under a client-proposed id,
    /// then waits until the stored record is readable and returns its
    /// extracted fields.
    pub async fn add(&self, image: NewCardImage) -> Result<CreatedCard> {
        self.add_with_cancel(image, CancelToken::never()).await
    }

    /// [`add`](Self::add) with a cancel token. Cancelling while the
    /// reconciler waits rejects promptly; the card may still be created
    /// server-side.
    pub async fn add_with_cancel(
        &self,
        image: NewCardImage,
        cancel: CancelToken,
    ) -> Result<CreatedCard> {
        if image.image_base64.is_empty() {
            return Err(ApiError::Config("image payload is empty".to_string()));
        }

        let proposed_id = correlation_id("card");
        let mut body = json!({
            "id": proposed_id,
            "imageBase64": image.image_base64,
        });
        if let Some(filename) = &image.filename {
            body["filename"] = json!(filename);
        }
        let request = ApiRequest::post("add", body, self.config.add_dispatch_timeout);

        info!("dispatching add as {}", proposed_id);
        // A failed dispatch is terminal; reconciliation only starts once
        // the write is on the wire.
        self.writes.attempt(&request).await?;

        let record =
            reconcile::await_creation(&self.reads, &self.config, &proposed_id, cancel).await?;
        Ok(CreatedCard {
            id: record.id,
            fields: record.fields,
        })
    }

    /// Replaces the editable fields of a stored card. Unset patch
    /// members are written as empty strings; the backend replaces the
    /// whole field set on every update.
    pub async fn update(&self, id: &str, patch: &CardPatch) -> Result<()> {
        // The write is opaque, so an empty id would fail invisibly.
        if id.is_empty() {
            return Err(ApiError::Config("card id is required".to_string()));
        }
        let body = json!({ "id": id, "fields": patch.to_fields() });
        let request = ApiRequest::post("update", body, self.config.post_timeout);
        info!("dispatching update for {}", id);
        self.writes.attempt(&request).await?;
        Ok(())
    }

    /// Lists cards matching the filters.
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<CardRecord>> {
        let mut request = ApiRequest::get("search", self.config.read_timeout);
        for (key, value) in params.to_query() {
            request = request.with_query(key, value);
        }
        let body = self.reads.attempt(&request).await?.into_body()?;
        let reply: SearchReply = serde_json::from_slice(&body)?;
        if !reply.ok {
            return Err(ApiError::Backend(
                reply.error.unwrap_or_else(|| "search failed".to_string()),
            ));
        }
        Ok(reply.items)
    }

    /// Fetches one card by id.
    pub async fn get(&self, id: &str) -> Result<CardRecord> {
        let request = ApiRequest::get("get", self.config.read_timeout).with_query("id", id);
        let body = self.reads.attempt(&request).await?.into_body()?;
        let reply: GetReply = serde_json::from_slice(&body)?;
        if !reply.ok {
            return Err(ApiError::Backend(
                reply.error.unwrap_or_else(|| "get failed".to_string()),
            ));
        }
        reply
            .item
            .ok_or_else(|| ApiError::Backend("card not found".to_string()))
    }
}
