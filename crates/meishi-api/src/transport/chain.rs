//! Ordered fallback across transport primitives.

use crate::error::{ApiError, Result};
use crate::transport::{ApiRequest, Transport, TransportReply};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Tries its members in order. A member is substituted only when it
/// failed in a transport-kind way; backend refusals and decode
/// mismatches end the chain immediately, since every member would
/// reproduce them. With two members this is one attempt and at most one
/// substitution.
pub struct FallbackChain {
    transports: Vec<Arc<dyn Transport>>,
}

impl FallbackChain {
    #[must_use]
    pub fn new(transports: Vec<Arc<dyn Transport>>) -> Self {
        Self { transports }
    }

    /// Mechanism names in attempt order, for logs and tests.
    #[must_use]
    pub fn members(&self) -> Vec<&'static str> {
        self.transports.iter().map(|t| t.name()).collect()
    }
}

#[async_trait]
impl Transport for FallbackChain {
    fn name(&self) -> &'static str {
        "fallback-chain"
    }

    async fn attempt(&self, request: &ApiRequest) -> Result<TransportReply> {
        let mut last_error = None;
        for (index, transport) in self.transports.iter().enumerate() {
            if index > 0 {
                debug!("falling back to {} for {}", transport.name(), request.path);
            }
            match transport.attempt(request).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_transport_kind() => {
                    warn!("{} failed for {}: {}", transport.name(), request.path, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error
            .unwrap_or_else(|| ApiError::Transport("no transport configured".to_string())))
    }
}
