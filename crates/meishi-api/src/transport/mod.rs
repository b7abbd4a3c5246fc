//! Transport primitives for the card service.
//!
//! The backend sits behind a single web app endpoint that is awkward to
//! reach: replies to plain requests are not always readable where the
//! client runs. Four mutually substitutable mechanisms cover the gaps:
//!
//! - [`DirectTransport`]: ordinary request, readable JSON reply.
//! - [`OpaquePostTransport`]: write dispatch whose reply is never read.
//! - [`FormPostTransport`]: write dispatch as a form submission.
//! - [`ScriptRelayTransport`] / [`MessageBridgeTransport`]: reads that
//!   arrive out-of-band and are routed back by correlation id.
//!
//! [`FallbackChain`] composes primitives so callers never pick one.

mod bridge;
mod chain;
mod direct;
mod form;
mod opaque;
mod registry;
mod relay;
mod request;

pub use bridge::MessageBridgeTransport;
pub use chain::FallbackChain;
pub use direct::DirectTransport;
pub use form::FormPostTransport;
pub use opaque::OpaquePostTransport;
pub use registry::{correlation_id, RelayRegistry, WaiterSlot};
pub use request::{ApiRequest, Method};

use crate::error::{ApiError, Result};
use async_trait::async_trait;
use bytes::Bytes;

/// One mechanism for carrying a request to the card service and an
/// outcome back.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Mechanism name used in logs and error context.
    fn name(&self) -> &'static str;

    /// Carries the request once. Resolves with a readable payload or a
    /// dispatch acknowledgement, or rejects; exactly one of the two,
    /// bounded by the request timeout.
    async fn attempt(&self, request: &ApiRequest) -> Result<TransportReply>;
}

/// What a primitive hands back on success.
#[derive(Clone, Debug)]
pub enum TransportReply {
    /// Reply payload bytes, already known to be JSON.
    Body(Bytes),
    /// The request reached the wire but its reply is unreadable by
    /// design. Write acknowledgement only.
    Opaque,
}

impl TransportReply {
    /// Payload bytes for read operations.
    pub fn into_body(self) -> Result<Bytes> {
        match self {
            TransportReply::Body(bytes) => Ok(bytes),
            TransportReply::Opaque => Err(ApiError::Transport(
                "opaque reply where a readable one was required".to_string(),
            )),
        }
    }
}
