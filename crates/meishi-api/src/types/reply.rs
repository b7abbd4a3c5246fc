//! Wire shapes of backend replies.
//!
//! Every readable reply is a JSON envelope with an `ok` flag. `ok: false`
//! is the backend refusing the operation; it is reported as a backend
//! error and never retried on another transport.

use super::CardRecord;
use serde::{Deserialize, Serialize};

/// Reply envelope for `search`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchReply {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub items: Vec<CardRecord>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Reply envelope for `get`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GetReply {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub item: Option<CardRecord>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Correlated payload carried by a bridge reply document. The pump task
/// routes it to the waiter registered under `callback_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeEnvelope {
    pub callback_id: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}
