//! Add-completion reconciliation.
//!
//! The `add` write is dispatched over an opaque transport, so nothing in
//! the reply says whether the card was created. The reconciler turns the
//! dispatch into an awaited result: it polls `get` for the id the client
//! proposed until the record is readable or the deadline passes.
//! Individual poll failures are swallowed; only the deadline or an
//! explicit cancel ends the wait early.

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::transport::{ApiRequest, FallbackChain, Transport};
use crate::types::{CardRecord, GetReply};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Cancels a pending add reconciliation. Cloneable; any clone cancels
/// every token minted from this handle.
#[derive(Clone)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// A token observing this handle.
    #[must_use]
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Signals cancellation to every outstanding token.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer half of a [`CancelHandle`].
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that can never fire, for callers without a cancel path.
    #[must_use]
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        Self { rx }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is signalled. Pends forever when the
    /// handle is gone, since nobody can signal any more.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// One readability probe for the proposed id. `ok: false` and a missing
/// or mismatched item both mean "not observable yet", not failure.
async fn probe(reads: &FallbackChain, config: &ApiConfig, id: &str) -> Result<Option<CardRecord>> {
    let request = ApiRequest::get("get", config.read_timeout).with_query("id", id);
    let body = reads.attempt(&request).await?.into_body()?;
    let reply: GetReply = serde_json::from_slice(&body)?;
    if !reply.ok {
        return Ok(None);
    }
    Ok(reply.item.filter(|record| record.id == id))
}

/// Polls until the card dispatched under `proposed_id` becomes readable.
/// Resolves with the stored record, or rejects with
/// [`ApiError::Unconfirmed`] at the deadline or [`ApiError::Cancelled`]
/// when the token fires.
pub(crate) async fn await_creation(
    reads: &FallbackChain,
    config: &ApiConfig,
    proposed_id: &str,
    mut cancel: CancelToken,
) -> Result<CardRecord> {
    let started = Instant::now();
    let mut polls: u32 = 0;

    while started.elapsed() < config.poll_deadline {
        tokio::select! {
            _ = tokio::time::sleep(config.poll_interval) => {}
            _ = cancel.cancelled() => {
                info!("add {} cancelled after {} polls", proposed_id, polls);
                return Err(ApiError::Cancelled);
            }
        }

        polls += 1;
        let outcome = tokio::select! {
            outcome = probe(reads, config, proposed_id) => outcome,
            _ = cancel.cancelled() => {
                info!("add {} cancelled during poll {}", proposed_id, polls);
                return Err(ApiError::Cancelled);
            }
        };

        match outcome {
            Ok(Some(record)) => {
                info!(
                    "add {} confirmed after {} polls ({:?})",
                    proposed_id,
                    polls,
                    started.elapsed()
                );
                return Ok(record);
            }
            Ok(None) => {}
            Err(e) => debug!("poll {} for {}: {}", polls, proposed_id, e),
        }
    }

    warn!(
        "add {} not observed after {} polls within {:?}",
        proposed_id, polls, config.poll_deadline
    );
    Err(ApiError::Unconfirmed(format!(
        "{} was dispatched but not readable within {:?}; the card may still appear later",
        proposed_id, config.poll_deadline
    )))
}
