//! Client for a business-card capture service that lives behind a
//! single web app endpoint. Operations are selected by a `path` query
//! parameter and authenticated with a shared token; replies are not
//! always readable on the direct route, so reads and writes each run
//! over a chain of substitutable transport mechanisms, and `add` is
//! confirmed by polling for the record the dispatch proposed.

pub mod client;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod transport;
pub mod types;

pub use client::{CardClient, CreatedCard, NewCardImage};
pub use config::{ApiConfig, ReadFallback, ENV_API_BASE, ENV_API_TOKEN};
pub use error::{ApiError, Result};
pub use reconcile::{CancelHandle, CancelToken};
pub use types::{CardFields, CardPatch, CardRecord, SearchParams, SortBy};
