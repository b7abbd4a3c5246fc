//! Data types exchanged with the card service.

mod card;
mod reply;
mod search;

pub use card::{CardFields, CardPatch, CardRecord};
pub use reply::{BridgeEnvelope, GetReply, SearchReply};
pub use search::{SearchParams, SortBy};
