//! Message storage: one row per campaign × recipient, owned by the dispatch
//! pipeline once queued.

mod model;
mod repository;

pub use model::{CampaignStats, DispatchContext, Message, MessageStatus};
pub use repository::MessageRepository;
