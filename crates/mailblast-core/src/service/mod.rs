//! Service entry points the API layer calls.
//!
//! These are thin orchestrations over the repositories, the validation
//! engine, and the queue adapter; routing, authentication, and
//! request/response schemas live with the caller.

mod campaigns;
mod validation;

pub use campaigns::{EnqueueSummary, campaign_stats, send_campaign, send_selected};
pub use validation::{StoredVerdict, validate_and_store, validate_pending};
