//! Campaign storage: message templates with a declared sender.

mod model;
mod repository;

pub use model::{Campaign, NewCampaign};
pub use repository::CampaignRepository;
