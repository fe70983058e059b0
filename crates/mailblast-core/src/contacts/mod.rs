//! Contact storage: recipients with a deliverability lifecycle status.

mod model;
mod repository;

pub use model::{Contact, ContactStatus};
pub use repository::ContactRepository;
