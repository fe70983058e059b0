//! # mailblast-core
//!
//! Deliverability validation and campaign dispatch engine for `mailblast`.
//!
//! This crate provides:
//! - Per-address validation: syntax, DNS route, disposable/role
//!   classification, optional live-mailbox probe, confidence scoring
//! - Bulk validation under a bounded worker pool
//! - Message dispatch through a transactional HTTP provider with SMTP and
//!   verified-sender fallback
//! - A queue adapter that runs dispatch on a background worker with bounded
//!   retry, or synchronously when no queue is configured
//! - SQLite storage for contacts, campaigns, and messages
//!
//! HTTP routing, authentication, and import/export belong to the caller;
//! the engine consumes an authenticated request's parameters and a
//! database pool, nothing more.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod campaigns;
pub mod config;
pub mod contacts;
pub mod dispatch;
mod error;
pub mod messages;
pub mod service;
pub mod store;
pub mod validate;

pub use campaigns::{Campaign, CampaignRepository, NewCampaign};
pub use config::{
    Config, ProviderConfig, ProviderRegion, QueueConfig, Security, SmtpConfig, ValidationConfig,
};
pub use contacts::{Contact, ContactRepository, ContactStatus};
pub use dispatch::{
    DispatchQueue, Dispatcher, HttpProvider, MailTransport, OutgoingEmail, RejectionKind,
    SmtpMailer, TransportError,
};
pub use error::{Error, Result};
pub use messages::{CampaignStats, DispatchContext, Message, MessageRepository, MessageStatus};
pub use service::{
    EnqueueSummary, StoredVerdict, campaign_stats, send_campaign, send_selected,
    validate_and_store, validate_pending,
};
pub use validate::{
    AddressValidator, AddressVerdict, BulkOptions, BulkSummary, Checks, MxResolver, SmtpProbe,
    ValidateOptions, Validator, Verdict, validate_all,
};
