//! Address deliverability validation.
//!
//! The pipeline runs syntax → DNS route → disposable/role classification →
//! optional live-mailbox probe → scoring, producing an [`AddressVerdict`].
//! It never returns an error: network trouble degrades the verdict to
//! `unknown`/`risky` instead of failing the caller.

mod bulk;
mod classify;
mod dns;
mod engine;
mod probe;
mod score;
mod syntax;
mod verdict;

pub use bulk::{BulkOptions, BulkSummary, validate_all};
pub use dns::{DomainRoute, MxResolver, RecordResolver};
pub use engine::{AddressValidator, ValidateOptions, Validator};
pub use probe::{MailboxProbe, ProbeOutcome, SmtpProbe};
pub use verdict::{AddressVerdict, Checks, Verdict};
