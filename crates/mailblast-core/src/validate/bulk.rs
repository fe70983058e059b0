//! Bounded-concurrency bulk validation.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::Result;
use crate::config::ValidationConfig;
use crate::contacts::{Contact, ContactRepository, ContactStatus};

use super::engine::{AddressValidator, ValidateOptions};
use super::verdict::AddressVerdict;

/// Options for one bulk run.
#[derive(Debug, Clone, Copy)]
pub struct BulkOptions {
    /// Upper bound on concurrently running validations.
    pub concurrency: usize,
    /// Per-address network timeout.
    pub timeout: Duration,
    /// Whether each validation runs the live-mailbox probe.
    pub probe_mailbox: bool,
    /// Overall budget; once exceeded, queued work is skipped while in-flight
    /// validations run to their own per-item timeout.
    pub deadline: Option<Duration>,
}

impl BulkOptions {
    /// Options using the configured defaults and no overall deadline.
    #[must_use]
    pub const fn from_config(config: &ValidationConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            timeout: config.timeout,
            probe_mailbox: config.allow_probe,
            deadline: None,
        }
    }
}

/// Summary of a bulk run, echoing the parameters used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BulkSummary {
    /// Contacts whose status was updated.
    pub validated: usize,
    /// Whether the live probe ran.
    pub smtp_probe: bool,
    /// Per-address timeout in seconds.
    pub timeout: f64,
    /// Concurrency bound used.
    pub concurrency: usize,
}

/// Validates `targets` under the concurrency bound and applies each verdict
/// to its contact row as results arrive.
///
/// Worker failures are isolated: a panicking validation maps to an
/// `unknown` status with the failure text as reason and does not abort
/// sibling workers.
///
/// # Errors
///
/// Returns an error only when applying a verdict to the store fails.
pub async fn validate_all<V>(
    validator: Arc<V>,
    contacts: ContactRepository,
    targets: Vec<Contact>,
    options: BulkOptions,
) -> Result<BulkSummary>
where
    V: AddressValidator + 'static,
{
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let started = Instant::now();
    let validate_options = ValidateOptions {
        timeout: options.timeout,
        probe_mailbox: options.probe_mailbox,
    };

    let mut workers: Vec<(i64, JoinHandle<Option<AddressVerdict>>)> =
        Vec::with_capacity(targets.len());
    for contact in targets {
        let contact_id = contact.id;
        let validator = Arc::clone(&validator);
        let semaphore = Arc::clone(&semaphore);
        let deadline = options.deadline;
        let handle = tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire().await else {
                return None;
            };
            // Deadline check happens after the permit: work already past
            // the budget is skipped rather than started.
            if deadline.is_some_and(|limit| started.elapsed() > limit) {
                debug!(email = %contact.email, "bulk deadline passed, skipping");
                return None;
            }
            Some(validator.validate(&contact.email, &validate_options).await)
        });
        workers.push((contact_id, handle));
    }

    let mut validated = 0;
    for (contact_id, handle) in workers {
        match handle.await {
            Ok(Some(verdict)) => {
                contacts
                    .apply_verdict(
                        contact_id,
                        verdict.verdict.contact_status(),
                        verdict.reason.as_deref(),
                        verdict.provider.as_deref(),
                    )
                    .await?;
                validated += 1;
            }
            Ok(None) => {}
            Err(join_error) => {
                warn!(contact_id, error = %join_error, "validation worker failed");
                contacts
                    .apply_verdict(
                        contact_id,
                        ContactStatus::Unknown,
                        Some(&join_error.to_string()),
                        None,
                    )
                    .await?;
                validated += 1;
            }
        }
    }

    Ok(BulkSummary {
        validated,
        smtp_probe: options.probe_mailbox,
        timeout: options.timeout.as_secs_f64(),
        concurrency: options.concurrency,
    })
}
