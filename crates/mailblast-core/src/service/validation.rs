//! Validation entry points: single address and bulk.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::Result;
use crate::contacts::ContactRepository;
use crate::validate::{
    AddressValidator, AddressVerdict, BulkOptions, BulkSummary, ValidateOptions, validate_all,
};

/// A verdict together with the persisted contact it was applied to.
#[derive(Debug, Clone, Serialize)]
pub struct StoredVerdict {
    /// Persisted contact row id.
    pub contact_id: i64,
    /// The verdict, including checks, score, provider, and suggestion.
    #[serde(flatten)]
    pub verdict: AddressVerdict,
}

/// Validates one address and applies the verdict to its contact row,
/// creating the row (status `new`) if it does not exist yet.
///
/// # Errors
///
/// Returns an error only for storage failures; validation itself never
/// fails.
pub async fn validate_and_store<V: AddressValidator>(
    validator: &V,
    contacts: &ContactRepository,
    email: &str,
    options: &ValidateOptions,
) -> Result<StoredVerdict> {
    let contact = contacts.ensure(email).await?;
    let verdict = validator.validate(email, options).await;

    contacts
        .apply_verdict(
            contact.id,
            verdict.verdict.contact_status(),
            verdict.reason.as_deref(),
            verdict.provider.as_deref(),
        )
        .await?;

    info!(contact_id = contact.id, email = %verdict.email, verdict = %verdict.verdict, "verdict stored");
    Ok(StoredVerdict {
        contact_id: contact.id,
        verdict,
    })
}

/// Runs bulk validation over every contact still worth validating
/// (status `new`, `unknown`, or `risky`).
///
/// # Errors
///
/// Returns an error only for storage failures.
pub async fn validate_pending<V>(
    validator: Arc<V>,
    contacts: &ContactRepository,
    options: BulkOptions,
) -> Result<BulkSummary>
where
    V: AddressValidator + 'static,
{
    let targets = contacts.validation_candidates().await?;
    if targets.is_empty() {
        return Ok(BulkSummary {
            validated: 0,
            smtp_probe: options.probe_mailbox,
            timeout: options.timeout.as_secs_f64(),
            concurrency: options.concurrency,
        });
    }

    info!(count = targets.len(), "starting bulk validation");
    validate_all(validator, contacts.clone(), targets, options).await
}
