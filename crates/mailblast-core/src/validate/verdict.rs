//! Verdict types produced by the validation pipeline.

use serde::{Deserialize, Serialize};

use crate::contacts::ContactStatus;

/// Four-valued deliverability classification, ordered by trustworthiness:
/// `Valid` > `Risky` > `Unknown` > `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The address is deliverable with high confidence.
    Valid,
    /// Deliverable but carrying risk signals.
    Risky,
    /// The checks could not reach a conclusion.
    Unknown,
    /// The address is not deliverable.
    Invalid,
}

impl Verdict {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Risky => "risky",
            Self::Unknown => "unknown",
            Self::Invalid => "invalid",
        }
    }

    /// Rank used to assert the score/verdict monotonicity invariant
    /// (higher rank ⇒ more trustworthy ⇒ higher score band).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Valid => 3,
            Self::Risky => 2,
            Self::Unknown => 1,
            Self::Invalid => 0,
        }
    }

    /// The contact status this verdict maps onto.
    #[must_use]
    pub const fn contact_status(self) -> ContactStatus {
        match self {
            Self::Valid => ContactStatus::Valid,
            Self::Risky => ContactStatus::Risky,
            Self::Unknown => ContactStatus::Unknown,
            Self::Invalid => ContactStatus::Invalid,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Individual check outcomes backing a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Checks {
    /// Address shape is well-formed.
    pub syntax_ok: bool,
    /// The domain has a mail exchanger or falls back to an address record.
    pub has_mx_or_a_record: bool,
    /// The domain is a known disposable-mailbox provider.
    pub is_disposable: bool,
    /// The local part is a role account (postmaster, info, ...).
    pub is_role_account: bool,
    /// Live-probe result; `None` when the probe was skipped or inconclusive.
    pub smtp_accepts: Option<bool>,
}

/// Result of validating one address. Never persisted directly; callers map
/// it onto a contact's status/reason/provider fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressVerdict {
    /// Normalized lowercase address.
    pub email: String,
    /// Deliverability classification.
    pub verdict: Verdict,
    /// Confidence score in `[0.0, 1.0]`, consistent with the verdict band.
    pub score: f64,
    /// Individual check outcomes the verdict was derived from.
    pub checks: Checks,
    /// Short diagnostic (e.g. `syntax`, `no_mx_or_a`), if any.
    pub reason: Option<String>,
    /// Detected mailbox provider name, if any.
    pub provider: Option<String>,
    /// Suggested correction for a likely domain typo, if any.
    pub suggestion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_follow_trustworthiness() {
        assert!(Verdict::Valid.rank() > Verdict::Risky.rank());
        assert!(Verdict::Risky.rank() > Verdict::Unknown.rank());
        assert!(Verdict::Unknown.rank() > Verdict::Invalid.rank());
    }

    #[test]
    fn contact_status_mapping() {
        assert_eq!(Verdict::Valid.contact_status(), ContactStatus::Valid);
        assert_eq!(Verdict::Unknown.contact_status(), ContactStatus::Unknown);
    }
}
