//! Contact model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Deliverability lifecycle status of a contact.
///
/// `New` contacts have never been validated; the other four states mirror
/// the validation verdict last applied to the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    /// Imported but not yet validated.
    #[default]
    New,
    /// Validation judged the address deliverable.
    Valid,
    /// Validation judged the address undeliverable.
    Invalid,
    /// Deliverable but with risk signals (disposable, catch-all, ...).
    Risky,
    /// Validation could not reach a conclusion.
    Unknown,
}

impl ContactStatus {
    /// Stable string form used in the database and the API surface.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Risky => "risky",
            Self::Unknown => "unknown",
        }
    }

    /// Parses the stable string form; anything unrecognized maps to
    /// `Unknown` so a hand-edited database row cannot poison a query.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "new" => Self::New,
            "valid" => Self::Valid,
            "invalid" => Self::Invalid,
            "risky" => Self::Risky,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A campaign recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Row id.
    pub id: i64,
    /// Normalized (lowercase) email address, unique.
    pub email: String,
    /// Optional first name.
    pub first_name: Option<String>,
    /// Optional last name.
    pub last_name: Option<String>,
    /// Deliverability status.
    pub status: ContactStatus,
    /// Short diagnostic from the last validation, if any.
    pub reason: Option<String>,
    /// Detected mailbox provider, if any.
    pub provider: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips() {
        for status in [
            ContactStatus::New,
            ContactStatus::Valid,
            ContactStatus::Invalid,
            ContactStatus::Risky,
            ContactStatus::Unknown,
        ] {
            assert_eq!(ContactStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn unrecognized_status_is_unknown() {
        assert_eq!(ContactStatus::parse("bogus"), ContactStatus::Unknown);
        assert_eq!(ContactStatus::parse(""), ContactStatus::Unknown);
    }
}
