//! Message model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery state of a message.
///
/// `Queued` is the sole initial state; `Sent` and `Failed` are terminal.
/// Only the dispatch pipeline transitions a message out of `Queued`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Created, awaiting dispatch.
    #[default]
    Queued,
    /// Transmitted successfully.
    Sent,
    /// Dispatch exhausted; `error` holds the diagnostic.
    Failed,
}

impl MessageStatus {
    /// Stable string form used in the database and the API surface.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }

    /// Parses the stable string form.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "sent" => Self::Sent,
            "failed" => Self::Failed,
            _ => Self::Queued,
        }
    }

    /// Returns true for `Sent` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Row id.
    pub id: i64,
    /// Owning campaign.
    pub campaign_id: i64,
    /// Recipient contact.
    pub contact_id: i64,
    /// Delivery state.
    pub status: MessageStatus,
    /// Diagnostic from the last failed attempt, if any.
    pub error: Option<String>,
    /// Transmission timestamp, set when the message reaches `Sent`.
    pub sent_at: Option<DateTime<Utc>>,
}

/// Everything dispatch needs for one message, joined in a single load:
/// the message row plus the campaign content and the recipient address.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    /// The message row.
    pub message: Message,
    /// Recipient email address.
    pub recipient: String,
    /// Campaign subject line.
    pub subject: String,
    /// Declared sender address.
    pub from_email: String,
    /// HTML body, if any.
    pub html_body: Option<String>,
    /// Plain-text body, if any.
    pub text_body: Option<String>,
}

/// Per-campaign delivery counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CampaignStats {
    /// Messages awaiting dispatch.
    pub queued: i64,
    /// Messages transmitted.
    pub sent: i64,
    /// Messages that exhausted dispatch.
    pub failed: i64,
}
