//! Campaign model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored campaign. The dispatch engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    /// Row id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Subject line.
    pub subject: String,
    /// Declared sender address.
    pub from_email: String,
    /// HTML body, if any.
    pub html_body: Option<String>,
    /// Plain-text body, if any.
    pub text_body: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a campaign.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCampaign {
    /// Display name.
    pub name: String,
    /// Subject line.
    pub subject: String,
    /// Declared sender address.
    pub from_email: String,
    /// HTML body, if any.
    pub html_body: Option<String>,
    /// Plain-text body, if any.
    pub text_body: Option<String>,
}
