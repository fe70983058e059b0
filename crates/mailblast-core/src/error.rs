//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Mail transport failed (provider API or SMTP).
    #[error("Transport error: {0}")]
    Transport(#[from] crate::dispatch::TransportError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Campaign not found.
    #[error("Campaign not found: {0}")]
    CampaignNotFound(i64),

    /// Contact not found.
    #[error("Contact not found: {0}")]
    ContactNotFound(i64),

    /// Message references a campaign or contact that no longer exists.
    #[error("Message {0} has a dangling reference: {1}")]
    DanglingMessage(i64, String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The dispatch queue is no longer accepting work.
    #[error("Dispatch queue closed")]
    QueueClosed,
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
