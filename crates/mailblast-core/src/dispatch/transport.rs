//! The mail-transport seam.
//!
//! The pipeline talks to a [`MailTransport`]; production supplies the HTTP
//! provider adapter or the SMTP mailer, tests supply scripted fakes.
//! Classifying a provider rejection ("is this an unverified-sender error?")
//! is a capability of the adapter, not string matching at the call site.

use async_trait::async_trait;
use serde::Serialize;

/// One message ready for transmission.
///
/// Serializes directly into the provider API request body
/// (`{from, to, subject, html|text, reply_to?}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    /// Envelope and header sender.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body, if any.
    #[serde(rename = "html", skip_serializing_if = "Option::is_none")]
    pub html_body: Option<String>,
    /// Plain-text body, if any.
    #[serde(rename = "text", skip_serializing_if = "Option::is_none")]
    pub text_body: Option<String>,
    /// Reply-To header, set by the verified-sender fallback to preserve the
    /// declared sender.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

impl OutgoingEmail {
    /// Returns a copy re-addressed from a verified sender, keeping the
    /// original declared sender reachable via Reply-To.
    #[must_use]
    pub fn with_verified_sender(&self, verified: &str) -> Self {
        Self {
            from: verified.to_string(),
            reply_to: Some(self.from.clone()),
            ..self.clone()
        }
    }
}

/// Why a provider rejected a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// The declared sender is not a verified identity with the provider.
    UnverifiedSender,
    /// Any other definitive rejection.
    Other,
}

/// Transport failure taxonomy. `is_transient` drives queue-level retry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The provider definitively rejected the request.
    #[error("{detail}")]
    Rejected {
        /// Classified rejection cause.
        kind: RejectionKind,
        /// Provider-supplied detail.
        detail: String,
    },

    /// The SMTP server refused one or more recipients even though the
    /// session itself completed.
    #[error("{0:?}")]
    Recipients(Vec<(String, String)>),

    /// Connectivity problem: timeout, refused connection, 5xx from the
    /// provider edge.
    #[error("{0}")]
    Network(String),

    /// SMTP protocol failure.
    #[error("{0}")]
    Smtp(String),
}

impl TransportError {
    /// Short category tag used in message diagnostics.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => "rejected",
            Self::Recipients(_) => "recipients",
            Self::Network(_) => "network",
            Self::Smtp(_) => "smtp",
        }
    }

    /// Whether queue-level retry can plausibly help.
    ///
    /// Definitive rejections and refused recipients are final; connectivity
    /// problems and transient SMTP codes are worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Rejected { .. } | Self::Recipients(_) => false,
            Self::Network(_) => true,
            Self::Smtp(detail) => !detail.starts_with("SMTP error 5"),
        }
    }

    /// Diagnostic string stored on a failed message: `category: detail`.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        format!("{}: {self}", self.category())
    }
}

impl From<mailblast_smtp::Error> for TransportError {
    fn from(err: mailblast_smtp::Error) -> Self {
        match &err {
            mailblast_smtp::Error::Io(_)
            | mailblast_smtp::Error::Timeout(_)
            | mailblast_smtp::Error::ConnectionClosed => Self::Network(err.to_string()),
            _ => Self::Smtp(err.to_string()),
        }
    }
}

/// Sends one message. Implementations must be safe to call concurrently for
/// different messages.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Transmits the message, returning only once the outcome is known.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verified_sender_rewrite_preserves_declared_sender() {
        let email = OutgoingEmail {
            from: "news@startup.example".to_string(),
            to: "alice@example.com".to_string(),
            subject: "Hello".to_string(),
            html_body: None,
            text_body: Some("hi".to_string()),
            reply_to: None,
        };

        let rewritten = email.with_verified_sender("verified@startup.example");
        assert_eq!(rewritten.from, "verified@startup.example");
        assert_eq!(rewritten.reply_to.as_deref(), Some("news@startup.example"));
        assert_eq!(rewritten.to, email.to);
        assert_eq!(rewritten.subject, email.subject);
    }

    #[test]
    fn transient_classification() {
        assert!(TransportError::Network("connect refused".into()).is_transient());
        assert!(TransportError::Smtp("SMTP error 451: greylisted".into()).is_transient());
        assert!(!TransportError::Smtp("SMTP error 554: blocked".into()).is_transient());
        assert!(
            !TransportError::Rejected {
                kind: RejectionKind::Other,
                detail: "bad payload".into(),
            }
            .is_transient()
        );
        assert!(
            !TransportError::Recipients(vec![("a@b.example".into(), "550".into())]).is_transient()
        );
    }

    #[test]
    fn diagnostic_carries_category_and_detail() {
        let err = TransportError::Network("timed out".into());
        assert_eq!(err.diagnostic(), "network: timed out");

        let err = TransportError::Rejected {
            kind: RejectionKind::Other,
            detail: "payload too large".into(),
        };
        assert_eq!(err.diagnostic(), "rejected: payload too large");
    }
}
