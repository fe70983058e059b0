//! SMTP envelope addresses and command serialization.

use crate::error::{Error, Result};

/// Envelope address for `MAIL FROM` / `RCPT TO`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Envelope(String);

impl Envelope {
    /// Creates an envelope address from a string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] unless the address has the shape
    /// `local@domain` with both parts non-empty.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        let Some((local, domain)) = addr.split_once('@') else {
            return Err(Error::InvalidAddress(format!("missing '@' in {addr:?}")));
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(Error::InvalidAddress(format!(
                "malformed address {addr:?}"
            )));
        }
        Ok(Self(addr))
    }

    /// A null reverse-path (`MAIL FROM:<>`), used by probes that must not
    /// trigger bounces.
    #[must_use]
    pub const fn null() -> Self {
        Self(String::new())
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SMTP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO - extended greeting.
    Ehlo {
        /// Client hostname.
        hostname: String,
    },
    /// STARTTLS - upgrade to TLS.
    StartTls,
    /// AUTH PLAIN with SASL-IR initial response.
    AuthPlain {
        /// Base64-encoded `\0user\0password`.
        initial_response: String,
    },
    /// MAIL FROM - start a mail transaction.
    MailFrom {
        /// Reverse-path (may be null for probes).
        from: Envelope,
    },
    /// RCPT TO - add a recipient.
    RcptTo {
        /// Forward-path.
        to: Envelope,
    },
    /// DATA - begin message payload.
    Data,
    /// RSET - abort the current transaction.
    Rset,
    /// QUIT - close the session.
    Quit,
}

impl Command {
    /// Serializes the command as a CRLF-terminated line.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let line = match self {
            Self::Ehlo { hostname } => format!("EHLO {hostname}"),
            Self::StartTls => "STARTTLS".to_string(),
            Self::AuthPlain { initial_response } => format!("AUTH PLAIN {initial_response}"),
            Self::MailFrom { from } => format!("MAIL FROM:<{from}>"),
            Self::RcptTo { to } => format!("RCPT TO:<{to}>"),
            Self::Data => "DATA".to_string(),
            Self::Rset => "RSET".to_string(),
            Self::Quit => "QUIT".to_string(),
        };
        let mut buf = line.into_bytes();
        buf.extend_from_slice(b"\r\n");
        buf
    }
}
