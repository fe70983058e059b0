//! SMTP reply parsing and classification.

use crate::error::{Error, Result};

/// SMTP reply from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code (e.g. 250).
    pub code: ReplyCode,
    /// Reply text lines, code and separator stripped.
    pub lines: Vec<String>,
}

impl Reply {
    /// Creates a new reply.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec is not const-compatible
    pub fn new(code: ReplyCode, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    /// Parses a reply from the raw lines of a (possibly multi-line)
    /// response.
    ///
    /// Single: `250 OK` — multi: `250-line\r\n250 last line`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the reply is malformed.
    pub fn parse(raw: &[String]) -> Result<Self> {
        let first = raw
            .first()
            .ok_or_else(|| Error::Protocol("empty reply".into()))?;
        if first.len() < 3 {
            return Err(Error::Protocol(format!("reply too short: {first}")));
        }

        let code = first[0..3]
            .parse::<u16>()
            .map_err(|_| Error::Protocol(format!("invalid reply code: {}", &first[0..3])))?;

        let mut lines = Vec::with_capacity(raw.len());
        for line in raw {
            match line.len() {
                0..=2 => return Err(Error::Protocol(format!("malformed reply line: {line}"))),
                3 => lines.push(String::new()),
                _ => lines.push(line[4..].to_string()),
            }
        }

        Ok(Self::new(ReplyCode::new(code), lines))
    }

    /// Returns true if this is a success reply (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns true if this is a transient failure (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        self.code.is_transient()
    }

    /// Returns true if this is a permanent failure (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        self.code.is_permanent()
    }

    /// Full reply text as a single string.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Classifies a `RCPT TO` reply for mailbox probing.
    #[must_use]
    pub fn mailbox_status(&self) -> MailboxStatus {
        if self.is_success() {
            return MailboxStatus::Accepted;
        }
        if self.code.is_no_such_mailbox() {
            return MailboxStatus::NoSuchMailbox;
        }
        MailboxStatus::Inconclusive
    }
}

/// Outcome of a non-delivering `RCPT TO` check, as observed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxStatus {
    /// The server accepted the recipient.
    Accepted,
    /// The server answered with a definitive no-such-mailbox code.
    NoSuchMailbox,
    /// Greylisting, policy rejection, or any other non-definitive answer.
    Inconclusive,
}

/// SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// Creates a new reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true for success codes (2xx).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true for intermediate codes (3xx).
    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// Returns true for transient failures (4xx).
    #[must_use]
    pub const fn is_transient(self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// Returns true for permanent failures (5xx).
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        self.0 >= 500 && self.0 < 600
    }

    /// Returns true for the codes that definitively mean the mailbox does
    /// not exist (550, 551, 553).
    #[must_use]
    pub const fn is_no_such_mailbox(self) -> bool {
        matches!(self.0, 550 | 551 | 553)
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Common reply codes
impl ReplyCode {
    /// 220 Service ready
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Service closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);
    /// 421 Service not available, closing transmission channel
    pub const SERVICE_UNAVAILABLE: Self = Self(421);
    /// 450 Mailbox unavailable (busy)
    pub const MAILBOX_BUSY: Self = Self(450);
    /// 521 Host does not accept mail
    pub const DOES_NOT_ACCEPT_MAIL: Self = Self(521);
    /// 535 Authentication credentials invalid
    pub const AUTH_FAILED: Self = Self(535);
    /// 550 Mailbox unavailable (not found, access denied)
    pub const MAILBOX_UNAVAILABLE: Self = Self(550);
    /// 551 User not local
    pub const USER_NOT_LOCAL: Self = Self(551);
    /// 553 Mailbox name not allowed
    pub const MAILBOX_NAME_INVALID: Self = Self(553);
    /// 554 Transaction failed
    pub const TRANSACTION_FAILED: Self = Self(554);
}

/// Checks whether a raw line is the last line of a multi-line reply (space
/// separator after the code rather than `-`).
#[must_use]
pub(crate) fn is_last_line(line: &str) -> bool {
    line.len() >= 4 && line.as_bytes()[3] == b' ' || line.len() == 3
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_line() {
        let reply = Reply::parse(&["250 OK".to_string()]).unwrap();
        assert_eq!(reply.code, ReplyCode::OK);
        assert_eq!(reply.lines, vec!["OK"]);
        assert!(reply.is_success());
    }

    #[test]
    fn parse_multi_line() {
        let raw = vec![
            "250-mx.example.com".to_string(),
            "250-STARTTLS".to_string(),
            "250 SIZE 35882577".to_string(),
        ];
        let reply = Reply::parse(&raw).unwrap();
        assert_eq!(reply.code.as_u16(), 250);
        assert_eq!(reply.lines.len(), 3);
        assert_eq!(reply.lines[1], "STARTTLS");
    }

    #[test]
    fn parse_code_only() {
        let reply = Reply::parse(&["250".to_string()]).unwrap();
        assert_eq!(reply.lines, vec![String::new()]);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Reply::parse(&[]).is_err());
        assert!(Reply::parse(&["25".to_string()]).is_err());
        assert!(Reply::parse(&["ABC nope".to_string()]).is_err());
    }

    #[test]
    fn classification_bands() {
        assert!(ReplyCode::OK.is_success());
        assert!(ReplyCode::START_DATA.is_intermediate());
        assert!(ReplyCode::MAILBOX_BUSY.is_transient());
        assert!(ReplyCode::MAILBOX_UNAVAILABLE.is_permanent());
    }

    #[test]
    fn no_such_mailbox_codes() {
        assert!(ReplyCode::MAILBOX_UNAVAILABLE.is_no_such_mailbox());
        assert!(ReplyCode::USER_NOT_LOCAL.is_no_such_mailbox());
        assert!(ReplyCode::MAILBOX_NAME_INVALID.is_no_such_mailbox());
        assert!(!ReplyCode::TRANSACTION_FAILED.is_no_such_mailbox());
        assert!(!ReplyCode::MAILBOX_BUSY.is_no_such_mailbox());
    }

    #[test]
    fn mailbox_status_from_rcpt_reply() {
        let accepted = Reply::new(ReplyCode::OK, vec!["Accepted".into()]);
        assert_eq!(accepted.mailbox_status(), MailboxStatus::Accepted);

        let missing = Reply::new(ReplyCode::MAILBOX_UNAVAILABLE, vec!["No such user".into()]);
        assert_eq!(missing.mailbox_status(), MailboxStatus::NoSuchMailbox);

        let greylisted = Reply::new(ReplyCode::MAILBOX_BUSY, vec!["Try again later".into()]);
        assert_eq!(greylisted.mailbox_status(), MailboxStatus::Inconclusive);

        let policy = Reply::new(ReplyCode::TRANSACTION_FAILED, vec!["Blocked".into()]);
        assert_eq!(policy.mailbox_status(), MailboxStatus::Inconclusive);
    }

    #[test]
    fn last_line_detection() {
        assert!(is_last_line("250 OK"));
        assert!(is_last_line("250"));
        assert!(!is_last_line("250-more"));
    }
}
