//! # mailblast-smtp
//!
//! SMTP client implementing the RFC 5321 subset the dispatch engine needs:
//! mail submission (EHLO, STARTTLS, AUTH, MAIL FROM, RCPT TO, DATA) and
//! non-delivering mailbox probing (RCPT TO without DATA).
//!
//! Every network operation carries an explicit deadline; a server that stops
//! responding surfaces as [`Error::Timeout`] rather than hanging the caller.
//!
//! ## Sending a message
//!
//! ```ignore
//! use std::time::Duration;
//! use mailblast_smtp::{Client, Envelope, connect};
//!
//! let timeout = Duration::from_secs(10);
//! let stream = connect("smtp.example.com", 587, timeout).await?;
//! let client = Client::greet(stream, timeout).await?;
//! let client = client.ehlo("mailer.example.com").await?;
//! let client = client.starttls("smtp.example.com").await?;
//! let client = client.auth_plain("user", "secret").await?;
//! let client = client.mail_from(&Envelope::new("news@example.com")?).await?;
//! let client = client.rcpt_to(&Envelope::new("alice@example.org")?).await?;
//! let client = client.data().await?;
//! let client = client.send_body(b"Subject: Hi\r\n\r\nHello\r\n").await?;
//! client.quit().await?;
//! ```
//!
//! ## Probing a mailbox
//!
//! A probe issues `RCPT TO` and reads the raw reply instead of failing on
//! rejection — the caller classifies 250 / 4xx / 550 itself via
//! [`Reply::mailbox_status`].
//!
//! ## Connection states
//!
//! The type-state pattern makes invalid command sequences unrepresentable:
//!
//! ```text
//! Greeted ── ehlo/starttls/auth_plain ──→ Greeted
//!    │
//!    └── mail_from() ──→ Transaction ── rcpt_to() ──→ Accepting ── data() ──→ Payload
//!                             │
//!                             └── probe_rcpt() ──→ (Transaction, Reply)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod command;
mod error;
mod reply;
mod stream;

pub use client::{Accepting, Client, Greeted, Payload, ServerCaps, Transaction};
pub use command::{Command, Envelope};
pub use error::{Error, Result};
pub use reply::{MailboxStatus, Reply, ReplyCode};
pub use stream::{SmtpStream, connect, connect_tls};
