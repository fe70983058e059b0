//! Type-state SMTP client.

use std::marker::PhantomData;
use std::time::Duration;

use base64::Engine;
use tracing::trace;

use crate::command::{Command, Envelope};
use crate::error::{Error, Result};
use crate::reply::{Reply, is_last_line};
use crate::stream::SmtpStream;

/// Type-state marker: session established, no transaction open.
#[derive(Debug)]
pub struct Greeted;

/// Type-state marker: `MAIL FROM` accepted, awaiting recipients.
#[derive(Debug)]
pub struct Transaction;

/// Type-state marker: at least one recipient accepted.
#[derive(Debug)]
pub struct Accepting;

/// Type-state marker: `DATA` accepted, awaiting the message payload.
#[derive(Debug)]
pub struct Payload;

/// Server capabilities learned from the EHLO response.
#[derive(Debug, Clone, Default)]
pub struct ServerCaps {
    /// Server hostname from the greeting banner.
    pub hostname: String,
    /// Raw EHLO capability lines (e.g. `STARTTLS`, `SIZE 35882577`).
    pub extensions: Vec<String>,
}

impl ServerCaps {
    /// Checks whether the server advertised a capability keyword.
    #[must_use]
    pub fn supports(&self, keyword: &str) -> bool {
        self.extensions
            .iter()
            .any(|line| line.split_whitespace().next() == Some(keyword))
    }
}

/// SMTP client; the `State` parameter enforces valid command ordering.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    caps: ServerCaps,
    deadline: Duration,
    _state: PhantomData<State>,
}

impl Client<Greeted> {
    /// Reads the server greeting on a fresh stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting cannot be read before `deadline` or
    /// is not a 2xx reply (a 521 banner means the host never accepts mail).
    pub async fn greet(mut stream: SmtpStream, deadline: Duration) -> Result<Self> {
        let greeting = read_reply(&mut stream, deadline).await?;
        if !greeting.is_success() {
            return Err(Error::from_reply(greeting.code.as_u16(), greeting.text()));
        }

        let hostname = greeting
            .lines
            .first()
            .and_then(|line| line.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            stream,
            caps: ServerCaps {
                hostname,
                extensions: Vec::new(),
            },
            deadline,
            _state: PhantomData,
        })
    }

    /// Sends EHLO and records the advertised capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the greeting.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        let reply = self
            .exchange(&Command::Ehlo {
                hostname: client_hostname.to_string(),
            })
            .await?;
        if !reply.is_success() {
            return Err(Error::from_reply(reply.code.as_u16(), reply.text()));
        }

        // First EHLO line repeats the server greeting; the rest are
        // capability keywords.
        self.caps.extensions = reply.lines.iter().skip(1).cloned().collect();
        Ok(self)
    }

    /// Upgrades the connection via STARTTLS and re-issues EHLO.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if STARTTLS was not advertised, or an
    /// error if the upgrade fails.
    pub async fn starttls(mut self, hostname: &str) -> Result<Self> {
        if !self.caps.supports("STARTTLS") {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        let reply = self.exchange(&Command::StartTls).await?;
        if !reply.is_success() {
            return Err(Error::from_reply(reply.code.as_u16(), reply.text()));
        }

        self.stream = self.stream.upgrade_to_tls(hostname, self.deadline).await?;
        trace!(hostname, "connection upgraded to TLS");

        self.ehlo(hostname).await
    }

    /// Authenticates with AUTH PLAIN.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the credentials.
    pub async fn auth_plain(mut self, username: &str, password: &str) -> Result<Self> {
        let credentials = format!("\0{username}\0{password}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());

        let reply = self
            .exchange(&Command::AuthPlain {
                initial_response: encoded,
            })
            .await?;
        if !reply.is_success() {
            return Err(Error::from_reply(reply.code.as_u16(), reply.text()));
        }
        Ok(self)
    }

    /// Opens a mail transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the reverse-path.
    pub async fn mail_from(mut self, from: &Envelope) -> Result<Client<Transaction>> {
        let reply = self
            .exchange(&Command::MailFrom { from: from.clone() })
            .await?;
        if !reply.is_success() {
            return Err(Error::from_reply(reply.code.as_u16(), reply.text()));
        }
        Ok(self.transition())
    }
}

impl Client<Transaction> {
    /// Adds the first recipient.
    ///
    /// # Errors
    ///
    /// Returns an error carrying the server's reply code if the recipient is
    /// rejected.
    pub async fn rcpt_to(mut self, to: &Envelope) -> Result<Client<Accepting>> {
        let reply = self.exchange(&Command::RcptTo { to: to.clone() }).await?;
        if !reply.is_success() {
            return Err(Error::from_reply(reply.code.as_u16(), reply.text()));
        }
        Ok(self.transition())
    }

    /// Issues `RCPT TO` and hands back the raw reply instead of failing on
    /// rejection. This is the probing primitive: the caller classifies the
    /// reply via [`Reply::mailbox_status`]. A rejected RCPT leaves the
    /// transaction usable, so the state does not change.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport-level failures (timeout, closed
    /// connection, malformed reply), never for an unhappy reply code.
    pub async fn probe_rcpt(mut self, to: &Envelope) -> Result<(Self, Reply)> {
        let reply = self.exchange(&Command::RcptTo { to: to.clone() }).await?;
        Ok((self, reply))
    }

    /// Aborts the transaction with RSET.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the reset.
    pub async fn reset(mut self) -> Result<Client<Greeted>> {
        let reply = self.exchange(&Command::Rset).await?;
        if !reply.is_success() {
            return Err(Error::from_reply(reply.code.as_u16(), reply.text()));
        }
        Ok(self.transition())
    }
}

impl Client<Accepting> {
    /// Adds another recipient.
    ///
    /// # Errors
    ///
    /// Returns an error carrying the server's reply code if the recipient is
    /// rejected.
    pub async fn rcpt_to(mut self, to: &Envelope) -> Result<Self> {
        let reply = self.exchange(&Command::RcptTo { to: to.clone() }).await?;
        if !reply.is_success() {
            return Err(Error::from_reply(reply.code.as_u16(), reply.text()));
        }
        Ok(self)
    }

    /// Begins the message payload.
    ///
    /// # Errors
    ///
    /// Returns an error unless the server answers 354.
    pub async fn data(mut self) -> Result<Client<Payload>> {
        let reply = self.exchange(&Command::Data).await?;
        if !reply.code.is_intermediate() {
            return Err(Error::from_reply(reply.code.as_u16(), reply.text()));
        }
        Ok(self.transition())
    }
}

impl Client<Payload> {
    /// Transmits an RFC 5322 message and completes the transaction.
    ///
    /// Line endings are normalized to CRLF and leading dots are stuffed; the
    /// terminating `.` line is appended automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if transmission fails or the server rejects the
    /// message.
    pub async fn send_body(mut self, message: &[u8]) -> Result<Client<Greeted>> {
        let mut wire = Vec::with_capacity(message.len() + 64);
        for line in message.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                wire.push(b'.');
            }
            wire.extend_from_slice(line);
            wire.extend_from_slice(b"\r\n");
        }
        wire.extend_from_slice(b".\r\n");

        self.stream.write_all(&wire, self.deadline).await?;
        let reply = read_reply(&mut self.stream, self.deadline).await?;
        if !reply.is_success() {
            return Err(Error::from_reply(reply.code.as_u16(), reply.text()));
        }
        Ok(self.transition())
    }
}

// Common implementation for all states
impl<S> Client<S> {
    /// Returns the capabilities learned from EHLO.
    #[must_use]
    pub const fn caps(&self) -> &ServerCaps {
        &self.caps
    }

    /// Sends QUIT and closes the session (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT exchange fails.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.exchange(&Command::Quit).await?;
        if !reply.is_success() && reply.code.as_u16() != 221 {
            return Err(Error::from_reply(reply.code.as_u16(), reply.text()));
        }
        Ok(())
    }

    async fn exchange(&mut self, cmd: &Command) -> Result<Reply> {
        self.stream.write_all(&cmd.serialize(), self.deadline).await?;
        read_reply(&mut self.stream, self.deadline).await
    }

    fn transition<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            caps: self.caps,
            deadline: self.deadline,
            _state: PhantomData,
        }
    }
}

async fn read_reply(stream: &mut SmtpStream, deadline: Duration) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line(deadline).await?;
        if line.is_empty() {
            continue;
        }

        let last = is_last_line(&line);
        lines.push(line);
        if last {
            break;
        }
    }
    Reply::parse(&lines)
}
