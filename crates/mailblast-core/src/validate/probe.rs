//! Live-mailbox probing via a transient SMTP dialogue.
//!
//! The probe never delivers anything: it walks the dialogue up to `RCPT TO`
//! with a null reverse-path, reads the answer, and resets. Greylisting,
//! policy rejections, and timeouts are all expected behaviour on port 25,
//! so anything short of a definitive answer maps to
//! [`ProbeOutcome::Inconclusive`].

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use mailblast_smtp::{Client, Envelope, MailboxStatus, connect};

/// What a probe learned about a mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The best reachable exchanger accepted the recipient.
    Accepted,
    /// A server gave a definitive no-such-mailbox answer.
    NoSuchMailbox,
    /// Nothing definitive; holds a short reason.
    Inconclusive(String),
}

/// Probes whether a mailbox is likely to accept delivery. Implemented over
/// real SMTP in production and by fixed fakes in tests.
#[async_trait]
pub trait MailboxProbe: Send + Sync {
    /// Checks `local@domain` against the given exchanger hosts, best first,
    /// bounded per network operation by `timeout`.
    async fn probe(
        &self,
        local: &str,
        domain: &str,
        hosts: &[String],
        timeout: Duration,
    ) -> ProbeOutcome;
}

/// [`MailboxProbe`] speaking real SMTP on port 25.
pub struct SmtpProbe {
    /// Hostname announced in EHLO.
    helo_name: String,
    /// How many exchangers to try before giving up.
    max_hosts: usize,
}

impl SmtpProbe {
    /// Creates a probe announcing the given EHLO name.
    #[must_use]
    pub fn new(helo_name: impl Into<String>) -> Self {
        Self {
            helo_name: helo_name.into(),
            max_hosts: 2,
        }
    }

    async fn probe_host(
        &self,
        host: &str,
        target: &Envelope,
        timeout: Duration,
    ) -> Result<ProbeOutcome, mailblast_smtp::Error> {
        let stream = connect(host, 25, timeout).await?;
        let client = Client::greet(stream, timeout).await?;
        let client = client.ehlo(&self.helo_name).await?;

        // Opportunistic TLS; some exchangers insist on it before RCPT.
        let client = if client.caps().supports("STARTTLS") {
            client.starttls(host).await?
        } else {
            client
        };

        let tx = client.mail_from(&Envelope::null()).await?;
        let (tx, reply) = tx.probe_rcpt(target).await?;

        let outcome = match reply.mailbox_status() {
            MailboxStatus::Accepted => ProbeOutcome::Accepted,
            MailboxStatus::NoSuchMailbox => ProbeOutcome::NoSuchMailbox,
            MailboxStatus::Inconclusive => {
                ProbeOutcome::Inconclusive(format!("rcpt answered {}", reply.code))
            }
        };

        if let Ok(client) = tx.reset().await {
            let _ = client.quit().await;
        }
        Ok(outcome)
    }
}

#[async_trait]
impl MailboxProbe for SmtpProbe {
    async fn probe(
        &self,
        local: &str,
        domain: &str,
        hosts: &[String],
        timeout: Duration,
    ) -> ProbeOutcome {
        let Ok(target) = Envelope::new(format!("{local}@{domain}")) else {
            return ProbeOutcome::Inconclusive("address not probeable".to_string());
        };

        let mut last = ProbeOutcome::Inconclusive("no exchanger responded".to_string());
        for host in hosts.iter().take(self.max_hosts) {
            match self.probe_host(host, &target, timeout).await {
                Ok(outcome @ (ProbeOutcome::Accepted | ProbeOutcome::NoSuchMailbox)) => {
                    return outcome;
                }
                Ok(inconclusive) => last = inconclusive,
                Err(err) => {
                    debug!(host = %host, error = %err, "mailbox probe failed");
                    last = ProbeOutcome::Inconclusive(err.to_string());
                }
            }
        }
        last
    }
}
