//! Direct SMTP submission transport, used when no provider API key is
//! configured.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use mailblast_smtp::{Client, Envelope, Greeted, SmtpStream, connect, connect_tls};

use crate::config::{Security, SmtpConfig};

use super::transport::{MailTransport, OutgoingEmail, TransportError};

/// Hostname announced in EHLO.
const EHLO_NAME: &str = "localhost";

/// [`MailTransport`] submitting directly over SMTP.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    /// Creates the SMTP transport.
    #[must_use]
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    async fn session(&self) -> Result<Client<Greeted>, mailblast_smtp::Error> {
        let SmtpConfig {
            host,
            port,
            security,
            timeout,
            ..
        } = &self.config;

        let stream: SmtpStream = match security {
            Security::Tls => connect_tls(host, *port, *timeout).await?,
            Security::StartTls | Security::None => connect(host, *port, *timeout).await?,
        };

        let client = Client::greet(stream, *timeout).await?;
        let client = client.ehlo(EHLO_NAME).await?;

        let client = if *security == Security::StartTls {
            client.starttls(host).await?
        } else {
            client
        };

        if self.config.username.is_empty() {
            Ok(client)
        } else {
            client
                .auth_plain(&self.config.username, &self.config.password)
                .await
        }
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), TransportError> {
        let from = Envelope::new(email.from.clone())?;
        let to = Envelope::new(email.to.clone())?;

        let client = self.session().await?;
        let tx = client.mail_from(&from).await?;

        // A refused recipient is a send failure even though the session
        // itself stays healthy.
        let accepting = match tx.rcpt_to(&to).await {
            Ok(accepting) => accepting,
            Err(err @ mailblast_smtp::Error::Smtp { .. }) => {
                debug!(to = %email.to, error = %err, "recipient refused");
                return Err(TransportError::Recipients(vec![(
                    email.to.clone(),
                    err.to_string(),
                )]));
            }
            Err(err) => return Err(err.into()),
        };

        let payload = build_rfc5322(email);
        let client = accepting.data().await?.send_body(payload.as_bytes()).await?;
        let _ = client.quit().await;

        info!(to = %email.to, host = %self.config.host, "message submitted over SMTP");
        Ok(())
    }
}

/// Assembles the RFC 5322 message: multipart/alternative when both bodies
/// are present, a single part otherwise.
fn build_rfc5322(email: &OutgoingEmail) -> String {
    use std::fmt::Write;

    let mut message = String::new();
    let _ = write!(message, "From: {}\r\n", email.from);
    let _ = write!(message, "To: {}\r\n", email.to);
    if let Some(reply_to) = &email.reply_to {
        let _ = write!(message, "Reply-To: {reply_to}\r\n");
    }
    let _ = write!(message, "Subject: {}\r\n", email.subject);
    let _ = write!(message, "Date: {}\r\n", Utc::now().to_rfc2822());
    message.push_str("MIME-Version: 1.0\r\n");

    match (&email.text_body, &email.html_body) {
        (Some(text), Some(html)) => {
            let boundary = boundary_for(email);
            let _ = write!(
                message,
                "Content-Type: multipart/alternative; boundary=\"{boundary}\"\r\n\r\n"
            );
            let _ = write!(
                message,
                "--{boundary}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{text}\r\n"
            );
            let _ = write!(
                message,
                "--{boundary}\r\nContent-Type: text/html; charset=utf-8\r\n\r\n{html}\r\n"
            );
            let _ = write!(message, "--{boundary}--\r\n");
        }
        (None, Some(html)) => {
            let _ = write!(
                message,
                "Content-Type: text/html; charset=utf-8\r\n\r\n{html}\r\n"
            );
        }
        (Some(text), None) => {
            let _ = write!(
                message,
                "Content-Type: text/plain; charset=utf-8\r\n\r\n{text}\r\n"
            );
        }
        (None, None) => {
            message.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n(no content)\r\n");
        }
    }

    message
}

/// Deterministic multipart boundary unlikely to collide with body content.
fn boundary_for(email: &OutgoingEmail) -> String {
    let mut hasher = DefaultHasher::new();
    email.to.hash(&mut hasher);
    email.subject.hash(&mut hasher);
    email.text_body.hash(&mut hasher);
    email.html_body.hash(&mut hasher);
    format!("=_mailblast_{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(text: Option<&str>, html: Option<&str>) -> OutgoingEmail {
        OutgoingEmail {
            from: "news@example.com".to_string(),
            to: "alice@example.org".to_string(),
            subject: "Hello".to_string(),
            html_body: html.map(str::to_string),
            text_body: text.map(str::to_string),
            reply_to: None,
        }
    }

    #[test]
    fn single_part_message_has_plain_content_type() {
        let message = build_rfc5322(&email(Some("hi there"), None));
        assert!(message.starts_with("From: news@example.com\r\n"));
        assert!(message.contains("To: alice@example.org\r\n"));
        assert!(message.contains("Content-Type: text/plain; charset=utf-8"));
        assert!(message.contains("hi there"));
        assert!(!message.contains("multipart"));
    }

    #[test]
    fn both_bodies_build_multipart_alternative() {
        let message = build_rfc5322(&email(Some("plain"), Some("<p>rich</p>")));
        assert!(message.contains("multipart/alternative"));
        let boundary = boundary_for(&email(Some("plain"), Some("<p>rich</p>")));
        // Text part first, closing marker last.
        let text_at = message.find("plain").unwrap_or(usize::MAX);
        let html_at = message.find("<p>rich</p>").unwrap_or(0);
        assert!(text_at < html_at);
        assert!(message.trim_end().ends_with(&format!("--{boundary}--")));
    }

    #[test]
    fn reply_to_header_is_emitted_when_set() {
        let mut mail = email(Some("hi"), None);
        mail.reply_to = Some("declared@example.com".to_string());
        let message = build_rfc5322(&mail);
        assert!(message.contains("Reply-To: declared@example.com\r\n"));
    }

    #[test]
    fn empty_message_gets_placeholder_body() {
        let message = build_rfc5322(&email(None, None));
        assert!(message.contains("(no content)"));
    }

    #[test]
    fn boundary_is_deterministic_per_message() {
        let a = boundary_for(&email(Some("x"), Some("y")));
        let b = boundary_for(&email(Some("x"), Some("y")));
        let c = boundary_for(&email(Some("x"), Some("z")));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
