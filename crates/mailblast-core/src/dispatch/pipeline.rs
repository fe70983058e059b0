//! The dispatch pipeline: load → send → fallback → terminal transition.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::{Config, ProviderConfig};
use crate::error::{Error, Result};
use crate::messages::MessageRepository;

use super::mailer::SmtpMailer;
use super::provider::HttpProvider;
use super::transport::{MailTransport, OutgoingEmail, RejectionKind, TransportError};

/// Dispatches queued messages through the configured transport.
///
/// Owns every `queued` → terminal transition; no other component mutates
/// message status.
pub struct Dispatcher {
    messages: MessageRepository,
    transport: Arc<dyn MailTransport>,
    provider: ProviderConfig,
}

impl Dispatcher {
    /// Creates a dispatcher over an explicit transport (tests inject fakes
    /// here).
    pub fn new(
        messages: MessageRepository,
        transport: Arc<dyn MailTransport>,
        provider: ProviderConfig,
    ) -> Self {
        Self {
            messages,
            transport,
            provider,
        }
    }

    /// Creates a dispatcher from configuration: the HTTP provider when an
    /// API key is present, direct SMTP submission otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the selected transport cannot be built.
    pub fn from_config(config: &Config, messages: MessageRepository) -> Result<Self> {
        let transport: Arc<dyn MailTransport> = if config.provider.api_key.is_some() {
            Arc::new(HttpProvider::new(&config.provider, config.smtp.timeout)?)
        } else {
            // No credential configured: fall back to direct SMTP rather
            // than failing the request path.
            Arc::new(SmtpMailer::new(config.smtp.clone()))
        };
        Ok(Self::new(messages, transport, config.provider.clone()))
    }

    /// One delivery attempt.
    ///
    /// Success commits `queued` → `sent`. A missing message or an
    /// already-terminal message is a handled no-op. Failure is returned to
    /// the caller *without* marking the message failed, so queue-level
    /// retry policy can decide; the caller that gives up must follow with
    /// [`Self::record_failure`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the send failed (after the one
    /// allowed sender-fallback retry), or a storage error.
    pub async fn try_dispatch(&self, message_id: i64) -> Result<()> {
        let Some(ctx) = self.messages.load_dispatch(message_id).await? else {
            debug!(message_id, "message missing, nothing to dispatch");
            return Ok(());
        };
        if ctx.message.status.is_terminal() {
            debug!(message_id, status = %ctx.message.status, "message already settled");
            return Ok(());
        }

        let email = OutgoingEmail {
            from: ctx.from_email,
            to: ctx.recipient,
            subject: ctx.subject,
            html_body: ctx.html_body,
            text_body: ctx.text_body,
            reply_to: None,
        };

        let outcome = match self.transport.send(&email).await {
            Err(TransportError::Rejected {
                kind: RejectionKind::UnverifiedSender,
                detail,
            }) => {
                // One-shot fallback: verified sender on the envelope, the
                // declared sender preserved as Reply-To.
                if let Some(verified) = self.provider.fallback_for(&email.from) {
                    info!(message_id, verified, "retrying with verified sender");
                    self.transport.send(&email.with_verified_sender(verified)).await
                } else {
                    Err(TransportError::Rejected {
                        kind: RejectionKind::UnverifiedSender,
                        detail,
                    })
                }
            }
            other => other,
        };

        match outcome {
            Ok(()) => {
                self.messages.mark_sent(message_id, Utc::now()).await?;
                info!(message_id, to = %email.to, "message sent");
                Ok(())
            }
            Err(err) => {
                warn!(message_id, error = %err, "dispatch attempt failed");
                Err(Error::Transport(err))
            }
        }
    }

    /// Commits `queued` → `failed` with a diagnostic once retries are
    /// exhausted (or were never applicable).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage update fails.
    pub async fn record_failure(&self, message_id: i64, error: &Error) -> Result<()> {
        let diagnostic = match error {
            Error::Transport(transport) => transport.diagnostic(),
            other => other.to_string(),
        };
        self.messages.mark_failed(message_id, &diagnostic).await?;
        Ok(())
    }

    /// Synchronous dispatch: one attempt, terminal on failure.
    ///
    /// This is the whole pipeline for the synchronous queue strategy: the
    /// caller observes the outcome directly, and a failed attempt leaves
    /// the message `failed`, never `queued`.
    ///
    /// # Errors
    ///
    /// Propagates the failure after recording it.
    pub async fn dispatch(&self, message_id: i64) -> Result<()> {
        match self.try_dispatch(message_id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                // Storage errors are not a dispatch outcome; everything
                // else settles the message.
                if !matches!(err, Error::Database(_)) {
                    self.record_failure(message_id, &err).await?;
                }
                Err(err)
            }
        }
    }
}
