//! HTTP transport for the transactional email provider.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{Error, Result};

use super::transport::{MailTransport, OutgoingEmail, RejectionKind, TransportError};

/// How much of a rejection body to keep in diagnostics.
const DETAIL_LIMIT: usize = 256;

/// [`MailTransport`] over the provider's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpProvider {
    /// Creates the provider transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no API key is configured or the HTTP
    /// client cannot be built.
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("PROVIDER_API_KEY is not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| Error::Config(format!("cannot build HTTP client: {err}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
            api_key,
        })
    }

    /// Classifies a 4xx rejection body.
    ///
    /// Providers phrase the unverified-sender rejection differently
    /// ("sender not verified", "unverified sender identity", ...), so the
    /// check looks for the sender/verification word pair rather than one
    /// exact message.
    #[must_use]
    pub fn classify_rejection(body: &str) -> RejectionKind {
        let body = body.to_lowercase();
        let about_sender = body.contains("sender") || body.contains("from address");
        let about_verification = body.contains("verif") || body.contains("not authorized");
        if about_sender && about_verification {
            RejectionKind::UnverifiedSender
        } else {
            RejectionKind::Other
        }
    }
}

#[async_trait]
impl MailTransport for HttpProvider {
    async fn send(&self, email: &OutgoingEmail) -> std::result::Result<(), TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(to = %email.to, %status, "provider accepted message");
            return Ok(());
        }

        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            let detail: String = body.chars().take(DETAIL_LIMIT).collect();
            return Err(TransportError::Rejected {
                kind: Self::classify_rejection(&detail),
                detail: format!("{status}: {detail}"),
            });
        }

        // Provider-side outage; worth a queue-level retry.
        Err(TransportError::Network(format!(
            "provider answered {status}"
        )))
    }
}
