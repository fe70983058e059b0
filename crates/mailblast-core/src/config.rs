//! Engine configuration.
//!
//! All tunables are loaded once from the environment into an immutable
//! [`Config`] passed by reference into each component. Components never read
//! the process environment themselves, which keeps them testable with
//! injected configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Security/encryption mode for SMTP submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Security {
    /// Plain connection, no upgrade.
    None,
    /// Implicit TLS (connect directly with TLS, port 465).
    Tls,
    /// STARTTLS upgrade after plaintext connect (port 587).
    #[default]
    StartTls,
}

/// Transactional email provider region; selects the API base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProviderRegion {
    /// United States endpoint.
    #[default]
    Us,
    /// European Union endpoint.
    Eu,
}

impl ProviderRegion {
    /// Base URL of the message submission endpoint for this region.
    #[must_use]
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Us => "https://api.mailrelay.example/v1/messages",
            Self::Eu => "https://api.eu.mailrelay.example/v1/messages",
        }
    }
}

impl FromStr for ProviderRegion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "us" => Ok(Self::Us),
            "eu" => Ok(Self::Eu),
            other => Err(Error::Config(format!("unknown provider region: {other}"))),
        }
    }
}

/// Transactional email provider settings.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    /// API key; `None` means no provider is configured and dispatch falls
    /// back to direct SMTP submission.
    pub api_key: Option<String>,
    /// Region selector for the API endpoint.
    pub region: ProviderRegion,
    /// Explicit endpoint override; takes precedence over `region`.
    pub base_url: Option<String>,
    /// Pre-verified sender identity used for the one-shot fallback when the
    /// provider rejects an unverified campaign sender.
    pub fallback_sender: Option<String>,
    /// Whether the verified-sender fallback is enabled.
    pub fallback_enabled: bool,
}

impl ProviderConfig {
    /// Resolved submission endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.region.base_url().to_string())
    }

    /// The verified sender to retry with, if the fallback applies to the
    /// given declared sender.
    #[must_use]
    pub fn fallback_for(&self, declared_sender: &str) -> Option<&str> {
        if !self.fallback_enabled {
            return None;
        }
        self.fallback_sender
            .as_deref()
            .filter(|verified| !verified.eq_ignore_ascii_case(declared_sender))
    }
}

/// SMTP submission settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Username for AUTH PLAIN; empty disables authentication.
    pub username: String,
    /// Password for AUTH PLAIN.
    pub password: String,
    /// Security mode.
    pub security: Security,
    /// Per-operation network deadline.
    pub timeout: Duration,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            security: Security::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Validation pipeline settings.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Default per-address network timeout.
    pub timeout: Duration,
    /// Default bulk concurrency limit.
    pub concurrency: usize,
    /// Default policy for the live-mailbox probe.
    pub allow_probe: bool,
    /// Score at or above which an address is `valid`.
    pub score_high: f64,
    /// Score below which an address is `invalid`.
    pub score_low: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(6),
            concurrency: 20,
            allow_probe: false,
            score_high: 0.75,
            score_low: 0.35,
        }
    }
}

/// Dispatch queue and retry policy.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Whether the background worker strategy is enabled; `false` means
    /// dispatch runs synchronously in the caller's path.
    pub enabled: bool,
    /// Bounded queue depth for the worker strategy.
    pub depth: usize,
    /// Maximum delivery attempts per message.
    pub max_attempts: u32,
    /// Base delay for exponential backoff between attempts.
    pub retry_base: Duration,
    /// Cap on the backoff delay.
    pub retry_cap: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            depth: 256,
            max_attempts: 3,
            retry_base: Duration::from_secs(10),
            retry_cap: Duration::from_secs(300),
        }
    }
}

/// Immutable engine configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Transactional provider settings.
    pub provider: ProviderConfig,
    /// SMTP submission settings.
    pub smtp: SmtpConfig,
    /// Validation defaults.
    pub validation: ValidationConfig,
    /// Dispatch queue policy.
    pub queue: QueueConfig,
    /// SQLite database path.
    pub database_path: String,
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// Unset variables take their documented defaults; set-but-unparsable
    /// numeric variables are a configuration error rather than a silent
    /// fallback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for unparsable values or inconsistent
    /// thresholds.
    pub fn from_env() -> Result<Self> {
        let smtp_use_ssl = env_flag("SMTP_USE_SSL");
        let smtp_use_tls = env_flag("SMTP_USE_TLS");
        let security = if smtp_use_ssl {
            Security::Tls
        } else if smtp_use_tls {
            Security::StartTls
        } else {
            Security::None
        };

        let config = Self {
            provider: ProviderConfig {
                api_key: env_opt("PROVIDER_API_KEY"),
                region: env_opt("PROVIDER_REGION")
                    .map(|raw| raw.parse())
                    .transpose()?
                    .unwrap_or_default(),
                base_url: env_opt("PROVIDER_BASE_URL"),
                fallback_sender: env_opt("FALLBACK_SENDER"),
                fallback_enabled: env_flag("FALLBACK_SENDER_ENABLED"),
            },
            smtp: SmtpConfig {
                host: env_or("SMTP_HOST", "localhost"),
                port: env_parse("SMTP_PORT", 587)?,
                username: env_or("SMTP_USERNAME", ""),
                password: env_or("SMTP_PASSWORD", ""),
                security,
                timeout: Duration::from_secs_f64(env_parse("SMTP_TIMEOUT", 30.0)?),
            },
            validation: ValidationConfig {
                timeout: Duration::from_secs_f64(env_parse("VALIDATION_TIMEOUT", 6.0)?),
                concurrency: env_parse("VALIDATION_CONCURRENCY", 20)?,
                allow_probe: env_flag("ALLOW_SMTP_PROBE"),
                score_high: env_parse("SCORE_HIGH_THRESHOLD", 0.75)?,
                score_low: env_parse("SCORE_LOW_THRESHOLD", 0.35)?,
            },
            queue: QueueConfig {
                enabled: env_flag("DISPATCH_QUEUE"),
                depth: env_parse("DISPATCH_QUEUE_DEPTH", 256)?,
                max_attempts: env_parse("DISPATCH_MAX_ATTEMPTS", 3)?,
                retry_base: Duration::from_secs(env_parse("DISPATCH_RETRY_BASE_SECS", 10)?),
                retry_cap: Duration::from_secs(env_parse("DISPATCH_RETRY_CAP_SECS", 300)?),
            },
            database_path: env_or("DATABASE_PATH", "mailblast.db"),
        };

        config.check()?;
        Ok(config)
    }

    /// Validates cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the thresholds are out of order or a
    /// bound is zero.
    pub fn check(&self) -> Result<()> {
        let v = &self.validation;
        if !(0.0..=1.0).contains(&v.score_low) || !(0.0..=1.0).contains(&v.score_high) {
            return Err(Error::Config("score thresholds must be within 0..=1".into()));
        }
        if v.score_low >= v.score_high {
            return Err(Error::Config(
                "SCORE_LOW_THRESHOLD must be below SCORE_HIGH_THRESHOLD".into(),
            ));
        }
        if v.concurrency == 0 {
            return Err(Error::Config("VALIDATION_CONCURRENCY must be positive".into()));
        }
        if self.queue.max_attempts == 0 {
            return Err(Error::Config("DISPATCH_MAX_ATTEMPTS must be positive".into()));
        }
        Ok(())
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_flag(key: &str) -> bool {
    env_opt(key).is_some_and(|value| value.eq_ignore_ascii_case("true") || value == "1")
}

fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env_opt(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("unparsable value for {key}: {raw}"))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_consistent() {
        let config = Config::default();
        assert!(config.check().is_ok());
        assert!(!config.queue.enabled);
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn region_selects_endpoint() {
        let mut provider = ProviderConfig::default();
        assert!(provider.endpoint().contains("api.mailrelay"));
        provider.region = ProviderRegion::Eu;
        assert!(provider.endpoint().contains("api.eu."));
        provider.base_url = Some("http://localhost:9100/send".to_string());
        assert_eq!(provider.endpoint(), "http://localhost:9100/send");
    }

    #[test]
    fn fallback_requires_flag_and_distinct_sender() {
        let provider = ProviderConfig {
            fallback_sender: Some("verified@example.com".to_string()),
            fallback_enabled: true,
            ..ProviderConfig::default()
        };
        assert_eq!(
            provider.fallback_for("news@example.com"),
            Some("verified@example.com")
        );
        // Same sender: nothing to fall back to.
        assert_eq!(provider.fallback_for("Verified@Example.com"), None);

        let disabled = ProviderConfig {
            fallback_enabled: false,
            ..provider
        };
        assert_eq!(disabled.fallback_for("news@example.com"), None);
    }

    #[test]
    fn threshold_order_is_enforced() {
        let mut config = Config::default();
        config.validation.score_low = 0.9;
        assert!(config.check().is_err());
    }

    #[test]
    fn region_parse() {
        assert_eq!("us".parse::<ProviderRegion>().unwrap(), ProviderRegion::Us);
        assert_eq!("EU".parse::<ProviderRegion>().unwrap(), ProviderRegion::Eu);
        assert!("mars".parse::<ProviderRegion>().is_err());
    }
}
