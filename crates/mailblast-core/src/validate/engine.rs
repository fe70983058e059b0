//! The per-address validation engine.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::ValidationConfig;

use super::classify::classify;
use super::dns::{DomainRoute, MxResolver, RecordResolver};
use super::probe::{MailboxProbe, ProbeOutcome, SmtpProbe};
use super::score::{score, unknown_score, verdict_for};
use super::syntax::parse_address;
use super::verdict::{AddressVerdict, Checks, Verdict};

/// Per-call validation options.
#[derive(Debug, Clone, Copy)]
pub struct ValidateOptions {
    /// Deadline for each network operation (DNS lookup, probe exchange).
    pub timeout: Duration,
    /// Whether to run the live-mailbox probe.
    pub probe_mailbox: bool,
}

impl ValidateOptions {
    /// Options using the configured defaults.
    #[must_use]
    pub const fn from_config(config: &ValidationConfig) -> Self {
        Self {
            timeout: config.timeout,
            probe_mailbox: config.allow_probe,
        }
    }
}

/// Validates one address. The bulk orchestrator and the service layer only
/// depend on this trait, so tests can substitute counting or scripted
/// fakes.
#[async_trait]
pub trait AddressValidator: Send + Sync {
    /// Classifies an address. Infallible: network trouble degrades the
    /// verdict instead of surfacing as an error.
    async fn validate(&self, email: &str, options: &ValidateOptions) -> AddressVerdict;
}

/// Production validator: syntax → DNS route → classification → optional
/// probe → score.
pub struct Validator<R = MxResolver, P = SmtpProbe> {
    config: ValidationConfig,
    resolver: R,
    probe: P,
}

impl Validator {
    /// Creates a validator with the real resolver and prober.
    #[must_use]
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            resolver: MxResolver::new(),
            probe: SmtpProbe::new("mailblast.local"),
            config,
        }
    }
}

impl<R: RecordResolver, P: MailboxProbe> Validator<R, P> {
    /// Creates a validator over injected resolver and probe implementations.
    pub fn with_parts(config: ValidationConfig, resolver: R, probe: P) -> Self {
        Self {
            config,
            resolver,
            probe,
        }
    }

    fn definitive(&self, email: String, checks: Checks, reason: &str) -> AddressVerdict {
        AddressVerdict {
            email,
            verdict: Verdict::Invalid,
            score: 0.0,
            checks,
            reason: Some(reason.to_string()),
            provider: None,
            suggestion: None,
        }
    }
}

#[async_trait]
impl<R: RecordResolver, P: MailboxProbe> AddressValidator for Validator<R, P> {
    async fn validate(&self, email: &str, options: &ValidateOptions) -> AddressVerdict {
        // 1. Syntax — definitive failure runs no further checks.
        let Some(parsed) = parse_address(email) else {
            return self.definitive(email.trim().to_lowercase(), Checks::default(), "syntax");
        };

        let classification = classify(&parsed.local, &parsed.domain);
        let provider = classification.provider.map(str::to_string);
        let suggestion = classification.suggestion.clone();

        // 2. Domain route.
        let route = self
            .resolver
            .resolve_route(&parsed.domain, options.timeout)
            .await;

        let mut checks = Checks {
            syntax_ok: true,
            has_mx_or_a_record: route.is_resolvable(),
            is_disposable: classification.disposable,
            is_role_account: classification.role_account,
            smtp_accepts: None,
        };

        match &route {
            DomainRoute::NoRoute => {
                let mut verdict = self.definitive(parsed.email, checks, "no_mx_or_a");
                verdict.provider = provider;
                verdict.suggestion = suggestion;
                return verdict;
            }
            DomainRoute::Indeterminate(reason) => {
                debug!(domain = %parsed.domain, reason = %reason, "domain route indeterminate");
                return AddressVerdict {
                    email: parsed.email,
                    verdict: Verdict::Unknown,
                    score: unknown_score(&self.config),
                    checks,
                    reason: Some(reason.clone()),
                    provider,
                    suggestion,
                };
            }
            DomainRoute::Exchangers(_) | DomainRoute::AddressFallback => {}
        }

        // 3. Optional live probe against the resolved route.
        let mut probe_note = None;
        if options.probe_mailbox {
            let hosts = route.probe_hosts(&parsed.domain);
            match self
                .probe
                .probe(&parsed.local, &parsed.domain, &hosts, options.timeout)
                .await
            {
                ProbeOutcome::Accepted => checks.smtp_accepts = Some(true),
                ProbeOutcome::NoSuchMailbox => {
                    checks.smtp_accepts = Some(false);
                    let mut verdict =
                        self.definitive(parsed.email, checks, "mailbox_not_found");
                    verdict.provider = provider;
                    verdict.suggestion = suggestion;
                    return verdict;
                }
                ProbeOutcome::Inconclusive(note) => {
                    // Not punitive: an inconclusive probe neither adds nor
                    // removes score.
                    probe_note = Some(format!("probe_inconclusive: {note}"));
                }
            }
        }

        // 4. Score and band.
        let score = score(&checks);
        let verdict = verdict_for(score, &self.config);

        let reason = if checks.is_disposable {
            Some("disposable_domain".to_string())
        } else if checks.is_role_account {
            Some("role_account".to_string())
        } else {
            probe_note
        };

        AddressVerdict {
            email: parsed.email,
            verdict,
            score,
            checks,
            reason,
            provider,
            suggestion,
        }
    }
}
