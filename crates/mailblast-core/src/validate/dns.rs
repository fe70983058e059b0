//! DNS route resolution: does anything accept mail for this domain?

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use trust_dns_resolver::TokioAsyncResolver;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::ResolveErrorKind;

/// Outcome of resolving a domain's mail route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainRoute {
    /// Mail exchangers, sorted by preference.
    Exchangers(Vec<String>),
    /// No MX records, but the domain itself has an address record; RFC 5321
    /// implicit-MX fallback applies.
    AddressFallback,
    /// Neither MX nor address records exist — definitive no route.
    NoRoute,
    /// The lookup could not complete (timeout, server failure); holds the
    /// reason.
    Indeterminate(String),
}

impl DomainRoute {
    /// Returns true when mail can plausibly be routed to the domain.
    #[must_use]
    pub const fn is_resolvable(&self) -> bool {
        matches!(self, Self::Exchangers(_) | Self::AddressFallback)
    }

    /// Hosts a probe should try, best first.
    #[must_use]
    pub fn probe_hosts(&self, domain: &str) -> Vec<String> {
        match self {
            Self::Exchangers(hosts) => hosts.clone(),
            Self::AddressFallback => vec![domain.to_string()],
            Self::NoRoute | Self::Indeterminate(_) => Vec::new(),
        }
    }
}

/// Resolves a domain's mail route. Implemented over a real resolver in
/// production and by fixed fakes in tests.
#[async_trait]
pub trait RecordResolver: Send + Sync {
    /// Looks up MX records with A/AAAA fallback, bounded by `timeout`.
    async fn resolve_route(&self, domain: &str, timeout: Duration) -> DomainRoute;
}

/// [`RecordResolver`] backed by the system's DNS configuration.
pub struct MxResolver {
    resolver: TokioAsyncResolver,
}

impl MxResolver {
    /// Creates a resolver with default upstream configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }
}

impl Default for MxResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordResolver for MxResolver {
    async fn resolve_route(&self, domain: &str, timeout: Duration) -> DomainRoute {
        match tokio::time::timeout(timeout, self.resolver.mx_lookup(domain)).await {
            Ok(Ok(lookup)) => {
                let mut records: Vec<(u16, String)> = lookup
                    .iter()
                    .map(|mx| {
                        let host = mx.exchange().to_utf8();
                        (mx.preference(), host.trim_end_matches('.').to_string())
                    })
                    .collect();
                if records.is_empty() {
                    return self.address_fallback(domain, timeout).await;
                }
                records.sort_by_key(|(preference, _)| *preference);
                DomainRoute::Exchangers(records.into_iter().map(|(_, host)| host).collect())
            }
            Ok(Err(err)) => match err.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => {
                    self.address_fallback(domain, timeout).await
                }
                ResolveErrorKind::Timeout => DomainRoute::Indeterminate("dns timeout".to_string()),
                other => {
                    debug!(domain, error = %other, "MX lookup failed");
                    DomainRoute::Indeterminate(other.to_string())
                }
            },
            Err(_) => DomainRoute::Indeterminate("dns timeout".to_string()),
        }
    }
}

impl MxResolver {
    async fn address_fallback(&self, domain: &str, timeout: Duration) -> DomainRoute {
        match tokio::time::timeout(timeout, self.resolver.lookup_ip(domain)).await {
            Ok(Ok(lookup)) => {
                if lookup.iter().next().is_some() {
                    DomainRoute::AddressFallback
                } else {
                    DomainRoute::NoRoute
                }
            }
            Ok(Err(err)) => match err.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => DomainRoute::NoRoute,
                ResolveErrorKind::Timeout => DomainRoute::Indeterminate("dns timeout".to_string()),
                other => DomainRoute::Indeterminate(other.to_string()),
            },
            Err(_) => DomainRoute::Indeterminate("dns timeout".to_string()),
        }
    }
}
