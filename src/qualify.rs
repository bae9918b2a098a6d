//! Email qualification — the gate in front of the final funnel step.
//!
//! Three ordered stages, short-circuiting on first failure:
//! 1. syntax shape (local part at least 2 chars),
//! 2. disposable-domain deny-list,
//! 3. live MX lookup, falling back to any address record.
//!
//! Stage 3 is a real network round trip, so it hides behind the
//! [`DomainReachability`] capability — production uses DNS, tests inject a
//! stub. Every lookup failure degrades to "not qualified"; the qualifier
//! never surfaces a network error to the caller.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use regex::Regex;
use tracing::{debug, warn};

/// Known disposable-email providers. Matched case-insensitively against the
/// domain part.
const DISPOSABLE_DOMAINS: &[&str] = &[
    "mailinator.com",
    "tempmail.com",
    "guerrillamail.com",
    "10minutemail.com",
    "yopmail.com",
    "trashmail.com",
    "getairmail.com",
    "sharklasers.com",
];

// Local part of 2+ chars, one @, dotted domain. Deliberately loose beyond
// that — the reachability probe does the real work.
static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]{2,}@[^@\s]+\.[^@\s]+$").unwrap());

/// Can this domain receive mail? Answered with a DNS lookup in production,
/// a canned answer in tests.
#[async_trait]
pub trait DomainReachability: Send + Sync {
    /// True if the domain has an MX record, or failing that, any address
    /// record. Must not error: lookup failures and timeouts are `false`.
    async fn accepts_mail(&self, domain: &str) -> bool;
}

/// DNS-backed reachability check with a per-lookup timeout.
pub struct DnsReachability {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl DnsReachability {
    /// Build a resolver using the system's default upstream servers.
    pub fn new(timeout: Duration) -> Self {
        let resolver =
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
        Self { resolver, timeout }
    }
}

#[async_trait]
impl DomainReachability for DnsReachability {
    async fn accepts_mail(&self, domain: &str) -> bool {
        let mx = tokio::time::timeout(self.timeout, self.resolver.mx_lookup(domain)).await;
        match mx {
            Ok(Ok(records)) if records.iter().next().is_some() => return true,
            Ok(_) => {} // no MX — fall through to the address-record check
            Err(_) => {
                warn!(domain, "MX lookup timed out");
                return false;
            }
        }

        match tokio::time::timeout(self.timeout, self.resolver.lookup_ip(domain)).await {
            Ok(Ok(addrs)) => addrs.iter().next().is_some(),
            Ok(Err(e)) => {
                debug!(domain, error = %e, "address lookup failed");
                false
            }
            Err(_) => {
                warn!(domain, "address lookup timed out");
                false
            }
        }
    }
}

/// The full three-stage qualification gate.
pub struct EmailQualifier {
    reachability: Arc<dyn DomainReachability>,
}

impl EmailQualifier {
    pub fn new(reachability: Arc<dyn DomainReachability>) -> Self {
        Self { reachability }
    }

    /// Apply all three stages to a candidate address.
    pub async fn qualify(&self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        if !EMAIL_SHAPE.is_match(candidate) {
            debug!(candidate, "email rejected: bad shape");
            return false;
        }

        // Shape regex guarantees exactly one '@' with a non-empty domain.
        let domain = candidate
            .rsplit_once('@')
            .map(|(_, d)| d.to_ascii_lowercase())
            .unwrap_or_default();

        if DISPOSABLE_DOMAINS.contains(&domain.as_str()) {
            debug!(candidate, %domain, "email rejected: disposable domain");
            return false;
        }

        if !self.reachability.accepts_mail(&domain).await {
            debug!(candidate, %domain, "email rejected: domain unreachable");
            return false;
        }

        true
    }
}


#[cfg(test)]
mod tests {
    use super::stub::StubReachability;
    use super::*;

    fn qualifier(reachable: bool) -> EmailQualifier {
        EmailQualifier::new(Arc::new(StubReachability { reachable }))
    }

    #[tokio::test]
    async fn accepts_well_formed_reachable_address() {
        let q = qualifier(true);
        assert!(q.qualify("owner@example.com").await);
        assert!(q.qualify("  owner@example.com  ").await, "trims whitespace");
    }

    #[tokio::test]
    async fn rejects_bad_shapes() {
        let q = qualifier(true);
        assert!(!q.qualify("a@").await);
        assert!(!q.qualify("ab@bad").await, "domain needs a dot");
        assert!(!q.qualify("not-an-email").await);
        assert!(!q.qualify("a@b@c.com").await);
        assert!(!q.qualify("").await);
    }

    #[tokio::test]
    async fn rejects_short_local_part() {
        let q = qualifier(true);
        // One-char local part fails stage 1 even with a fine domain.
        assert!(!q.qualify("a@example.com").await);
        assert!(q.qualify("ab@example.com").await);
    }

    #[tokio::test]
    async fn rejects_disposable_domains() {
        let q = qualifier(true);
        assert!(!q.qualify("someone@mailinator.com").await);
        assert!(!q.qualify("someone@MAILINATOR.COM").await, "case-insensitive");
        assert!(!q.qualify("someone@yopmail.com").await);
    }

    #[tokio::test]
    async fn fails_closed_on_unreachable_domain() {
        let q = qualifier(false);
        assert!(!q.qualify("owner@example.com").await);
    }
}
