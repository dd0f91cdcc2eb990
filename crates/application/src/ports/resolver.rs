use async_trait::async_trait;
use std::net::IpAddr;

use surveyor_domain::errors::EngineError;
use surveyor_domain::record_type::RecordType;

/// Queue-jump priority for a dispatched query (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Low,
}

/// A single answer record returned by a successful query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Addr(IpAddr),
    Name(String),
}

/// Outcome of `ResolverPool::query` (§4.3): resolvers never surface
/// transient errors to callers, only these three terminal states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Answer(Vec<Answer>),
    NxDomain,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WildcardType {
    None,
    Static,
    Dynamic,
}

/// The `ResolverPool` port (§4.3). The concrete implementation owns resolver
/// state, rate limiting, scoring, retries, and wire encoding; this trait is
/// the capability surface the scheduler dispatches queries through.
#[async_trait]
pub trait ResolverPool: Send + Sync {
    async fn query(
        &self,
        name: &str,
        record_type: RecordType,
        priority: Priority,
    ) -> Result<QueryOutcome, EngineError>;

    /// Walks labels left-to-right issuing SOA lookups until authority is
    /// found (§4.3 `firstProperSubdomain`).
    async fn first_proper_subdomain(&self, name: &str) -> Result<Option<String>, EngineError>;

    /// Classifies a domain's wildcard behavior, caching the result with a
    /// TTL (§4.3 `wildcardType`).
    async fn wildcard_type(&self, domain: &str) -> Result<WildcardType, EngineError>;

    /// `Some(addrs)` when `domain` is a known `static` wildcard, for the
    /// scheduler's per-name address-set comparison (§4.6 stage 3).
    async fn wildcard_addresses(&self, domain: &str) -> Option<Vec<IpAddr>>;
}
