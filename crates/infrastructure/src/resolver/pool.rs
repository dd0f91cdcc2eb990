use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use surveyor_application::ports::resolver::{Answer, Priority, QueryOutcome, ResolverPool as ResolverPoolPort, WildcardType};
use surveyor_domain::errors::EngineError;
use surveyor_domain::record_type::RecordType;

use super::state::ResolverState;
use super::transport;
use super::wildcard::WildcardCache;

const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_millis(100);
const QUERY_TIMEOUT: Duration = Duration::from_secs(3);
const WILDCARD_PROBE_COUNT: usize = 3;

/// The `ResolverPool` port implementation (§4.3): a fleet of recursive
/// resolvers selected by score-weighted round robin, each individually rate
/// limited, with retry/backoff on transient failure and a per-domain
/// wildcard classification cache.
pub struct Pool {
    resolvers: Vec<Arc<ResolverState>>,
    wildcards: WildcardCache,
}

impl Pool {
    pub fn new(addresses: Vec<SocketAddr>, qps_per_resolver: u32) -> Result<Self, EngineError> {
        if addresses.is_empty() {
            return Err(EngineError::NoResolversAvailable);
        }
        Ok(Self {
            resolvers: addresses
                .into_iter()
                .map(|addr| Arc::new(ResolverState::new(addr, qps_per_resolver)))
                .collect(),
            wildcards: WildcardCache::new(),
        })
    }

    /// Weighted round robin biased by score and inverse load (§4.3): each
    /// in-service resolver's weight is its score, quarantined resolvers are
    /// excluded unless every resolver is quarantined (in which case we fall
    /// back to the least-bad one so a run can still make forward progress).
    fn select(&self) -> Option<Arc<ResolverState>> {
        let in_service: Vec<&Arc<ResolverState>> = self
            .resolvers
            .iter()
            .filter(|r| !r.is_quarantined())
            .collect();

        let candidates: Vec<&Arc<ResolverState>> = if in_service.is_empty() {
            self.resolvers.iter().collect()
        } else {
            in_service
        };

        if candidates.is_empty() {
            return None;
        }

        let total: u32 = candidates.iter().map(|r| r.score().max(1)).sum();
        let mut pick = fastrand::u32(..total.max(1));
        for r in &candidates {
            let weight = r.score().max(1);
            if pick < weight {
                return Some((*r).clone());
            }
            pick -= weight;
        }
        candidates.last().map(|r| (*r).clone())
    }

    async fn query_once(
        &self,
        resolver: &ResolverState,
        name: &str,
        record_type: RecordType,
    ) -> Result<crate::wire::DecodedResponse, EngineError> {
        resolver.acquire_slot().await;
        let start = std::time::Instant::now();
        let result = transport::query(resolver.address, name, record_type, QUERY_TIMEOUT).await;
        match &result {
            Ok(resp) if resp.is_server_error() => resolver.record_servfail(),
            Ok(_) => resolver.record_success(start.elapsed()),
            Err(EngineError::QueryTimeout) => resolver.record_timeout(),
            Err(_) => resolver.record_refused(),
        }
        result
    }
}

#[async_trait]
impl ResolverPoolPort for Pool {
    async fn query(
        &self,
        name: &str,
        record_type: RecordType,
        priority: Priority,
    ) -> Result<QueryOutcome, EngineError> {
        let mut attempt = 0;
        loop {
            let Some(resolver) = self.select() else {
                return Err(EngineError::NoResolversAvailable);
            };

            match self.query_once(&resolver, name, record_type).await {
                Ok(resp) if resp.is_nxdomain() => return Ok(QueryOutcome::NxDomain),
                Ok(resp) if resp.is_server_error() => {
                    if attempt >= MAX_RETRIES {
                        return Ok(QueryOutcome::Exhausted);
                    }
                }
                Ok(resp) => {
                    let mut answers: Vec<Answer> =
                        resp.addresses.iter().map(|a| Answer::Addr(*a)).collect();
                    answers.extend(resp.cnames.iter().cloned().map(Answer::Name));
                    answers.extend(resp.names.iter().cloned().map(Answer::Name));
                    return Ok(QueryOutcome::Answer(answers));
                }
                Err(EngineError::QueryTimeout) => {
                    if attempt >= MAX_RETRIES {
                        return Ok(QueryOutcome::Exhausted);
                    }
                }
                Err(e) => {
                    warn!(%name, error = %e, "resolver query failed");
                    if attempt >= MAX_RETRIES {
                        return Ok(QueryOutcome::Exhausted);
                    }
                }
            }

            let backoff = BASE_BACKOFF * 2u32.pow(attempt);
            debug!(%name, attempt, priority = ?priority, ?backoff, "retrying query");
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }

    async fn first_proper_subdomain(&self, name: &str) -> Result<Option<String>, EngineError> {
        let labels: Vec<&str> = name.split('.').filter(|l| !l.is_empty()).collect();
        for i in 0..labels.len() {
            let candidate = labels[i..].join(".");
            match self.query(&candidate, RecordType::Soa, Priority::High).await? {
                QueryOutcome::Answer(_) => return Ok(Some(candidate)),
                QueryOutcome::NxDomain | QueryOutcome::Exhausted => continue,
            }
        }
        Ok(None)
    }

    async fn wildcard_type(&self, domain: &str) -> Result<WildcardType, EngineError> {
        if let Some((kind, _)) = self.wildcards.get(domain) {
            return Ok(kind);
        }

        let mut address_sets: Vec<Vec<IpAddr>> = Vec::new();
        for _ in 0..WILDCARD_PROBE_COUNT {
            let label = format!("{}-wc-probe.{domain}", random_label());
            match self.query(&label, RecordType::A, Priority::High).await? {
                QueryOutcome::Answer(answers) => {
                    let addrs: Vec<IpAddr> = answers
                        .into_iter()
                        .filter_map(|a| match a {
                            Answer::Addr(ip) => Some(ip),
                            Answer::Name(_) => None,
                        })
                        .collect();
                    if !addrs.is_empty() {
                        address_sets.push(addrs);
                    }
                }
                QueryOutcome::NxDomain | QueryOutcome::Exhausted => {}
            }
        }

        let kind = if address_sets.is_empty() {
            WildcardType::None
        } else if address_sets
            .windows(2)
            .all(|w| same_address_set(&w[0], &w[1]))
        {
            WildcardType::Static
        } else {
            WildcardType::Dynamic
        };

        let representative = address_sets.first().cloned().unwrap_or_default();
        self.wildcards.insert(domain, kind, representative);
        Ok(kind)
    }

    async fn wildcard_addresses(&self, domain: &str) -> Option<Vec<IpAddr>> {
        match self.wildcards.get(domain) {
            Some((WildcardType::Static, addrs)) => Some(addrs),
            _ => None,
        }
    }
}

fn random_label() -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    (0..10)
        .map(|_| ALPHABET[fastrand::usize(..ALPHABET.len())] as char)
        .collect()
}

fn same_address_set(a: &[IpAddr], b: &[IpAddr]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_returns_none_for_empty_pool() {
        let pool = Pool {
            resolvers: Vec::new(),
            wildcards: WildcardCache::new(),
        };
        assert!(pool.select().is_none());
    }

    #[test]
    fn same_address_set_ignores_order() {
        let a = vec!["1.1.1.1".parse().unwrap(), "2.2.2.2".parse().unwrap()];
        let b = vec!["2.2.2.2".parse().unwrap(), "1.1.1.1".parse().unwrap()];
        assert!(same_address_set(&a, &b));
    }
}
