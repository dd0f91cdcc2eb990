use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use surveyor_application::ports::WildcardType;

const WILDCARD_CACHE_TTL: Duration = Duration::from_secs(3600);

struct Entry {
    kind: WildcardType,
    addresses: Vec<IpAddr>,
    cached_at: Instant,
}

/// Per-domain wildcard classification cache (§4.3 `wildcardType`), shaped
/// like the teacher's `DnsCache`: a `DashMap` keyed by name with an explicit
/// TTL checked on read rather than a background sweep.
pub struct WildcardCache {
    entries: DashMap<String, Entry, FxBuildHasher>,
}

impl WildcardCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(FxBuildHasher),
        }
    }

    pub fn get(&self, domain: &str) -> Option<(WildcardType, Vec<IpAddr>)> {
        let entry = self.entries.get(domain)?;
        if entry.cached_at.elapsed() > WILDCARD_CACHE_TTL {
            drop(entry);
            self.entries.remove(domain);
            return None;
        }
        Some((entry.kind, entry.addresses.clone()))
    }

    pub fn insert(&self, domain: &str, kind: WildcardType, addresses: Vec<IpAddr>) {
        self.entries.insert(
            domain.to_string(),
            Entry {
                kind,
                addresses,
                cached_at: Instant::now(),
            },
        );
    }
}

impl Default for WildcardCache {
    fn default() -> Self {
        Self::new()
    }
}
