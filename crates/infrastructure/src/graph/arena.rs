use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use uuid::Uuid;

use surveyor_domain::nodes::{Address, AutonomousSystem, Event, Fqdn, Netblock, NodeId, Source};

/// The payload an arena slot carries (§9 "store nodes in an arena keyed by
/// identifier; edges reference identifiers only").
pub enum NodeKind {
    Fqdn(Fqdn),
    Address(Address),
    Netblock(Netblock),
    Asn(AutonomousSystem),
    Source(Source),
    Event(Event),
}

pub struct NodeRecord {
    pub kind: NodeKind,
    pub edges: Vec<(super::store::EdgeLabel, NodeId)>,
}

/// `DashMap`-sharded node arena, grounded on the teacher's
/// `DnsCache<Key, Record, FxBuildHasher>` construction (§4.7). Identity
/// indices (FQDN name, address value, event uuid, source name) live
/// alongside the arena so upserts can find their target in O(1) without
/// scanning.
pub struct Arena {
    pub nodes: DashMap<NodeId, NodeRecord, FxBuildHasher>,
    next_id: AtomicU64,
    pub fqdn_index: DashMap<String, NodeId, FxBuildHasher>,
    pub addr_index: DashMap<IpAddr, NodeId, FxBuildHasher>,
    pub event_index: DashMap<Uuid, NodeId, FxBuildHasher>,
    pub source_index: DashMap<String, NodeId, FxBuildHasher>,
}

impl Arena {
    pub fn new() -> Self {
        Self {
            nodes: DashMap::with_hasher(FxBuildHasher),
            next_id: AtomicU64::new(1),
            fqdn_index: DashMap::with_hasher(FxBuildHasher),
            addr_index: DashMap::with_hasher(FxBuildHasher),
            event_index: DashMap::with_hasher(FxBuildHasher),
            source_index: DashMap::with_hasher(FxBuildHasher),
        }
    }

    pub fn alloc(&self, kind: NodeKind) -> NodeId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.nodes.insert(id, NodeRecord { kind, edges: Vec::new() });
        id
    }

    pub fn event_timestamps(&self, id: NodeId) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let record = self.nodes.get(&id)?;
        match &record.kind {
            NodeKind::Event(e) => Some((e.start, e.finish)),
            _ => None,
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}
