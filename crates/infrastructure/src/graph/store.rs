use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Mutex;
use uuid::Uuid;

use surveyor_application::ports::asn_cache::AsnCache;
use surveyor_application::ports::graph::{AddressUpsert, Graph};
use surveyor_domain::errors::EngineError;
use surveyor_domain::nodes::{
    Address, AutonomousSystem, Event, EventScope, Fqdn, Netblock, NodeId, Source, SourceTag,
};

use super::arena::{Arena, NodeKind};

/// Re-exported under the name the arena's edge list uses; identical to
/// `surveyor_domain::nodes::Predicate` (§3 edge predicates).
pub type EdgeLabel = surveyor_domain::nodes::Predicate;

const EVENT_FINISH_GRANULARITY_SECS: i64 = 5;
const MAX_CNAME_HOPS: usize = 10;

/// The in-process `Graph` port implementation (§4.7): an arena-backed,
/// `DashMap`-sharded store keyed by opaque `NodeId`, with identity indices
/// for FQDN/address/event/source lookups. Event membership and source
/// attribution are modeled as edges on the Event node itself rather than a
/// separate join table, so `event_fqdns`/`node_sources` are pure edge scans.
pub struct GraphStore {
    arena: Arena,
    node_tag: dashmap::DashMap<NodeId, SourceTag, rustc_hash::FxBuildHasher>,
    last_finish_write: Mutex<std::collections::HashMap<Uuid, DateTime<Utc>>>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            node_tag: dashmap::DashMap::with_hasher(rustc_hash::FxBuildHasher),
            last_finish_write: Mutex::new(std::collections::HashMap::new()),
        }
    }

    fn get_or_create_fqdn(&self, name: &str) -> NodeId {
        if let Some(id) = self.arena.fqdn_index.get(name) {
            return *id;
        }
        let fqdn = Fqdn::new(name);
        let id = self.arena.alloc(NodeKind::Fqdn(fqdn));
        self.arena.fqdn_index.insert(name.to_string(), id);
        id
    }

    fn get_or_create_address(&self, addr: Address) -> NodeId {
        if let Some(id) = self.arena.addr_index.get(&addr.value) {
            return *id;
        }
        let id = self.arena.alloc(NodeKind::Address(addr));
        self.arena.addr_index.insert(addr.value, id);
        id
    }

    /// Source-tag update policy (§4.7): tags are refined, never accumulated.
    fn get_or_create_source(&self, source: &Source) -> NodeId {
        if let Some(id) = self.arena.source_index.get(&source.name) {
            let id = *id;
            if let Some(mut record) = self.arena.nodes.get_mut(&id) {
                if let NodeKind::Source(existing) = &mut record.kind {
                    if existing.tag != source.tag {
                        existing.tag = source.tag;
                    }
                }
            }
            return id;
        }
        let id = self.arena.alloc(NodeKind::Source(source.clone()));
        self.arena.source_index.insert(source.name.clone(), id);
        id
    }

    fn attach_edge(&self, from: NodeId, label: EdgeLabel, to: NodeId) {
        if let Some(mut record) = self.arena.nodes.get_mut(&from) {
            if !record.edges.iter().any(|(l, t)| *l == label && *t == to) {
                record.edges.push((label, to));
            }
        }
    }

    /// Attaches `root`/`tld` edges, source attribution, and event
    /// membership for a freshly-touched FQDN. Idempotent: repeat calls with
    /// identical arguments are no-ops past the first (§8 invariant 5).
    fn link_fqdn_ancestry(&self, fqdn_id: NodeId, source: &Source, event_id: Uuid) {
        let (registered_domain, tld) = {
            let record = self.arena.nodes.get(&fqdn_id).unwrap();
            match &record.kind {
                NodeKind::Fqdn(f) => (f.registered_domain.clone(), f.tld.clone()),
                _ => unreachable!("fqdn_id must reference an Fqdn node"),
            }
        };

        let root_id = self.get_or_create_fqdn(&registered_domain);
        if root_id != fqdn_id {
            self.attach_edge(fqdn_id, EdgeLabel::Root, root_id);
        }
        let tld_id = self.get_or_create_fqdn(&tld);
        if tld_id != fqdn_id {
            self.attach_edge(fqdn_id, EdgeLabel::Tld, tld_id);
        }

        let source_id = self.get_or_create_source(source);
        let event_node = self.get_or_create_event(event_id);

        // Every FQDN node touched here (the name itself, plus the
        // registered-domain and TLD ancestors `get_or_create_fqdn` may have
        // just created) gets its own event-membership and source-attribution
        // edges — not only the primary node — so `event_fqdns`/`node_sources`
        // see every node created during this event (§3, §4.7).
        let mut touched: HashSet<NodeId> = HashSet::new();
        touched.insert(fqdn_id);
        touched.insert(root_id);
        touched.insert(tld_id);
        for id in touched {
            self.node_tag.insert(id, source.tag);
            self.attach_edge(event_node, EdgeLabel::Domain, id);
            self.attach_edge(event_node, EdgeLabel::Source(source.name.clone()), id);
        }
        self.attach_edge(
            event_node,
            EdgeLabel::Source(source.name.clone()),
            source_id,
        );
    }

    fn get_or_create_event(&self, event_id: Uuid) -> NodeId {
        if let Some(id) = self.arena.event_index.get(&event_id) {
            return *id;
        }
        let event = Event::new(event_id, EventScope::default());
        let id = self.arena.alloc(NodeKind::Event(event));
        self.arena.event_index.insert(event_id, id);
        id
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Graph for GraphStore {
    async fn upsert_fqdn(
        &self,
        name: &str,
        source: &Source,
        event_id: Uuid,
    ) -> Result<NodeId, EngineError> {
        let id = self.get_or_create_fqdn(name);
        self.link_fqdn_ancestry(id, source, event_id);
        Ok(id)
    }

    async fn upsert_a(&self, fqdn: NodeId, upsert: AddressUpsert) -> Result<NodeId, EngineError> {
        if !upsert.addr.is_ipv4() {
            return Err(EngineError::InvalidIpAddress(upsert.addr.value.to_string()));
        }
        let addr_id = self.get_or_create_address(upsert.addr);
        self.attach_edge(fqdn, EdgeLabel::ARecord, addr_id);
        self.link_fqdn_ancestry(fqdn, &upsert.source, upsert.event_id);
        Ok(addr_id)
    }

    async fn upsert_aaaa(
        &self,
        fqdn: NodeId,
        upsert: AddressUpsert,
    ) -> Result<NodeId, EngineError> {
        if upsert.addr.is_ipv4() {
            return Err(EngineError::InvalidIpAddress(upsert.addr.value.to_string()));
        }
        let addr_id = self.get_or_create_address(upsert.addr);
        self.attach_edge(fqdn, EdgeLabel::AaaaRecord, addr_id);
        self.link_fqdn_ancestry(fqdn, &upsert.source, upsert.event_id);
        Ok(addr_id)
    }

    async fn upsert_cname(
        &self,
        fqdn: NodeId,
        target: NodeId,
        source: &Source,
        event_id: Uuid,
    ) -> Result<(), EngineError> {
        self.attach_edge(fqdn, EdgeLabel::CnameRecord, target);
        self.link_fqdn_ancestry(fqdn, source, event_id);
        Ok(())
    }

    async fn upsert_ptr(
        &self,
        addr: NodeId,
        fqdn: NodeId,
        source: &Source,
        event_id: Uuid,
    ) -> Result<(), EngineError> {
        self.attach_edge(addr, EdgeLabel::PtrRecord, fqdn);
        self.link_fqdn_ancestry(fqdn, source, event_id);
        Ok(())
    }

    async fn upsert_ns(
        &self,
        fqdn: NodeId,
        ns: NodeId,
        source: &Source,
        event_id: Uuid,
    ) -> Result<(), EngineError> {
        self.attach_edge(fqdn, EdgeLabel::NsRecord, ns);
        self.link_fqdn_ancestry(fqdn, source, event_id);
        Ok(())
    }

    async fn upsert_mx(
        &self,
        fqdn: NodeId,
        mx: NodeId,
        source: &Source,
        event_id: Uuid,
    ) -> Result<(), EngineError> {
        self.attach_edge(fqdn, EdgeLabel::MxRecord, mx);
        self.link_fqdn_ancestry(fqdn, source, event_id);
        Ok(())
    }

    async fn upsert_srv(
        &self,
        fqdn: NodeId,
        target: NodeId,
        source: &Source,
        event_id: Uuid,
    ) -> Result<(), EngineError> {
        self.attach_edge(fqdn, EdgeLabel::Service, target);
        self.attach_edge(fqdn, EdgeLabel::SrvRecord, target);
        self.link_fqdn_ancestry(fqdn, source, event_id);
        Ok(())
    }

    async fn name_to_addrs(&self, fqdn: NodeId) -> Result<Vec<Address>, EngineError> {
        let mut visited = HashSet::new();
        let mut current = fqdn;

        // One SRV hop (§4.7 nameToAddrs step 1).
        if let Some(record) = self.arena.nodes.get(&current) {
            if let Some((_, target)) = record
                .edges
                .iter()
                .find(|(label, _)| *label == EdgeLabel::Service)
            {
                current = *target;
            }
        }

        // Chase the CNAME chain up to depth 10, breaking cycles (§4.7, §8 invariant 3).
        for _ in 0..MAX_CNAME_HOPS {
            if !visited.insert(current) {
                return Ok(Vec::new());
            }
            let next = self.arena.nodes.get(&current).and_then(|record| {
                record
                    .edges
                    .iter()
                    .find(|(label, _)| *label == EdgeLabel::CnameRecord)
                    .map(|(_, t)| *t)
            });
            match next {
                Some(t) => current = t,
                None => break,
            }
        }

        let mut addrs = Vec::new();
        if let Some(record) = self.arena.nodes.get(&current) {
            for (label, target) in &record.edges {
                if matches!(label, EdgeLabel::ARecord | EdgeLabel::AaaaRecord) {
                    if let Some(target_record) = self.arena.nodes.get(target) {
                        if let NodeKind::Address(addr) = &target_record.kind {
                            addrs.push(*addr);
                        }
                    }
                }
            }
        }
        Ok(addrs)
    }

    async fn list_events(&self, domains: Option<&[String]>) -> Result<Vec<Uuid>, EngineError> {
        let mut events: Vec<(Uuid, DateTime<Utc>, DateTime<Utc>)> = self
            .arena
            .event_index
            .iter()
            .filter_map(|entry| {
                let event_id = *entry.key();
                let node_id = *entry.value();
                let record = self.arena.nodes.get(&node_id)?;
                let NodeKind::Event(event) = &record.kind else {
                    return None;
                };
                if let Some(domains) = domains {
                    let touches = record.edges.iter().any(|(label, target)| {
                        matches!(label, EdgeLabel::Domain)
                            && self
                                .arena
                                .nodes
                                .get(target)
                                .map(|t| matches!(&t.kind, NodeKind::Fqdn(f) if domains.contains(&f.registered_domain)))
                                .unwrap_or(false)
                    });
                    if !touches {
                        return None;
                    }
                }
                Some((event_id, event.start, event.finish))
            })
            .collect();

        events.sort_by(|a, b| b.2.cmp(&a.2).then(a.1.cmp(&b.1)));
        Ok(events.into_iter().map(|(id, _, _)| id).collect())
    }

    async fn event_fqdns(&self, event_id: Uuid) -> Result<Vec<NodeId>, EngineError> {
        let Some(event_node) = self.arena.event_index.get(&event_id).map(|e| *e) else {
            return Ok(Vec::new());
        };
        let Some(record) = self.arena.nodes.get(&event_node) else {
            return Ok(Vec::new());
        };
        let mut seen = HashSet::new();
        Ok(record
            .edges
            .iter()
            .filter(|(label, _)| matches!(label, EdgeLabel::Domain))
            .map(|(_, target)| *target)
            .filter(|id| seen.insert(*id))
            .collect())
    }

    async fn event_domains(&self, event_id: Uuid) -> Result<HashSet<String>, EngineError> {
        let mut domains = HashSet::new();
        for node in self.event_fqdns(event_id).await? {
            if let Some(record) = self.arena.nodes.get(&node) {
                if let NodeKind::Fqdn(f) = &record.kind {
                    domains.insert(f.registered_domain.clone());
                }
            }
        }
        Ok(domains)
    }

    async fn event_date_range(
        &self,
        event_id: Uuid,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), EngineError> {
        let node_id = self
            .arena
            .event_index
            .get(&event_id)
            .map(|e| *e)
            .ok_or_else(|| EngineError::GraphWriteError(format!("unknown event {event_id}")))?;
        self.arena
            .event_timestamps(node_id)
            .ok_or_else(|| EngineError::GraphWriteError(format!("unknown event {event_id}")))
    }

    async fn node_sources(
        &self,
        node: NodeId,
        event_ids: &[Uuid],
    ) -> Result<HashSet<String>, EngineError> {
        let mut names = HashSet::new();
        for event_id in event_ids {
            let Some(event_node) = self.arena.event_index.get(event_id).map(|e| *e) else {
                continue;
            };
            let Some(record) = self.arena.nodes.get(&event_node) else {
                continue;
            };
            for (label, target) in &record.edges {
                if *target != node {
                    continue;
                }
                if let EdgeLabel::Source(name) = label {
                    names.insert(name.clone());
                }
            }
        }
        Ok(names)
    }

    async fn insert_event(&self, event_id: Uuid) -> Result<(), EngineError> {
        let node_id = self.get_or_create_event(event_id);
        let now = Utc::now();
        let mut last_writes = self.last_finish_write.lock().unwrap();
        let should_write = last_writes
            .get(&event_id)
            .map(|last| now - *last >= ChronoDuration::seconds(EVENT_FINISH_GRANULARITY_SECS))
            .unwrap_or(true);
        if should_write {
            if let Some(mut record) = self.arena.nodes.get_mut(&node_id) {
                if let NodeKind::Event(event) = &mut record.kind {
                    event.finish = now;
                }
            }
            last_writes.insert(event_id, now);
        }
        Ok(())
    }

    async fn finish_event(&self, event_id: Uuid) -> Result<(), EngineError> {
        let node_id = self
            .arena
            .event_index
            .get(&event_id)
            .map(|e| *e)
            .ok_or_else(|| EngineError::GraphWriteError(format!("unknown event {event_id}")))?;
        if let Some(mut record) = self.arena.nodes.get_mut(&node_id) {
            if let NodeKind::Event(event) = &mut record.kind {
                event.finish = Utc::now();
            }
        }
        Ok(())
    }

    async fn dump_viz(
        &self,
        event_id: Uuid,
    ) -> Result<(Vec<NodeId>, Vec<(NodeId, NodeId, String)>), EngineError> {
        let fqdns = self.event_fqdns(event_id).await?;
        let mut nodes: HashSet<NodeId> = fqdns.iter().copied().collect();
        let mut edges = Vec::new();

        for &fqdn in &fqdns {
            let Some(record) = self.arena.nodes.get(&fqdn) else {
                continue;
            };
            for (label, target) in &record.edges {
                if matches!(label, EdgeLabel::Source(_) | EdgeLabel::Tld) {
                    continue;
                }
                nodes.insert(*target);
                edges.push((fqdn, *target, label.as_str().to_string()));
            }
        }

        Ok((nodes.into_iter().collect(), edges))
    }

    fn node_tag(&self, node: NodeId) -> Option<SourceTag> {
        self.node_tag.get(&node).map(|t| *t)
    }

    fn fqdn_of(&self, node: NodeId) -> Option<Fqdn> {
        let record = self.arena.nodes.get(&node)?;
        match &record.kind {
            NodeKind::Fqdn(f) => Some(f.clone()),
            _ => None,
        }
    }

    fn source_tag(&self, name: &str) -> Option<SourceTag> {
        let id = *self.arena.source_index.get(name)?;
        let record = self.arena.nodes.get(&id)?;
        match &record.kind {
            NodeKind::Source(s) => Some(s.tag),
            _ => None,
        }
    }

    async fn heal_address_nodes(
        &self,
        asn_cache: &dyn AsnCache,
        event_id: Uuid,
    ) -> Result<(), EngineError> {
        let fqdns = self.event_fqdns(event_id).await?;
        let mut orphan_addrs: HashSet<IpAddr> = HashSet::new();
        for fqdn in fqdns {
            if let Some(record) = self.arena.nodes.get(&fqdn) {
                for (label, target) in &record.edges {
                    if matches!(label, EdgeLabel::ARecord | EdgeLabel::AaaaRecord) {
                        if let Some(addr_record) = self.arena.nodes.get(target) {
                            if let NodeKind::Address(addr) = &addr_record.kind {
                                let has_containment = self
                                    .arena
                                    .nodes
                                    .iter()
                                    .any(|n| {
                                        n.edges.iter().any(|(l, t)| {
                                            matches!(l, EdgeLabel::Contains) && t == target
                                        })
                                    });
                                if !has_containment {
                                    orphan_addrs.insert(addr.value);
                                }
                            }
                        }
                    }
                }
            }
        }

        for ip in orphan_addrs {
            let Some(info) = asn_cache.lookup(ip) else {
                continue;
            };
            let Ok(cidr) = info.cidr.parse::<ipnetwork::IpNetwork>() else {
                continue;
            };
            let netblock_key = cidr.to_string();
            let netblock_id = if let Some(id) = self.arena.fqdn_index.get(&format!("nb:{netblock_key}")) {
                *id
            } else {
                let id = self.arena.alloc(NodeKind::Netblock(Netblock::new(cidr)));
                self.arena
                    .fqdn_index
                    .insert(format!("nb:{netblock_key}"), id);
                id
            };

            let asn_key = format!("asn:{}", info.asn);
            let asn_id = if let Some(id) = self.arena.fqdn_index.get(&asn_key) {
                *id
            } else {
                let id = self.arena.alloc(NodeKind::Asn(AutonomousSystem {
                    asn: info.asn,
                    description: info.description.clone(),
                }));
                self.arena.fqdn_index.insert(asn_key, id);
                id
            };

            self.attach_edge(asn_id, EdgeLabel::Prefix, netblock_id);
            let addr_id = *self.arena.addr_index.get(&ip).unwrap();
            self.attach_edge(netblock_id, EdgeLabel::Contains, addr_id);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(tag: SourceTag) -> Source {
        Source {
            name: "dns-probe".to_string(),
            tag,
        }
    }

    #[tokio::test]
    async fn upsert_fqdn_twice_is_idempotent() {
        let store = GraphStore::new();
        let event_id = Uuid::new_v4();
        let a = store
            .upsert_fqdn("www.example.com", &source(SourceTag::Dns), event_id)
            .await
            .unwrap();
        let b = store
            .upsert_fqdn("www.example.com", &source(SourceTag::Dns), event_id)
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(store.event_fqdns(event_id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn cname_chain_resolves_to_final_addresses() {
        let store = GraphStore::new();
        let event_id = Uuid::new_v4();
        let src = source(SourceTag::Dns);
        let alias = store.upsert_fqdn("alias.example.com", &src, event_id).await.unwrap();
        let target = store.upsert_fqdn("target.example.com", &src, event_id).await.unwrap();
        store.upsert_cname(alias, target, &src, event_id).await.unwrap();
        store
            .upsert_a(
                target,
                AddressUpsert {
                    addr: Address::new("1.2.3.4".parse().unwrap()),
                    source: src.clone(),
                    event_id,
                },
            )
            .await
            .unwrap();

        let addrs = store.name_to_addrs(alias).await.unwrap();
        assert_eq!(addrs.len(), 1);
        assert_eq!(addrs[0].value.to_string(), "1.2.3.4");
    }

    #[tokio::test]
    async fn cyclic_cname_chain_returns_empty_without_hanging() {
        let store = GraphStore::new();
        let event_id = Uuid::new_v4();
        let src = source(SourceTag::Dns);
        let a = store.upsert_fqdn("a.example.com", &src, event_id).await.unwrap();
        let b = store.upsert_fqdn("b.example.com", &src, event_id).await.unwrap();
        store.upsert_cname(a, b, &src, event_id).await.unwrap();
        store.upsert_cname(b, a, &src, event_id).await.unwrap();

        let addrs = store.name_to_addrs(a).await.unwrap();
        assert!(addrs.is_empty());
    }
}
