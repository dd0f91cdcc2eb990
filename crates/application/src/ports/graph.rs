use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use surveyor_domain::errors::EngineError;
use surveyor_domain::nodes::{Address, Fqdn, NodeId, Source, SourceTag};

/// Everything the graph needs to know about a resolved address to attach it
/// (§4.7 `upsertA/AAAA`).
#[derive(Debug, Clone)]
pub struct AddressUpsert {
    pub addr: Address,
    pub source: Source,
    pub event_id: Uuid,
}

/// The `Graph` port (§4.7): the only way C6 and C8 touch persisted state.
/// The in-process implementation lives in `surveyor-infrastructure`; nothing
/// outside it ever sees a raw `NodeId` as anything but an opaque handle.
#[async_trait]
pub trait Graph: Send + Sync {
    /// Creates the FQDN node (and its registered-domain/TLD ancestors) if
    /// absent, linking `root`/`tld`, and attaches source + event edges.
    /// Idempotent: calling twice with the same arguments is a no-op past the
    /// first call (§8 invariant 5).
    async fn upsert_fqdn(
        &self,
        name: &str,
        source: &Source,
        event_id: Uuid,
    ) -> Result<NodeId, EngineError>;

    async fn upsert_a(
        &self,
        fqdn: NodeId,
        upsert: AddressUpsert,
    ) -> Result<NodeId, EngineError>;

    async fn upsert_aaaa(
        &self,
        fqdn: NodeId,
        upsert: AddressUpsert,
    ) -> Result<NodeId, EngineError>;

    async fn upsert_cname(
        &self,
        fqdn: NodeId,
        target: NodeId,
        source: &Source,
        event_id: Uuid,
    ) -> Result<(), EngineError>;

    async fn upsert_ptr(
        &self,
        addr: NodeId,
        fqdn: NodeId,
        source: &Source,
        event_id: Uuid,
    ) -> Result<(), EngineError>;

    async fn upsert_ns(
        &self,
        fqdn: NodeId,
        ns: NodeId,
        source: &Source,
        event_id: Uuid,
    ) -> Result<(), EngineError>;

    async fn upsert_mx(
        &self,
        fqdn: NodeId,
        mx: NodeId,
        source: &Source,
        event_id: Uuid,
    ) -> Result<(), EngineError>;

    /// SRV targets get both a `service` and an `srv_record` edge (§4.7).
    async fn upsert_srv(
        &self,
        fqdn: NodeId,
        target: NodeId,
        source: &Source,
        event_id: Uuid,
    ) -> Result<(), EngineError>;

    /// §4.7 `nameToAddrs`: one SRV hop, then up to 10 CNAME hops, then
    /// A/AAAA out-edges. Breaks cycles with a visited set (§9, §8 invariant 3).
    async fn name_to_addrs(&self, fqdn: NodeId) -> Result<Vec<Address>, EngineError>;

    /// All known events, optionally restricted to those whose scope touches
    /// one of `domains`, sorted by descending `finish` then ascending
    /// `start` (§4.8 `listEvents`).
    async fn list_events(&self, domains: Option<&[String]>) -> Result<Vec<Uuid>, EngineError>;

    async fn event_fqdns(&self, event_id: Uuid) -> Result<Vec<NodeId>, EngineError>;

    async fn event_domains(&self, event_id: Uuid) -> Result<HashSet<String>, EngineError>;

    async fn event_date_range(
        &self,
        event_id: Uuid,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), EngineError>;

    async fn node_sources(
        &self,
        node: NodeId,
        event_ids: &[Uuid],
    ) -> Result<HashSet<String>, EngineError>;

    /// Creates an Event node, starting its `start`/`finish` timestamps on
    /// first call. Subsequent calls bump `finish`, coalesced to ≥5s
    /// granularity (§4.7 event lifecycle).
    async fn insert_event(&self, event_id: Uuid) -> Result<(), EngineError>;

    /// Finalizes the Event's `finish` timestamp on clean shutdown.
    async fn finish_event(&self, event_id: Uuid) -> Result<(), EngineError>;

    /// Flattens the graph for visualization, excluding `source`- and
    /// `tld`-only nodes (§4.7 `dumpViz`).
    async fn dump_viz(
        &self,
        event_id: Uuid,
    ) -> Result<(Vec<NodeId>, Vec<(NodeId, NodeId, String)>), EngineError>;

    fn node_tag(&self, node: NodeId) -> Option<SourceTag>;

    /// The FQDN attributes for a node, or `None` if it is not an FQDN node.
    fn fqdn_of(&self, node: NodeId) -> Option<Fqdn>;

    /// The tag a named source was registered with, or `None` if no source
    /// by that name has ever been attached to a node. Backs trusted-first
    /// tag selection (§4.8, §9 open question 3) without requiring callers
    /// to keep their own source→tag table.
    fn source_tag(&self, name: &str) -> Option<SourceTag>;

    /// For every orphan Address in the event, consults the ASN cache to
    /// create missing `contains`/`prefix` edges (§4.7 `healAddressNodes`).
    async fn heal_address_nodes(
        &self,
        asn_cache: &dyn super::asn_cache::AsnCache,
        event_id: Uuid,
    ) -> Result<(), EngineError>;
}
