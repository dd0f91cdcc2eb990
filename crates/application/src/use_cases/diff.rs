use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use surveyor_domain::errors::EngineError;
use surveyor_domain::nodes::{default_trusted_tags, Finding, FindingAddress, SourceTag};

use crate::ports::{AsnCache, Graph};

/// One entry of a `diff(older, newer)` result (§4.8).
#[derive(Debug, Clone, PartialEq)]
pub enum DiffEntry {
    Found {
        name: String,
        new_addrs: Vec<IpAddr>,
    },
    Moved {
        name: String,
        old_addrs: Vec<IpAddr>,
        new_addrs: Vec<IpAddr>,
    },
    Removed {
        name: String,
        old_addrs: Vec<IpAddr>,
    },
}

/// Tracking/diff use cases (C8): pure queries over the `Graph` port, with no
/// side effects of their own.
pub struct TrackingUseCase {
    graph: Arc<dyn Graph>,
    asn_cache: Arc<dyn AsnCache>,
}

impl TrackingUseCase {
    pub fn new(graph: Arc<dyn Graph>, asn_cache: Arc<dyn AsnCache>) -> Self {
        Self { graph, asn_cache }
    }

    /// §4.8 `listEvents`.
    #[instrument(skip(self))]
    pub async fn list_events(
        &self,
        domains: Option<&[String]>,
    ) -> Result<Vec<Uuid>, EngineError> {
        self.graph.list_events(domains).await
    }

    /// §4.8 `eventOutput`. `filter` accumulates already-seen names across
    /// calls (e.g. across `cumulative`'s prior-events union) so repeated
    /// names are skipped and not double counted.
    #[instrument(skip(self, filter))]
    pub async fn event_output(
        &self,
        event_id: Uuid,
        filter: &mut HashSet<String>,
        want_asn_info: bool,
    ) -> Result<Vec<Finding>, EngineError> {
        let mut findings = Vec::new();
        for node in self.graph.event_fqdns(event_id).await? {
            let Some(fqdn) = self.graph.fqdn_of(node) else {
                continue;
            };
            if !filter.insert(fqdn.name.clone()) {
                continue;
            }
            let addrs = self.graph.name_to_addrs(node).await?;
            let sources = self.graph.node_sources(node, &[event_id]).await?;
            let tag = select_tag(self.graph.as_ref(), &sources, self.graph.node_tag(node));

            let mut finding_addrs = Vec::with_capacity(addrs.len());
            let mut suppressed = false;
            for addr in &addrs {
                let info = self.asn_cache.lookup(addr.value);
                if want_asn_info && info.is_none() {
                    suppressed = true;
                    break;
                }
                finding_addrs.push(FindingAddress {
                    ip: addr.value,
                    asn: info.as_ref().map(|i| i.asn),
                    cidr: info.as_ref().map(|i| i.cidr.clone()),
                    desc: info.as_ref().map(|i| i.description.clone()),
                });
            }
            if suppressed {
                continue;
            }

            findings.push(Finding {
                name: fqdn.name,
                registered_domain: fqdn.registered_domain,
                addresses: finding_addrs,
                sources: sources.into_iter().collect(),
                tag,
            });
        }
        Ok(findings)
    }

    /// §4.8 `diff`: set equality on IPs only decides `Moved` vs `Found`/`Removed`.
    pub fn diff(older: &[Finding], newer: &[Finding]) -> Vec<DiffEntry> {
        let older_by_name: HashMap<&str, &Finding> =
            older.iter().map(|f| (f.name.as_str(), f)).collect();
        let newer_by_name: HashMap<&str, &Finding> =
            newer.iter().map(|f| (f.name.as_str(), f)).collect();

        let mut entries = Vec::new();

        for newer_f in newer {
            match older_by_name.get(newer_f.name.as_str()) {
                None => entries.push(DiffEntry::Found {
                    name: newer_f.name.clone(),
                    new_addrs: addr_ips(newer_f),
                }),
                Some(older_f) => {
                    let old_set: HashSet<IpAddr> = addr_ips(older_f).into_iter().collect();
                    let new_set: HashSet<IpAddr> = addr_ips(newer_f).into_iter().collect();
                    if old_set != new_set {
                        entries.push(DiffEntry::Moved {
                            name: newer_f.name.clone(),
                            old_addrs: addr_ips(older_f),
                            new_addrs: addr_ips(newer_f),
                        });
                    }
                }
            }
        }

        for older_f in older {
            if !newer_by_name.contains_key(older_f.name.as_str()) {
                entries.push(DiffEntry::Removed {
                    name: older_f.name.clone(),
                    old_addrs: addr_ips(older_f),
                });
            }
        }

        entries
    }

    /// §4.8 `cumulative`: diffs the union of `prior` events against `target`.
    #[instrument(skip(self, prior))]
    pub async fn cumulative(
        &self,
        prior: &[Uuid],
        target: Uuid,
        want_asn_info: bool,
    ) -> Result<Vec<DiffEntry>, EngineError> {
        let mut filter = HashSet::new();
        let mut older = Vec::new();
        for event in prior {
            older.extend(self.event_output(*event, &mut filter, want_asn_info).await?);
        }
        let mut target_filter = HashSet::new();
        let newer = self
            .event_output(target, &mut target_filter, want_asn_info)
            .await?;
        Ok(Self::diff(&older, &newer))
    }

    /// §4.8 `history`: pairwise diff across a chronologically sorted run.
    #[instrument(skip(self, events))]
    pub async fn history(
        &self,
        events: &[Uuid],
        want_asn_info: bool,
    ) -> Result<Vec<Vec<DiffEntry>>, EngineError> {
        let mut outputs = Vec::with_capacity(events.len());
        for event in events {
            let mut filter = HashSet::new();
            outputs.push(self.event_output(*event, &mut filter, want_asn_info).await?);
        }
        Ok(outputs
            .windows(2)
            .map(|pair| Self::diff(&pair[0], &pair[1]))
            .collect())
    }
}

fn addr_ips(finding: &Finding) -> Vec<IpAddr> {
    finding.addresses.iter().map(|a| a.ip).collect()
}

/// §4.8 tag selection: trusted-first, stable across invocations (§9 open
/// question 3 — resolved in favor of determinism over random pick).
fn select_tag(graph: &dyn Graph, sources: &HashSet<String>, fallback: Option<SourceTag>) -> SourceTag {
    let trusted = default_trusted_tags();
    let mut sorted: Vec<&String> = sources.iter().collect();
    sorted.sort();
    for name in &sorted {
        if let Some(tag) = graph.source_tag(name) {
            if trusted.contains(&tag) {
                return tag;
            }
        }
    }
    fallback.unwrap_or(SourceTag::Api)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use surveyor_domain::nodes::{Address, Fqdn, NodeId, Source};

    use crate::ports::graph::AddressUpsert;

    /// Minimal `Graph` stand-in for exercising `select_tag` in isolation;
    /// every method this use case doesn't touch panics if called.
    struct FakeGraph {
        source_tags: HashMap<String, SourceTag>,
    }

    #[async_trait]
    impl Graph for FakeGraph {
        async fn upsert_fqdn(
            &self,
            _name: &str,
            _source: &Source,
            _event_id: Uuid,
        ) -> Result<NodeId, EngineError> {
            unimplemented!()
        }
        async fn upsert_a(
            &self,
            _fqdn: NodeId,
            _upsert: AddressUpsert,
        ) -> Result<NodeId, EngineError> {
            unimplemented!()
        }
        async fn upsert_aaaa(
            &self,
            _fqdn: NodeId,
            _upsert: AddressUpsert,
        ) -> Result<NodeId, EngineError> {
            unimplemented!()
        }
        async fn upsert_cname(
            &self,
            _fqdn: NodeId,
            _target: NodeId,
            _source: &Source,
            _event_id: Uuid,
        ) -> Result<(), EngineError> {
            unimplemented!()
        }
        async fn upsert_ptr(
            &self,
            _addr: NodeId,
            _fqdn: NodeId,
            _source: &Source,
            _event_id: Uuid,
        ) -> Result<(), EngineError> {
            unimplemented!()
        }
        async fn upsert_ns(
            &self,
            _fqdn: NodeId,
            _ns: NodeId,
            _source: &Source,
            _event_id: Uuid,
        ) -> Result<(), EngineError> {
            unimplemented!()
        }
        async fn upsert_mx(
            &self,
            _fqdn: NodeId,
            _mx: NodeId,
            _source: &Source,
            _event_id: Uuid,
        ) -> Result<(), EngineError> {
            unimplemented!()
        }
        async fn upsert_srv(
            &self,
            _fqdn: NodeId,
            _target: NodeId,
            _source: &Source,
            _event_id: Uuid,
        ) -> Result<(), EngineError> {
            unimplemented!()
        }
        async fn name_to_addrs(&self, _fqdn: NodeId) -> Result<Vec<Address>, EngineError> {
            unimplemented!()
        }
        async fn list_events(
            &self,
            _domains: Option<&[String]>,
        ) -> Result<Vec<Uuid>, EngineError> {
            unimplemented!()
        }
        async fn event_fqdns(&self, _event_id: Uuid) -> Result<Vec<NodeId>, EngineError> {
            unimplemented!()
        }
        async fn event_domains(&self, _event_id: Uuid) -> Result<HashSet<String>, EngineError> {
            unimplemented!()
        }
        async fn event_date_range(
            &self,
            _event_id: Uuid,
        ) -> Result<(DateTime<Utc>, DateTime<Utc>), EngineError> {
            unimplemented!()
        }
        async fn node_sources(
            &self,
            _node: NodeId,
            _event_ids: &[Uuid],
        ) -> Result<HashSet<String>, EngineError> {
            unimplemented!()
        }
        async fn insert_event(&self, _event_id: Uuid) -> Result<(), EngineError> {
            unimplemented!()
        }
        async fn finish_event(&self, _event_id: Uuid) -> Result<(), EngineError> {
            unimplemented!()
        }
        async fn dump_viz(
            &self,
            _event_id: Uuid,
        ) -> Result<(Vec<NodeId>, Vec<(NodeId, NodeId, String)>), EngineError> {
            unimplemented!()
        }
        fn node_tag(&self, _node: NodeId) -> Option<SourceTag> {
            unimplemented!()
        }
        fn fqdn_of(&self, _node: NodeId) -> Option<Fqdn> {
            unimplemented!()
        }
        fn source_tag(&self, name: &str) -> Option<SourceTag> {
            self.source_tags.get(name).copied()
        }
        async fn heal_address_nodes(
            &self,
            _asn_cache: &dyn AsnCache,
            _event_id: Uuid,
        ) -> Result<(), EngineError> {
            unimplemented!()
        }
    }

    #[test]
    fn select_tag_prefers_a_trusted_source_over_the_fallback() {
        let graph = FakeGraph {
            source_tags: HashMap::from([
                ("z-untrusted".to_string(), SourceTag::Scrape),
                ("a-trusted".to_string(), SourceTag::Cert),
            ]),
        };
        let sources: HashSet<String> = ["z-untrusted", "a-trusted"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let tag = select_tag(&graph, &sources, Some(SourceTag::Api));
        assert_eq!(tag, SourceTag::Cert);
    }

    #[test]
    fn select_tag_is_stable_across_source_iteration_order() {
        let graph = FakeGraph {
            source_tags: HashMap::from([
                ("bbb".to_string(), SourceTag::Axfr),
                ("aaa".to_string(), SourceTag::Dns),
            ]),
        };
        let sources: HashSet<String> = ["bbb", "aaa"].iter().map(|s| s.to_string()).collect();

        // Sorted alphabetically, "aaa" is considered before "bbb", so its
        // tag wins regardless of the HashSet's internal iteration order.
        for _ in 0..5 {
            assert_eq!(select_tag(&graph, &sources, None), SourceTag::Dns);
        }
    }

    #[test]
    fn select_tag_falls_back_when_no_source_resolves_to_a_trusted_tag() {
        let graph = FakeGraph {
            source_tags: HashMap::from([("scraper".to_string(), SourceTag::Scrape)]),
        };
        let sources: HashSet<String> = ["scraper".to_string()].into_iter().collect();

        let tag = select_tag(&graph, &sources, Some(SourceTag::Api));
        assert_eq!(tag, SourceTag::Api);
    }

    fn finding(name: &str, ips: &[&str]) -> Finding {
        Finding {
            name: name.to_string(),
            registered_domain: "example.com".to_string(),
            addresses: ips
                .iter()
                .map(|ip| FindingAddress {
                    ip: ip.parse().unwrap(),
                    asn: None,
                    cidr: None,
                    desc: None,
                })
                .collect(),
            sources: vec!["dns".to_string()],
            tag: SourceTag::Dns,
        }
    }

    #[test]
    fn diff_partitions_found_moved_removed() {
        let older = vec![finding("a.example.com", &["1.1.1.1"])];
        let newer = vec![
            finding("a.example.com", &["2.2.2.2"]),
            finding("b.example.com", &["3.3.3.3"]),
        ];
        let entries = TrackingUseCase::diff(&older, &newer);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| matches!(e, DiffEntry::Moved { name, .. } if name == "a.example.com")));
        assert!(entries.iter().any(|e| matches!(e, DiffEntry::Found { name, .. } if name == "b.example.com")));
    }

    #[test]
    fn diff_reversed_yields_removed_for_missing() {
        let e1 = vec![finding("a.example.com", &["1.1.1.1"])];
        let e2 = vec![
            finding("a.example.com", &["2.2.2.2"]),
            finding("b.example.com", &["3.3.3.3"]),
        ];
        let entries = TrackingUseCase::diff(&e2, &e1);
        assert!(entries
            .iter()
            .any(|e| matches!(e, DiffEntry::Removed { name, .. } if name == "b.example.com")));
        assert!(entries
            .iter()
            .any(|e| matches!(e, DiffEntry::Moved { name, .. } if name == "a.example.com")));
    }

    #[test]
    fn same_address_set_is_not_moved() {
        let older = vec![finding("a.example.com", &["1.1.1.1", "2.2.2.2"])];
        let newer = vec![finding("a.example.com", &["2.2.2.2", "1.1.1.1"])];
        assert!(TrackingUseCase::diff(&older, &newer).is_empty());
    }
}
