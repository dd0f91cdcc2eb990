use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;
use uuid::Uuid;

use surveyor_application::ports::event_bus::{EventBus, Topic};
use surveyor_application::ports::graph::{AddressUpsert, Graph};
use surveyor_application::ports::resolver::{Answer, QueryOutcome};
use surveyor_domain::record_type::RecordType;

use super::candidate::{Candidate, Resolved};
use super::inflight::Inflight;
use crate::namegen::NameGenerator;

/// Per-parent-domain count of confirmed subdomains, used to trigger the
/// recursive brute-force expansion once `min_for_recursive` is reached
/// (§4.6 stage 7).
pub type RecursiveCounts = DashMap<String, AtomicUsize, FxBuildHasher>;

pub struct FeedbackConfig {
    pub event_id: Uuid,
    pub alterations_enabled: bool,
    pub recursive_enabled: bool,
    pub min_for_recursive: usize,
    pub brute_wordlist: Arc<Vec<String>>,
}

/// Persist + feedback, merged into one serial worker loop (§4.6 stages
/// 6-7): the graph already serializes per-node writes internally, so a
/// single consumer here preserves the "resolve → persist → publish →
/// feedback" total order per name without adding its own locking.
pub async fn run(
    mut rx: mpsc::Receiver<Resolved>,
    ingress: mpsc::Sender<Candidate>,
    graph: Arc<dyn Graph>,
    event_bus: Arc<dyn EventBus>,
    name_generator: Arc<NameGenerator>,
    recursive_counts: Arc<RecursiveCounts>,
    config: FeedbackConfig,
    cancel: CancellationToken,
    inflight: Arc<Inflight>,
) {
    loop {
        let resolved = tokio::select! {
            _ = cancel.cancelled() => return,
            item = rx.recv() => item,
        };
        let Some(Resolved { candidate, outcomes }) = resolved else { return };

        if let Err(e) = persist_one(&graph, &candidate, &outcomes, config.event_id).await {
            tracing::warn!(name = %candidate.name, error = %e, "persist failed");
            inflight.complete();
            continue;
        }

        let addrs = addresses_from(&outcomes);
        let _ = event_bus
            .publish(Topic::NameDiscovered {
                name: candidate.name.clone(),
                source: candidate.source.name.clone(),
            })
            .await;
        if !addrs.is_empty() {
            let _ = event_bus
                .publish(Topic::AddressResolved {
                    name: candidate.name.clone(),
                    addresses: addrs,
                })
                .await;
        }

        if config.alterations_enabled {
            name_generator.observe(&candidate.name);
            for alt in name_generator.alterations_for(&candidate.name) {
                inflight.submit(1);
                let alt_candidate = Candidate::new(alt, candidate.source.clone());
                if ingress.send(alt_candidate).await.is_err() {
                    inflight.complete();
                }
            }
        }

        if config.recursive_enabled {
            let parent_fqdn = parent_of(&candidate.name);
            let counter = recursive_counts
                .entry(parent_fqdn.clone())
                .or_insert_with(|| AtomicUsize::new(0));
            let count = counter.fetch_add(1, Ordering::AcqRel) + 1;
            if count == config.min_for_recursive {
                trace!(parent = %parent_fqdn, count, "recursive threshold reached, expanding");
                for word in config.brute_wordlist.iter() {
                    inflight.submit(1);
                    let name = format!("{word}.{parent_fqdn}");
                    let candidate = Candidate::new(name, candidate.source.clone());
                    if ingress.send(candidate).await.is_err() {
                        inflight.complete();
                    }
                }
            }
        }

        inflight.complete();
    }
}

/// The immediate parent FQDN a confirmed name was found under, used as the
/// recursive brute-force expansion root rather than the registered domain
/// (so recursion walks one label at a time, per §4.4(b)).
fn parent_of(name: &str) -> String {
    match name.split_once('.') {
        Some((_, rest)) if !rest.is_empty() => rest.to_string(),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_of_strips_the_leftmost_label() {
        assert_eq!(parent_of("www.example.com"), "example.com");
        assert_eq!(parent_of("a.b.example.com"), "b.example.com");
    }

    #[test]
    fn parent_of_bare_label_returns_itself() {
        assert_eq!(parent_of("example"), "example");
    }
}

fn addresses_from(outcomes: &[(RecordType, QueryOutcome)]) -> Vec<IpAddr> {
    outcomes
        .iter()
        .flat_map(|(_, outcome)| match outcome {
            QueryOutcome::Answer(answers) => answers
                .iter()
                .filter_map(|a| match a {
                    Answer::Addr(ip) => Some(*ip),
                    Answer::Name(_) => None,
                })
                .collect::<Vec<_>>(),
            _ => Vec::new(),
        })
        .collect()
}

async fn persist_one(
    graph: &Arc<dyn Graph>,
    candidate: &Candidate,
    outcomes: &[(RecordType, QueryOutcome)],
    event_id: Uuid,
) -> Result<(), surveyor_domain::errors::EngineError> {
    let fqdn_id = graph
        .upsert_fqdn(&candidate.name, &candidate.source, event_id)
        .await?;

    for (rt, outcome) in outcomes {
        let QueryOutcome::Answer(answers) = outcome else {
            continue;
        };
        for answer in answers {
            match (rt, answer) {
                (RecordType::A, Answer::Addr(ip)) if ip.is_ipv4() => {
                    graph
                        .upsert_a(
                            fqdn_id,
                            AddressUpsert {
                                addr: surveyor_domain::nodes::Address::new(*ip),
                                source: candidate.source.clone(),
                                event_id,
                            },
                        )
                        .await?;
                }
                (RecordType::Aaaa, Answer::Addr(ip)) if !ip.is_ipv4() => {
                    graph
                        .upsert_aaaa(
                            fqdn_id,
                            AddressUpsert {
                                addr: surveyor_domain::nodes::Address::new(*ip),
                                source: candidate.source.clone(),
                                event_id,
                            },
                        )
                        .await?;
                }
                (RecordType::Cname, Answer::Name(target)) => {
                    let target_id = graph
                        .upsert_fqdn(target, &candidate.source, event_id)
                        .await?;
                    graph
                        .upsert_cname(fqdn_id, target_id, &candidate.source, event_id)
                        .await?;
                }
                (RecordType::Ns, Answer::Name(target)) => {
                    let target_id = graph
                        .upsert_fqdn(target, &candidate.source, event_id)
                        .await?;
                    graph
                        .upsert_ns(fqdn_id, target_id, &candidate.source, event_id)
                        .await?;
                }
                (RecordType::Mx, Answer::Name(target)) => {
                    let target_id = graph
                        .upsert_fqdn(target, &candidate.source, event_id)
                        .await?;
                    graph
                        .upsert_mx(fqdn_id, target_id, &candidate.source, event_id)
                        .await?;
                }
                (RecordType::Srv, Answer::Name(target)) => {
                    let target_id = graph
                        .upsert_fqdn(target, &candidate.source, event_id)
                        .await?;
                    graph
                        .upsert_srv(fqdn_id, target_id, &candidate.source, event_id)
                        .await?;
                }
                _ => {}
            }
        }
    }
    Ok(())
}
