use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use rustc_hash::FxBuildHasher;
use tokio::sync::{mpsc, Mutex, Notify, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use surveyor_application::ports::event_bus::EventBus;
use surveyor_application::ports::graph::Graph;
use surveyor_application::ports::resolver::ResolverPool;
use surveyor_domain::config::{Config, ScopeConfig};
use surveyor_domain::errors::EngineError;

use super::candidate::Candidate;
use super::inflight::Inflight;
use super::persist::{FeedbackConfig, RecursiveCounts};
use super::{dispatch, gate, persist, wildcard};
use crate::namegen::NameGenerator;

const CHANNEL_CAPACITY_FLOOR: usize = 64;
const WILDCARD_WORKERS: usize = 8;
const DISPATCH_WORKERS: usize = 32;

/// Wires together the ingress/scope-gate, wildcard-probe, resolver-dispatch,
/// and persist/feedback stages into one bounded-channel pipeline
/// (§4.6), grounded on the teacher's `JobRunner` orchestrator shape —
/// each stage is `tokio::spawn`ed independently and shares one
/// `CancellationToken`.
pub struct Scheduler {
    graph: Arc<dyn Graph>,
    resolver: Arc<dyn ResolverPool>,
    event_bus: Arc<dyn EventBus>,
    name_generator: Arc<NameGenerator>,
    brute_wordlist: Arc<Vec<String>>,
    cancel: CancellationToken,
    paused: Arc<AtomicBool>,
    resume_notify: Arc<Notify>,
}

impl Scheduler {
    pub fn new(
        graph: Arc<dyn Graph>,
        resolver: Arc<dyn ResolverPool>,
        event_bus: Arc<dyn EventBus>,
        name_generator: Arc<NameGenerator>,
        brute_wordlist: Vec<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            graph,
            resolver,
            event_bus,
            name_generator,
            brute_wordlist: Arc::new(brute_wordlist),
            cancel,
            paused: Arc::new(AtomicBool::new(false)),
            resume_notify: Arc::new(Notify::new()),
        }
    }

    pub fn pause(&self) {
        self.paused.store(true, std::sync::atomic::Ordering::Release);
    }

    pub fn resume(&self) {
        self.paused.store(false, std::sync::atomic::Ordering::Release);
        self.resume_notify.notify_waiters();
    }

    /// Runs one enumeration event to completion: seeds `initial` into the
    /// pipeline, waits for every in-flight name to drain or the wall-clock
    /// deadline to expire, then finalizes the event. Returns the event id.
    pub async fn run(
        &self,
        config: &Config,
        initial: Vec<Candidate>,
    ) -> Result<Uuid, EngineError> {
        let event_id = Uuid::new_v4();
        self.graph.insert_event(event_id).await?;

        let capacity = config.options.max_dns_queries.max(CHANNEL_CAPACITY_FLOOR);
        let (ingress_tx, ingress_rx) = mpsc::channel::<Candidate>(capacity);
        let (gated_tx, gated_rx) = mpsc::channel::<Candidate>(capacity);
        let (probed_tx, probed_rx) = mpsc::channel::<Candidate>(capacity);
        let (resolved_tx, resolved_rx) = mpsc::channel(capacity);

        let seen: Arc<DashSet<String, FxBuildHasher>> =
            Arc::new(DashSet::with_hasher(FxBuildHasher));
        let inflight = Arc::new(Inflight::new());
        let scope = Arc::new(config.scope.clone());
        let permits = Arc::new(Semaphore::new(config.options.max_dns_queries));
        let record_types = Arc::new(config.options.record_types.clone());
        let recursive_counts: Arc<RecursiveCounts> =
            Arc::new(dashmap::DashMap::with_hasher(FxBuildHasher));

        tokio::spawn(gate::run(
            ingress_rx,
            gated_tx,
            Arc::clone(&scope),
            Arc::clone(&seen),
            Arc::clone(&self.paused),
            Arc::clone(&self.resume_notify),
            self.cancel.clone(),
            Arc::clone(&inflight),
        ));

        let gated_rx = Arc::new(Mutex::new(gated_rx));
        for _ in 0..WILDCARD_WORKERS {
            tokio::spawn(wildcard::run_worker(
                Arc::clone(&gated_rx),
                probed_tx.clone(),
                Arc::clone(&self.resolver),
                self.cancel.clone(),
                Arc::clone(&inflight),
            ));
        }
        drop(probed_tx);

        let probed_rx = Arc::new(Mutex::new(probed_rx));
        for _ in 0..DISPATCH_WORKERS {
            tokio::spawn(dispatch::run_worker(
                Arc::clone(&probed_rx),
                resolved_tx.clone(),
                Arc::clone(&self.resolver),
                Arc::clone(&record_types),
                config.options.include_unresolvable,
                Arc::clone(&permits),
                self.cancel.clone(),
                Arc::clone(&inflight),
            ));
        }
        drop(resolved_tx);

        let feedback_config = FeedbackConfig {
            event_id,
            alterations_enabled: config.options.alterations,
            recursive_enabled: config.options.recursive,
            min_for_recursive: config.options.min_for_recursive,
            brute_wordlist: Arc::clone(&self.brute_wordlist),
        };
        tokio::spawn(persist::run(
            resolved_rx,
            ingress_tx.clone(),
            Arc::clone(&self.graph),
            Arc::clone(&self.event_bus),
            Arc::clone(&self.name_generator),
            recursive_counts,
            feedback_config,
            self.cancel.clone(),
            Arc::clone(&inflight),
        ));

        inflight.submit(initial.len() as i64);
        for candidate in initial {
            if ingress_tx.send(candidate).await.is_err() {
                break;
            }
        }
        drop(ingress_tx);

        let deadline = Duration::from_secs(config.options.timeout_minutes * 60);
        tokio::select! {
            _ = inflight.wait_drained() => {
                info!(event = %event_id, "enumeration drained");
            }
            _ = tokio::time::sleep(deadline) => {
                info!(event = %event_id, "enumeration hit wall-clock deadline");
                self.cancel.cancel();
            }
            _ = self.cancel.cancelled() => {
                info!(event = %event_id, "enumeration cancelled");
            }
        }

        self.graph.finish_event(event_id).await?;
        Ok(event_id)
    }
}

/// Builds the brute-force candidate set for the initial scope domains
/// (§4.6 producer "brute-force expansion of each scope domain against the
/// wordlist").
pub fn seed_brute_force(
    scope: &ScopeConfig,
    wordlist: &[String],
    source: surveyor_domain::nodes::Source,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    for domain in scope.domains_in_scope() {
        for word in wordlist {
            out.push(Candidate::new(format!("{word}.{domain}"), source.clone()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use surveyor_domain::nodes::SourceTag;

    #[test]
    fn seed_brute_force_combines_every_word_with_every_domain() {
        let scope = ScopeConfig {
            domains: vec!["example.com".to_string(), "example.net".to_string()],
            blacklist: Vec::new(),
        };
        let wordlist = vec!["www".to_string(), "mail".to_string()];
        let source = surveyor_domain::nodes::Source {
            name: "bruteforce".to_string(),
            tag: SourceTag::Dns,
        };

        let seeded = seed_brute_force(&scope, &wordlist, source);
        let names: Vec<&str> = seeded.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(seeded.len(), 4);
        assert!(names.contains(&"www.example.com"));
        assert!(names.contains(&"mail.example.com"));
        assert!(names.contains(&"www.example.net"));
        assert!(names.contains(&"mail.example.net"));
    }

    #[test]
    fn seed_brute_force_empty_wordlist_yields_nothing() {
        let scope = ScopeConfig {
            domains: vec!["example.com".to_string()],
            blacklist: Vec::new(),
        };
        let source = surveyor_domain::nodes::Source {
            name: "bruteforce".to_string(),
            tag: SourceTag::Dns,
        };
        assert!(seed_brute_force(&scope, &[], source).is_empty());
    }
}
