use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashSet;
use rustc_hash::FxBuildHasher;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use surveyor_domain::config::ScopeConfig;

use super::candidate::Candidate;
use super::inflight::Inflight;

/// Ingress dedup + scope gate, merged into one worker loop since both
/// checks are cheap synchronous predicates (§4.6 stages 1-2). `paused`
/// suspends acceptance of new items without losing ones already in flight.
pub async fn run(
    mut rx: mpsc::Receiver<Candidate>,
    tx: mpsc::Sender<Candidate>,
    scope: Arc<ScopeConfig>,
    seen: Arc<DashSet<String, FxBuildHasher>>,
    paused: Arc<AtomicBool>,
    resume_notify: Arc<Notify>,
    cancel: CancellationToken,
    inflight: Arc<Inflight>,
) {
    loop {
        if paused.load(Ordering::Acquire) {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = resume_notify.notified() => {}
            }
            continue;
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            item = rx.recv() => {
                let Some(candidate) = item else { return };
                if !seen.insert(candidate.name.clone()) {
                    trace!(name = %candidate.name, "dropped: already seen");
                    inflight.complete();
                    continue;
                }
                if !scope.is_in_scope(&candidate.name) || scope.is_blacklisted(&candidate.name) {
                    trace!(name = %candidate.name, "dropped: out of scope or blacklisted");
                    inflight.complete();
                    continue;
                }
                if tx.send(candidate).await.is_err() {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surveyor_domain::nodes::{Source, SourceTag};
    use std::time::Duration;

    fn scope(domains: &[&str], blacklist: &[&str]) -> Arc<ScopeConfig> {
        Arc::new(ScopeConfig {
            domains: domains.iter().map(|s| s.to_string()).collect(),
            blacklist: blacklist.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        })
    }

    fn candidate(name: &str) -> Candidate {
        Candidate::new(
            name,
            Source {
                name: "test".to_string(),
                tag: SourceTag::Dns,
            },
        )
    }

    async fn run_with(
        scope: Arc<ScopeConfig>,
        inputs: Vec<Candidate>,
    ) -> (Vec<Candidate>, Arc<Inflight>) {
        let (tx_in, rx_in) = mpsc::channel(16);
        let (tx_out, mut rx_out) = mpsc::channel(16);
        let seen = Arc::new(DashSet::with_hasher(FxBuildHasher));
        let paused = Arc::new(AtomicBool::new(false));
        let resume = Arc::new(Notify::new());
        let cancel = CancellationToken::new();
        let inflight = Arc::new(Inflight::new());
        inflight.submit(inputs.len() as i64);

        let handle = tokio::spawn(run(
            rx_in,
            tx_out,
            scope,
            seen,
            paused,
            resume,
            cancel.clone(),
            inflight.clone(),
        ));

        for c in inputs {
            tx_in.send(c).await.unwrap();
        }
        drop(tx_in);

        let mut accepted = Vec::new();
        while let Some(c) = rx_out.recv().await {
            accepted.push(c);
        }
        handle.await.unwrap();
        (accepted, inflight)
    }

    #[tokio::test]
    async fn duplicate_names_are_dropped_after_the_first() {
        let scope = scope(&["example.com"], &[]);
        let (accepted, inflight) = run_with(
            scope,
            vec![candidate("www.example.com"), candidate("www.example.com")],
        )
        .await;
        assert_eq!(accepted.len(), 1);
        tokio::time::timeout(Duration::from_millis(50), inflight.wait_drained())
            .await
            .expect("both dropped or forwarded items must complete inflight");
    }

    #[tokio::test]
    async fn out_of_scope_names_are_dropped() {
        let scope = scope(&["example.com"], &[]);
        let (accepted, _inflight) = run_with(scope, vec![candidate("evil.org")]).await;
        assert!(accepted.is_empty());
    }

    #[tokio::test]
    async fn blacklisted_names_are_dropped_even_in_scope() {
        let scope = scope(&["example.com"], &["internal.example.com"]);
        let (accepted, _inflight) = run_with(
            scope,
            vec![candidate("host.internal.example.com"), candidate("www.example.com")],
        )
        .await;
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].name, "www.example.com");
    }
}
