use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use surveyor_application::ports::resolver::{ResolverPool, WildcardType};
use surveyor_domain::names;

use super::candidate::Candidate;
use super::inflight::Inflight;

/// Wildcard probe stage (§4.6 stage 3). Runs as a worker pool behind a
/// shared receiver since `wildcard_type` is an async resolver round trip;
/// `dynamic` domains drop here, `static` domains are tagged for the
/// dispatch stage to filter by address-set comparison.
pub async fn run_worker(
    rx: Arc<Mutex<mpsc::Receiver<Candidate>>>,
    tx: mpsc::Sender<Candidate>,
    resolver: Arc<dyn ResolverPool>,
    cancel: CancellationToken,
    inflight: Arc<Inflight>,
) {
    loop {
        let candidate = {
            let mut guard = rx.lock().await;
            tokio::select! {
                _ = cancel.cancelled() => return,
                item = guard.recv() => item,
            }
        };
        let Some(mut candidate) = candidate else { return };

        let domain = names::registered_domain(&candidate.name);
        match resolver.wildcard_type(&domain).await {
            Ok(WildcardType::Dynamic) => {
                trace!(name = %candidate.name, "dropped: dynamic wildcard domain");
                inflight.complete();
                continue;
            }
            Ok(WildcardType::Static) => {
                candidate.check_static_wildcard = true;
            }
            Ok(WildcardType::None) => {}
            Err(e) => {
                trace!(name = %candidate.name, error = %e, "wildcard probe failed, proceeding unfiltered");
            }
        }

        if tx.send(candidate).await.is_err() {
            return;
        }
    }
}
