use std::net::IpAddr;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use surveyor_application::ports::resolver::{Answer, Priority, QueryOutcome, ResolverPool};
use surveyor_domain::names;
use surveyor_domain::record_type::RecordType;

use super::candidate::{Candidate, Resolved};
use super::inflight::Inflight;

/// Resolver dispatch + confirm, merged into one worker pool (§4.6 stages
/// 4-5): each candidate holds one `max_dns_queries` permit for the whole
/// probe sequence, so the global cap bounds concurrent *names* in flight
/// rather than individual queries.
pub async fn run_worker(
    rx: Arc<Mutex<mpsc::Receiver<Candidate>>>,
    tx: mpsc::Sender<Resolved>,
    resolver: Arc<dyn ResolverPool>,
    record_types: Arc<Vec<RecordType>>,
    include_unresolvable: bool,
    permits: Arc<Semaphore>,
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
        let Some(candidate) = candidate else { return };

        let Ok(_permit) = permits.clone().acquire_owned().await else {
            inflight.complete();
            continue;
        };

        let mut ordered = record_types.as_slice().to_vec();
        if let Some(pos) = ordered.iter().position(|rt| *rt == RecordType::Cname) {
            let cname = ordered.remove(pos);
            ordered.insert(0, cname);
        }

        let mut outcomes = Vec::new();
        for rt in ordered {
            match resolver.query(&candidate.name, rt, Priority::Low).await {
                Ok(outcome) => {
                    let is_answer = matches!(outcome, QueryOutcome::Answer(_));
                    let is_cname = rt == RecordType::Cname;
                    outcomes.push((rt, outcome));
                    // CNAME short-circuits further type probes once it answers.
                    if is_cname && is_answer {
                        break;
                    }
                }
                Err(e) => {
                    trace!(name = %candidate.name, record_type = %rt, error = %e, "query failed");
                }
            }
        }

        let confirmed = include_unresolvable
            || outcomes
                .iter()
                .any(|(_, outcome)| matches!(outcome, QueryOutcome::Answer(a) if !a.is_empty()));

        if !confirmed {
            trace!(name = %candidate.name, "dropped: unconfirmed");
            inflight.complete();
            continue;
        }

        if candidate.check_static_wildcard {
            let domain = names::registered_domain(&candidate.name);
            if let Some(wildcard_addrs) = resolver.wildcard_addresses(&domain).await {
                let answer_addrs: Vec<IpAddr> = outcomes
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
                    .collect();
                if !answer_addrs.is_empty()
                    && answer_addrs.iter().all(|a| wildcard_addrs.contains(a))
                {
                    trace!(name = %candidate.name, "dropped: matches static wildcard address set");
                    inflight.complete();
                    continue;
                }
            }
        }

        if tx
            .send(Resolved {
                candidate,
                outcomes,
            })
            .await
            .is_err()
        {
            return;
        }
    }
}
