use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Score floor below which a resolver is quarantined and only reachable via
/// periodic sanity probes (§4.3).
const QUARANTINE_FLOOR: u32 = 20;
const QUARANTINE_DURATION: Duration = Duration::from_secs(30);

/// Per-resolver counters and reliability score (§4.3 "State per resolver").
/// The rate limiter is the teacher's own manual atomic/interval idiom rather
/// than a token-bucket crate: a per-resolver `AtomicI64` holding the
/// monotonic-nanos timestamp of the next permitted send, advanced with a
/// `fetch_max`-style compare loop.
pub struct ResolverState {
    pub address: SocketAddr,
    pub qps_limit: u32,
    started_at: Instant,
    next_slot_nanos: AtomicI64,
    interval_nanos: i64,

    rtt_ewma_micros: AtomicU64,
    sent: AtomicU64,
    succeeded: AtomicU64,
    timeouts: AtomicU64,
    servfail: AtomicU64,
    refused: AtomicU64,
    score: AtomicU32,
    quarantined_until: Mutex<Option<Instant>>,
}

impl ResolverState {
    pub fn new(address: SocketAddr, qps_limit: u32) -> Self {
        let qps_limit = qps_limit.max(1);
        Self {
            address,
            qps_limit,
            started_at: Instant::now(),
            next_slot_nanos: AtomicI64::new(0),
            interval_nanos: (1_000_000_000i64 / qps_limit as i64).max(1),
            rtt_ewma_micros: AtomicU64::new(0),
            sent: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            servfail: AtomicU64::new(0),
            refused: AtomicU64::new(0),
            score: AtomicU32::new(100),
            quarantined_until: Mutex::new(None),
        }
    }

    /// Blocks the caller until this resolver's rate limiter admits a new
    /// request.
    pub async fn acquire_slot(&self) {
        loop {
            let now_nanos = self.started_at.elapsed().as_nanos() as i64;
            let slot = self
                .next_slot_nanos
                .fetch_max(now_nanos, Ordering::SeqCst)
                .max(now_nanos);
            let claimed = self
                .next_slot_nanos
                .compare_exchange(
                    slot,
                    slot + self.interval_nanos,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                )
                .is_ok();
            if claimed {
                let wait = slot - now_nanos;
                if wait > 0 {
                    tokio::time::sleep(Duration::from_nanos(wait as u64)).await;
                }
                return;
            }
        }
    }

    pub fn is_quarantined(&self) -> bool {
        match *self.quarantined_until.lock().unwrap() {
            Some(until) => Instant::now() < until,
            None => false,
        }
    }

    pub fn record_success(&self, rtt: Duration) {
        self.sent.fetch_add(1, Ordering::Relaxed);
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        self.update_rtt(rtt);
        self.bump_score(5);
    }

    pub fn record_timeout(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
        self.timeouts.fetch_add(1, Ordering::Relaxed);
        self.decay_score(15);
    }

    pub fn record_servfail(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
        self.servfail.fetch_add(1, Ordering::Relaxed);
        self.decay_score(10);
    }

    pub fn record_refused(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
        self.refused.fetch_add(1, Ordering::Relaxed);
        self.decay_score(10);
    }

    pub fn score(&self) -> u32 {
        self.score.load(Ordering::Relaxed)
    }

    fn bump_score(&self, amount: u32) {
        let _ = self
            .score
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| {
                Some((s + amount).min(100))
            });
    }

    fn decay_score(&self, amount: u32) {
        let new = self
            .score
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| {
                Some(s.saturating_sub(amount))
            })
            .unwrap_or(0)
            .saturating_sub(amount);
        if new < QUARANTINE_FLOOR {
            *self.quarantined_until.lock().unwrap() = Some(Instant::now() + QUARANTINE_DURATION);
        }
    }

    fn update_rtt(&self, rtt: Duration) {
        let sample = rtt.as_micros() as u64;
        let _ = self
            .rtt_ewma_micros
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |prev| {
                Some(if prev == 0 {
                    sample
                } else {
                    (prev * 7 + sample * 3) / 10
                })
            });
    }

    pub fn rtt_ewma(&self) -> Duration {
        Duration::from_micros(self.rtt_ewma_micros.load(Ordering::Relaxed))
    }

    /// Clears quarantine so the periodic sanity prober can re-admit this
    /// resolver after a successful probe.
    pub fn clear_quarantine(&self) {
        *self.quarantined_until.lock().unwrap() = None;
        self.score.store(50, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_decays_below_floor_quarantines() {
        let state = ResolverState::new("127.0.0.1:53".parse().unwrap(), 10);
        for _ in 0..10 {
            state.record_timeout();
        }
        assert!(state.is_quarantined());
        assert!(state.score() < QUARANTINE_FLOOR);
    }

    #[test]
    fn success_raises_score_back_up() {
        let state = ResolverState::new("127.0.0.1:53".parse().unwrap(), 10);
        state.record_timeout();
        let after_timeout = state.score();
        state.record_success(Duration::from_millis(20));
        assert!(state.score() > after_timeout);
    }
}
