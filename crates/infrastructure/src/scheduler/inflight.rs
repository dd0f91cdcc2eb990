use std::sync::atomic::{AtomicI64, Ordering};

use tokio::sync::Notify;

/// Tracks candidates in flight across the whole pipeline so a run can be
/// declared finished only once every submitted name has either been
/// dropped at a gate or has completed persistence and feedback (§4.6
/// "drains in-flight work before the run is declared finished").
pub struct Inflight {
    count: AtomicI64,
    drained: Notify,
}

impl Inflight {
    pub fn new() -> Self {
        Self {
            count: AtomicI64::new(0),
            drained: Notify::new(),
        }
    }

    pub fn submit(&self, n: i64) {
        self.count.fetch_add(n, Ordering::AcqRel);
    }

    pub fn complete(&self) {
        let prev = self.count.fetch_sub(1, Ordering::AcqRel);
        if prev <= 1 {
            self.drained.notify_waiters();
        }
    }

    pub async fn wait_drained(&self) {
        loop {
            let notified = self.drained.notified();
            if self.count.load(Ordering::Acquire) <= 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Default for Inflight {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn drains_immediately_with_nothing_submitted() {
        let inflight = Inflight::new();
        tokio::time::timeout(Duration::from_millis(50), inflight.wait_drained())
            .await
            .expect("should not block");
    }

    #[tokio::test]
    async fn waits_until_every_submitted_item_completes() {
        let inflight = Arc::new(Inflight::new());
        inflight.submit(3);

        let waiter = {
            let inflight = inflight.clone();
            tokio::spawn(async move { inflight.wait_drained().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        inflight.complete();
        inflight.complete();
        assert!(!waiter.is_finished());
        inflight.complete();

        tokio::time::timeout(Duration::from_millis(200), waiter)
            .await
            .expect("waiter should resolve once count reaches zero")
            .unwrap();
    }

    #[tokio::test]
    async fn feedback_can_resubmit_before_drain() {
        let inflight = Inflight::new();
        inflight.submit(1);
        inflight.submit(2);
        inflight.complete();
        inflight.complete();
        tokio::time::timeout(Duration::from_millis(50), inflight.wait_drained())
            .await
            .expect_err("one candidate is still in flight");
        inflight.complete();
        tokio::time::timeout(Duration::from_millis(50), inflight.wait_drained())
            .await
            .expect("all candidates completed");
    }
}
