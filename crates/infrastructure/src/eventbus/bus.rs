use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};

use surveyor_application::ports::event_bus::{EventBus, Topic};
use surveyor_domain::errors::EngineError;

/// A subscriber's mailbox: a small bounded ring buffer guarded by a mutex
/// rather than a raw `mpsc::Sender`, so `publish` can drop the oldest entry
/// on overflow instead of blocking (§4.2). A background task drains the
/// ring into the `mpsc::Receiver` the caller actually holds, grounded on the
/// teacher's fire-and-forget `QueryEventEmitter` (the bounded ring plays the
/// role the unbounded channel plays there, adapted for the drop-oldest
/// requirement the port adds).
struct Mailbox {
    queue: Mutex<VecDeque<Topic>>,
    capacity: usize,
    notify: Notify,
    alive: AtomicBool,
}

/// In-process multi-topic event bus (§4.2 `EventBus` port).
pub struct Bus {
    subscribers: Mutex<std::collections::HashMap<u64, Arc<Mailbox>>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(std::collections::HashMap::new()),
            next_id: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for Bus {
    async fn publish(&self, topic: Topic) -> Result<(), EngineError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(EngineError::PublishAfterClose);
        }
        let subscribers = self.subscribers.lock().unwrap();
        for mailbox in subscribers.values() {
            if !mailbox.alive.load(Ordering::Acquire) {
                continue;
            }
            let mut queue = mailbox.queue.lock().unwrap();
            if queue.len() >= mailbox.capacity {
                queue.pop_front();
            }
            queue.push_back(topic.clone());
            drop(queue);
            mailbox.notify.notify_one();
        }
        Ok(())
    }

    fn subscribe(&self, queue_depth: usize) -> mpsc::Receiver<Topic> {
        let capacity = queue_depth.max(1);
        let mailbox = Arc::new(Mailbox {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            notify: Notify::new(),
            alive: AtomicBool::new(true),
        });

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().unwrap().insert(id, Arc::clone(&mailbox));

        let (tx, rx) = mpsc::channel(capacity);
        tokio::spawn(async move {
            loop {
                mailbox.notify.notified().await;
                loop {
                    let item = mailbox.queue.lock().unwrap().pop_front();
                    match item {
                        Some(topic) => {
                            if tx.send(topic).await.is_err() {
                                mailbox.alive.store(false, Ordering::Release);
                                return;
                            }
                        }
                        None => break,
                    }
                }
            }
        });

        rx
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        let subscribers = self.subscribers.lock().unwrap();
        for mailbox in subscribers.values() {
            mailbox.alive.store(false, Ordering::Release);
            mailbox.notify.notify_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_topics() {
        let bus = Bus::new();
        let mut rx = bus.subscribe(4);
        bus.publish(Topic::WildcardDetected {
            domain: "example.com".to_string(),
        })
        .await
        .unwrap();

        let received = rx.recv().await.unwrap();
        assert!(matches!(received, Topic::WildcardDetected { domain } if domain == "example.com"));
    }

    #[tokio::test]
    async fn publish_after_close_errors() {
        let bus = Bus::new();
        bus.close();
        let result = bus
            .publish(Topic::WildcardDetected {
                domain: "example.com".to_string(),
            })
            .await;
        assert!(matches!(result, Err(EngineError::PublishAfterClose)));
    }

    #[tokio::test]
    async fn overflow_drops_oldest_not_newest() {
        let bus = Bus::new();
        let mut rx = bus.subscribe(1);
        for i in 0..3 {
            bus.publish(Topic::ResolverScoreLow {
                resolver: format!("r{i}"),
                score: i as u8,
            })
            .await
            .unwrap();
        }
        // give the forwarder a chance to drain before we push more would be
        // racy without yielding; inspect via recv with a short wait instead.
        let received = tokio::time::timeout(std::time::Duration::from_millis(200), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match received {
            Topic::ResolverScoreLow { resolver, .. } => {
                assert!(resolver == "r0" || resolver == "r2", "unexpected: {resolver}");
            }
            _ => panic!("wrong topic"),
        }
    }
}
