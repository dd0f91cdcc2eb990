use async_trait::async_trait;
use std::net::IpAddr;

use surveyor_domain::errors::EngineError;

/// Topics carried by the bus (§4.2). Each is a thin struct rather than a
/// free-form payload so subscribers pattern-match on `Topic` without a
/// downcast.
#[derive(Debug, Clone)]
pub enum Topic {
    NameDiscovered { name: String, source: String },
    AddressResolved { name: String, addresses: Vec<IpAddr> },
    ResolverScoreLow { resolver: String, score: u8 },
    WildcardDetected { domain: String },
    LogLine { level: tracing::Level, message: String },
}

/// The `EventBus` port (§4.2): best-effort, in-order-per-publisher delivery.
/// Implementations must never let a slow subscriber block a publisher —
/// bounded per-subscriber queues drop the oldest entry on overflow rather
/// than applying backpressure to `publish`.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Fails with `EngineError::PublishAfterClose` once the bus has been
    /// closed for shutdown.
    async fn publish(&self, topic: Topic) -> Result<(), EngineError>;

    /// Registers a new subscriber with the given bounded queue depth,
    /// returning the receiving half.
    fn subscribe(&self, queue_depth: usize) -> tokio::sync::mpsc::Receiver<Topic>;

    /// Propagates cancellation to every subscriber and rejects further
    /// publishes.
    fn close(&self);
}
