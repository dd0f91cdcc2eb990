use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use surveyor_domain::errors::EngineError;
use surveyor_domain::nodes::SourceTag;

/// A name surfaced by a data source, carrying its own provenance (§4.5).
#[derive(Debug, Clone)]
pub struct FoundName {
    pub name: String,
    pub source_name: String,
    pub tag: SourceTag,
}

/// The `DataSource` port (§4.5, §9 "model each source as a variant
/// implementing a narrow capability set"). Concrete sources
/// (`StaticListSource`, `CrtShSource`, …) live in `surveyor-infrastructure`.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Declared queries-per-second ceiling; enforced by the runtime, not the
    /// source itself.
    fn rate_limit(&self) -> u32;

    fn tag(&self) -> SourceTag;

    /// Streams discovered names for `domain` until exhausted or `cancel` is
    /// triggered. Per-source failures surface as a single terminal
    /// `EngineError::DataSourceError` item rather than a panic or abort of
    /// the whole runtime.
    async fn query(
        &self,
        domain: &str,
        cancel: CancellationToken,
    ) -> BoxStream<'static, Result<FoundName, EngineError>>;
}
