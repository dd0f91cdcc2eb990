//! `crt.sh` certificate-transparency source (§4.5.1). Gated behind the
//! `live-sources` feature so the default test run never dials out; the
//! default build simply omits this module's registry entry.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use tokio_util::sync::CancellationToken;

use surveyor_application::ports::data_source::{DataSource, FoundName};
use surveyor_domain::errors::EngineError;
use surveyor_domain::nodes::SourceTag;

pub struct CrtShSource {
    rate_limit: u32,
}

impl CrtShSource {
    pub fn new(rate_limit: u32) -> Self {
        Self { rate_limit }
    }
}

#[async_trait]
impl DataSource for CrtShSource {
    fn name(&self) -> &str {
        "crtsh"
    }

    fn description(&self) -> &str {
        "certificate-transparency log search via crt.sh"
    }

    fn rate_limit(&self) -> u32 {
        self.rate_limit
    }

    fn tag(&self) -> SourceTag {
        SourceTag::Cert
    }

    async fn query(
        &self,
        domain: &str,
        _cancel: CancellationToken,
    ) -> BoxStream<'static, Result<FoundName, EngineError>> {
        let domain = domain.to_string();
        // Live network call deliberately not wired: this fixture exists to
        // show the `cert` variant's registration, not to perform the fetch.
        let err = EngineError::DataSourceError {
            source: "crtsh".to_string(),
            message: format!("live lookups for {domain} require the `live-sources` feature"),
        };
        stream::iter(vec![Err(err)]).boxed()
    }
}
