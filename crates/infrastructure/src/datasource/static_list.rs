use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use tokio_util::sync::CancellationToken;

use surveyor_application::ports::data_source::{DataSource, FoundName};
use surveyor_domain::errors::EngineError;
use surveyor_domain::nodes::SourceTag;

/// A fixed-list data source (§4.5.1): used by tests and `-demo` mode to
/// exercise the pipeline without a live network dependency. Tag is `api`,
/// matching a passive bulk-API source in the real taxonomy.
pub struct StaticListSource {
    name: String,
    names: Vec<String>,
    rate_limit: u32,
}

impl StaticListSource {
    pub fn new(name: impl Into<String>, names: Vec<String>, rate_limit: u32) -> Self {
        Self {
            name: name.into(),
            names,
            rate_limit,
        }
    }
}

#[async_trait]
impl DataSource for StaticListSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "in-memory fixed name list, for tests and -demo mode"
    }

    fn rate_limit(&self) -> u32 {
        self.rate_limit
    }

    fn tag(&self) -> SourceTag {
        SourceTag::Api
    }

    async fn query(
        &self,
        domain: &str,
        _cancel: CancellationToken,
    ) -> BoxStream<'static, Result<FoundName, EngineError>> {
        let source_name = self.name.clone();
        let matching: Vec<Result<FoundName, EngineError>> = self
            .names
            .iter()
            .filter(|n| n.ends_with(domain))
            .map(|n| {
                Ok(FoundName {
                    name: n.clone(),
                    source_name: source_name.clone(),
                    tag: SourceTag::Api,
                })
            })
            .collect();
        stream::iter(matching).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn only_emits_names_under_requested_domain() {
        let source = StaticListSource::new(
            "fixtures",
            vec![
                "www.example.com".to_string(),
                "api.example.com".to_string(),
                "other.org".to_string(),
            ],
            100,
        );
        let mut stream = source.query("example.com", CancellationToken::new()).await;
        let mut seen = Vec::new();
        while let Some(item) = stream.next().await {
            seen.push(item.unwrap().name);
        }
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|n| n.ends_with("example.com")));
    }
}
