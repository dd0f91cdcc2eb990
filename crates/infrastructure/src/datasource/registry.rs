use std::sync::Arc;

use surveyor_application::ports::data_source::DataSource;
use surveyor_domain::config::SourceFilter;

/// Holds every in-tree `DataSource`; the include/exclude filter is applied
/// here, at registry resolution, not per-query (§9 "Dynamic dispatch across
/// data sources").
pub struct Registry {
    sources: Vec<Arc<dyn DataSource>>,
}

impl Registry {
    pub fn new(sources: Vec<Arc<dyn DataSource>>) -> Self {
        Self { sources }
    }

    pub fn resolve(&self, filter: &SourceFilter) -> Vec<Arc<dyn DataSource>> {
        self.sources
            .iter()
            .filter(|s| filter.allows(s.name()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::static_list::StaticListSource;

    fn registry() -> Registry {
        Registry::new(vec![
            Arc::new(StaticListSource::new("alpha", vec![], 10)),
            Arc::new(StaticListSource::new("beta", vec![], 10)),
        ])
    }

    #[test]
    fn include_filter_narrows_to_named_sources() {
        let resolved = registry().resolve(&SourceFilter::Include(vec!["alpha".to_string()]));
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name(), "alpha");
    }

    #[test]
    fn no_filter_returns_everything() {
        assert_eq!(registry().resolve(&SourceFilter::None).len(), 2);
    }
}
