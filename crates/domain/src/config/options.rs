use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::ConfigError;
use crate::record_type::RecordType;

/// `include` xor `exclude` data-source name filter (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFilter {
    Include(Vec<String>),
    Exclude(Vec<String>),
    None,
}

impl Default for SourceFilter {
    fn default() -> Self {
        SourceFilter::None
    }
}

impl SourceFilter {
    /// Resolves whether a named source should run, applying §4.5's
    /// mutually-exclusive include/exclude rule.
    pub fn allows(&self, source_name: &str) -> bool {
        match self {
            SourceFilter::Include(names) => names.iter().any(|n| n == source_name),
            SourceFilter::Exclude(names) => !names.iter().any(|n| n == source_name),
            SourceFilter::None => true,
        }
    }
}

/// The exhaustive recognized-option set from §4.1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumOptions {
    #[serde(default = "default_max_dns_queries")]
    pub max_dns_queries: usize,

    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u64,

    #[serde(default = "default_record_types")]
    pub record_types: Vec<RecordType>,

    #[serde(default = "default_true")]
    pub brute_force: bool,

    #[serde(default = "default_true")]
    pub alterations: bool,

    #[serde(default = "default_true")]
    pub recursive: bool,

    #[serde(default = "default_min_for_recursive")]
    pub min_for_recursive: usize,

    #[serde(default = "default_true")]
    pub passive: bool,

    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default)]
    pub public_dns: bool,

    #[serde(default)]
    pub monitor_resolver_rate: bool,

    #[serde(default = "default_true")]
    pub score_resolvers: bool,

    #[serde(default)]
    pub include_unresolvable: bool,

    #[serde(default)]
    pub source_filter: SourceFilter,

    #[serde(default)]
    pub wordlists: Vec<PathBuf>,

    #[serde(default)]
    pub alt_wordlist: Vec<PathBuf>,

    #[serde(default)]
    pub resolvers: Vec<String>,
}

impl Default for EnumOptions {
    fn default() -> Self {
        Self {
            max_dns_queries: default_max_dns_queries(),
            timeout_minutes: default_timeout_minutes(),
            record_types: default_record_types(),
            brute_force: true,
            alterations: true,
            recursive: true,
            min_for_recursive: default_min_for_recursive(),
            passive: true,
            active: true,
            public_dns: false,
            monitor_resolver_rate: false,
            score_resolvers: true,
            include_unresolvable: false,
            source_filter: SourceFilter::None,
            wordlists: Vec::new(),
            alt_wordlist: Vec::new(),
            resolvers: Vec::new(),
        }
    }
}

impl EnumOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let SourceFilter::Include(inc) = &self.source_filter {
            if inc.is_empty() {
                // An empty include list degrades to "run nothing", which is
                // legal but surprising; treat as "no filter" instead.
            }
        }
        if self.max_dns_queries == 0 {
            return Err(ConfigError::InvalidOption {
                option: "max-dns-queries".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

fn default_max_dns_queries() -> usize {
    250
}

fn default_timeout_minutes() -> u64 {
    10
}

fn default_min_for_recursive() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_record_types() -> Vec<RecordType> {
    RecordType::default_order().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_filter_allows_only_named_sources() {
        let f = SourceFilter::Include(vec!["crtsh".into()]);
        assert!(f.allows("crtsh"));
        assert!(!f.allows("shodan"));
    }

    #[test]
    fn exclude_filter_blocks_named_sources() {
        let f = SourceFilter::Exclude(vec!["shodan".into()]);
        assert!(f.allows("crtsh"));
        assert!(!f.allows("shodan"));
    }

    #[test]
    fn rejects_zero_max_dns_queries() {
        let mut opts = EnumOptions::default();
        opts.max_dns_queries = 0;
        assert!(opts.validate().is_err());
    }
}
