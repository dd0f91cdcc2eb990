use serde::{Deserialize, Serialize};

use super::graph::GraphConfig;
use super::logging::LoggingConfig;
use super::options::EnumOptions;
use super::scope::ScopeConfig;
use super::transformations::TransformationsConfig;
use crate::errors::ConfigError;

/// The root configuration, as loaded from the YAML/INI config file and
/// overridden by CLI flags (§6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scope: ScopeConfig,

    #[serde(default)]
    pub options: EnumOptions,

    #[serde(default)]
    pub transformations: TransformationsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub graph: GraphConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scope.validate()?;
        self.options.validate()?;
        Ok(())
    }

    /// Applies CLI-flag overrides on top of a file-loaded config (§6: CLI
    /// flags take precedence over the config file for the same option).
    pub fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(domains) = overrides.domains {
            self.scope.domains.extend(domains);
        }
        if let Some(bl) = overrides.blacklist {
            self.scope.blacklist.extend(bl);
        }
        if let Some(v) = overrides.active {
            self.options.active = v;
        }
        if let Some(v) = overrides.passive {
            self.options.passive = v;
        }
        if let Some(v) = overrides.brute_force {
            self.options.brute_force = v;
        }
        if let Some(v) = overrides.alterations {
            self.options.alterations = v;
        }
        if let Some(v) = overrides.recursive {
            self.options.recursive = v;
        }
        if let Some(v) = overrides.min_for_recursive {
            self.options.min_for_recursive = v;
        }
        if let Some(v) = overrides.max_dns_queries {
            self.options.max_dns_queries = v;
        }
        if let Some(v) = overrides.include_unresolvable {
            self.options.include_unresolvable = v;
        }
        if let Some(v) = overrides.public_dns {
            self.options.public_dns = v;
        }
        if let Some(resolvers) = overrides.resolvers {
            self.options.resolvers = resolvers;
        }
        if let Some(wordlists) = overrides.wordlists {
            self.options.wordlists = wordlists;
        }
        if let Some(silent) = overrides.silent {
            self.logging.silent = silent;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }
}

/// Sparse set of CLI-flag overrides layered onto a loaded `Config`. Every
/// field is `Option` so only flags the user actually passed take effect.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub domains: Option<Vec<String>>,
    pub blacklist: Option<Vec<String>>,
    pub active: Option<bool>,
    pub passive: Option<bool>,
    pub brute_force: Option<bool>,
    pub alterations: Option<bool>,
    pub recursive: Option<bool>,
    pub min_for_recursive: Option<usize>,
    pub max_dns_queries: Option<usize>,
    pub include_unresolvable: Option<bool>,
    pub public_dns: Option<bool>,
    pub resolvers: Option<Vec<String>>,
    pub wordlists: Option<Vec<std::path::PathBuf>>,
    pub silent: Option<bool>,
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_layer_on_top_of_defaults() {
        let mut cfg = Config::default();
        cfg.scope.domains.push("example.com".into());
        let overrides = CliOverrides {
            max_dns_queries: Some(50),
            active: Some(false),
            ..Default::default()
        };
        cfg.apply_overrides(overrides);
        assert_eq!(cfg.options.max_dns_queries, 50);
        assert!(!cfg.options.active);
        assert_eq!(cfg.scope.domains, vec!["example.com".to_string()]);
    }
}
