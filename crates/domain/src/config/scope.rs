use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::names;

/// Root-domain scope and blacklist (§4.1 C1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeConfig {
    #[serde(default)]
    pub domains: Vec<String>,

    #[serde(default)]
    pub blacklist: Vec<String>,
}

impl ScopeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domains.is_empty() {
            return Err(ConfigError::EmptyScope);
        }
        Ok(())
    }

    /// `isInScope(name) → bool` (§4.1).
    pub fn is_in_scope(&self, name: &str) -> bool {
        self.domains
            .iter()
            .any(|d| names::is_subdomain_of_or_equal(name, d))
    }

    /// `isBlacklisted(name) → bool` (§4.1).
    pub fn is_blacklisted(&self, name: &str) -> bool {
        self.blacklist
            .iter()
            .any(|b| names::is_subdomain_of_or_equal(name, b))
    }

    /// `domainsInScope() → [root]` (§4.1).
    pub fn domains_in_scope(&self) -> &[String] {
        &self.domains
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> ScopeConfig {
        ScopeConfig {
            domains: vec!["example.com".into()],
            blacklist: vec!["internal.example.com".into()],
        }
    }

    #[test]
    fn in_scope_matches_root_and_subdomains() {
        let s = scope();
        assert!(s.is_in_scope("example.com"));
        assert!(s.is_in_scope("www.example.com"));
        assert!(!s.is_in_scope("example.org"));
    }

    #[test]
    fn blacklist_matches_subdomains_too() {
        let s = scope();
        assert!(s.is_blacklisted("host.internal.example.com"));
        assert!(!s.is_blacklisted("www.example.com"));
    }

    #[test]
    fn empty_scope_fails_validation() {
        assert!(ScopeConfig::default().validate().is_err());
    }
}
