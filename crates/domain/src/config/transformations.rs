use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per asset-type TTL and priority override (§6 config file,
/// `transformations` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transformation {
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u32,

    #[serde(default = "default_priority")]
    pub priority: u8,
}

impl Default for Transformation {
    fn default() -> Self {
        Self {
            ttl_minutes: default_ttl_minutes(),
            priority: default_priority(),
        }
    }
}

fn default_ttl_minutes() -> u32 {
    1440
}

fn default_priority() -> u8 {
    5
}

/// Map of asset-type name (e.g. "fqdn", "netblock", "asn") to its
/// transformation rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformationsConfig {
    #[serde(flatten)]
    pub rules: HashMap<String, Transformation>,
}

impl TransformationsConfig {
    pub fn for_asset(&self, asset_type: &str) -> Transformation {
        self.rules.get(asset_type).cloned().unwrap_or_default()
    }
}
