use serde::{Deserialize, Serialize};

/// On-disk graph layout (§6): a directory holding an embedded store, or a
/// SQL connection string. The engine only ever sees the `Graph` port
/// (crate `surveyor-application`); this struct is just enough to locate
/// and open the configured back-end from the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_dir")]
    pub dir: String,

    /// When set, overrides `dir` with a SQL connection string
    /// (e.g. "postgres://...").
    #[serde(default)]
    pub connection: Option<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            connection: None,
        }
    }
}

fn default_dir() -> String {
    "./.surveyor".to_string()
}
