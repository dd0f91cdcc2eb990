use std::path::{Path, PathBuf};

use surveyor_domain::config::{CliOverrides, Config};
use tracing::info;

/// Loads the config file (YAML or TOML, chosen by extension) from
/// `-config`, or `<dir>/config.yaml` when `-config` is unset, then layers
/// CLI overrides on top and validates (§6).
pub fn load_config(
    config_path: Option<&Path>,
    dir: &Path,
    overrides: CliOverrides,
) -> anyhow::Result<Config> {
    let path = resolve_config_path(config_path, dir);
    let mut config = match path {
        Some(path) => read_config_file(&path)?,
        None => Config::default(),
    };

    config.apply_overrides(overrides);
    config.validate()?;

    info!(
        domains = config.scope.domains.len(),
        max_dns_queries = config.options.max_dns_queries,
        "configuration loaded"
    );
    Ok(config)
}

fn resolve_config_path(config_path: Option<&Path>, dir: &Path) -> Option<PathBuf> {
    if let Some(path) = config_path {
        return Some(path.to_path_buf());
    }
    for candidate in ["config.yaml", "config.yml", "config.toml"] {
        let candidate = dir.join(candidate);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

fn read_config_file(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        surveyor_domain::errors::ConfigError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
    })?;

    let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
    let config = if is_toml {
        toml::from_str(&contents)
    } else {
        return serde_yaml::from_str(&contents)
            .map_err(|e| {
                surveyor_domain::errors::ConfigError::ParseFailed {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }
                .into()
            });
    }
    .map_err(|e: toml::de::Error| surveyor_domain::errors::ConfigError::ParseFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_config_falls_back_to_defaults_plus_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = CliOverrides {
            domains: Some(vec!["example.com".to_string()]),
            ..Default::default()
        };
        let config = load_config(None, dir.path(), overrides).unwrap();
        assert_eq!(config.scope.domains, vec!["example.com".to_string()]);
    }

    #[test]
    fn reads_yaml_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "scope:\n  domains:\n    - example.com\n").unwrap();

        let config = load_config(None, dir.path(), CliOverrides::default()).unwrap();
        assert_eq!(config.scope.domains, vec!["example.com".to_string()]);
    }
}
