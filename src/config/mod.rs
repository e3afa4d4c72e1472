use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::filters::params::{DecodePolicy, ParamKeys};

/// `[query]` block: defaults for listing commands.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct QueryConfig {
    pub default_limit: usize,
    pub decode_policy: DecodePolicy,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            decode_policy: DecodePolicy::default(),
        }
    }
}

/// Top-level vitrine config file structure.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct VitrineConfig {
    pub params: ParamKeys,
    pub query: QueryConfig,
}

impl VitrineConfig {
    /// Load config from ~/.vitrine/config.toml. Returns default if file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(VitrineConfig::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: VitrineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// The effective configuration, defaults included, as TOML.
    pub fn display(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render config")
    }
}

/// Path to the config file: ~/.vitrine/config.toml
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".vitrine").join("config.toml"))
}

/// Default config template content.
pub fn default_config_template() -> &'static str {
    r#"# ~/.vitrine/config.toml

[params]
# Query string keys. Filters repeat under `filter`.
# filter = "f"
# join = "j"
# search = "search"
# Offset pagination: skip N records, show at most M
# skip = "skip"
# take = "take"

[query]
# default_limit = 50
# What to do with a filter that fails to decode: "skip-invalid" or "strict"
# decode_policy = "skip-invalid"
"#
}

/// Create the default config file if it doesn't already exist.
pub fn init_config() -> Result<bool> {
    let path = config_path()?;
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, default_config_template())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = VitrineConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, VitrineConfig::default());
        assert_eq!(config.params.filter, "f");
        assert_eq!(config.query.decode_policy, DecodePolicy::SkipInvalid);
    }

    #[test]
    fn template_parses_to_defaults() {
        let config: VitrineConfig = toml::from_str(default_config_template()).unwrap();
        assert_eq!(config, VitrineConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let content = "[params]\njoin = \"mode\"\n\n[query]\ndecode_policy = \"strict\"\n";
        std::fs::write(&path, content).unwrap();

        let config = VitrineConfig::load_from(&path).unwrap();
        assert_eq!(config.params.join, "mode");
        assert_eq!(config.params.filter, "f");
        assert_eq!(config.query.decode_policy, DecodePolicy::Strict);
        assert_eq!(config.query.default_limit, 50);
    }
}
