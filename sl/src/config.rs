//! Configuration for bundled sources

use std::path::Path;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for a [`PassThrough`](crate::PassThrough) source (from YAML)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Label attached to every log line the source emits
    #[serde(default = "default_name")]
    pub name: String,

    /// Capacity of the notification channel shared by all subscribers
    ///
    /// Readable notifications are coalesced, so this only needs to cover bursts
    /// of faults and terminal events. A subscriber that falls further behind
    /// observes a lag, which the loop driver treats as a readable notification.
    #[serde(default = "default_notify_capacity")]
    pub notify_capacity: usize,
}

fn default_name() -> String {
    debug!("default_name: called");
    "passthrough".to_string()
}

fn default_notify_capacity() -> usize {
    debug!("default_notify_capacity: called");
    crate::DEFAULT_NOTIFY_CAPACITY
}

impl Default for SourceConfig {
    fn default() -> Self {
        debug!("SourceConfig::default: called");
        Self {
            name: default_name(),
            notify_capacity: default_notify_capacity(),
        }
    }
}

impl SourceConfig {
    /// Create a config with the given name and default capacity
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse a config from a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        debug!("SourceConfig::from_yaml: called");
        let config: SourceConfig = serde_yaml::from_str(content).context("Failed to parse source config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        debug!(?path, "SourceConfig::load: called");
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Save config to a YAML file
    pub fn save(&self, path: &Path) -> Result<()> {
        debug!(?path, "SourceConfig::save: called");
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content).context(format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        // tokio's broadcast channel panics on a zero capacity
        if self.notify_capacity == 0 {
            eyre::bail!("notify_capacity must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SourceConfig::default();

        assert_eq!(config.name, "passthrough");
        assert_eq!(config.notify_capacity, crate::DEFAULT_NOTIFY_CAPACITY);
    }

    #[test]
    fn test_deserialize_minimal() {
        let config = SourceConfig::from_yaml("name: stdin\n").unwrap();

        assert_eq!(config.name, "stdin");
        assert_eq!(config.notify_capacity, crate::DEFAULT_NOTIFY_CAPACITY);
    }

    #[test]
    fn test_deserialize_full() {
        let yaml = r#"
name: request
notify_capacity: 8
"#;
        let config = SourceConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.name, "request");
        assert_eq!(config.notify_capacity, 8);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = SourceConfig::from_yaml("notify_capacity: 0\n").unwrap_err();
        assert!(err.to_string().contains("notify_capacity"));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("source.yml");

        let config = SourceConfig {
            name: "saved".to_string(),
            notify_capacity: 16,
        };
        config.save(&path).unwrap();

        let loaded = SourceConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let err = SourceConfig::load(&temp_dir.path().join("missing.yml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
