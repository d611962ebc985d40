//! Engine configuration
//!
//! Loaded from `{config_dir}/snippet-search/config.json` when present, otherwise defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tunables for the index cache and matcher strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Index age after which the next read triggers a rebuild
    pub staleness_minutes: u64,
    /// Upper bound on tenants held in the cache (LRU eviction beyond this)
    pub max_cached_tenants: usize,
    /// Tenants untouched for this long are dropped from the cache
    pub tenant_idle_ttl_minutes: u64,
    pub default_limit: usize,
    pub suggestion_limit: usize,
    /// Fuzzy ratio floor (0-100)
    pub fuzzy_threshold: u8,
    pub max_matches_per_result: usize,
    /// Characters of context on each side of a preview hit
    pub preview_context_chars: usize,
    /// Compiled program size limit for user regexes, in bytes
    pub regex_size_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            staleness_minutes: 30,
            max_cached_tenants: 256,
            tenant_idle_ttl_minutes: 120,
            default_limit: 50,
            suggestion_limit: 10,
            fuzzy_threshold: 60,
            max_matches_per_result: 10,
            preview_context_chars: 50,
            regex_size_limit: 1 << 20,
        }
    }
}

impl EngineConfig {
    pub fn staleness(&self) -> Duration {
        Duration::from_secs(self.staleness_minutes * 60)
    }

    pub fn tenant_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.tenant_idle_ttl_minutes * 60)
    }

    /// Override the staleness window
    pub fn with_staleness_minutes(mut self, minutes: u64) -> Self {
        self.staleness_minutes = minutes;
        self
    }

    /// Override the tenant capacity
    pub fn with_max_cached_tenants(mut self, capacity: usize) -> Self {
        self.max_cached_tenants = capacity;
        self
    }
}

/// Get the path to the default configuration file
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Cannot determine config directory")?;
    Ok(config_dir.join("snippet-search").join("config.json"))
}

/// Load configuration from the default location
pub fn load_config() -> Result<EngineConfig> {
    let path = config_path()?;
    load_config_from(&path)
}

/// Load configuration from an explicit path; a missing file yields defaults
pub fn load_config_from(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config: EngineConfig = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    if config.max_cached_tenants == 0 {
        anyhow::bail!("max_cached_tenants must be at least 1");
    }

    Ok(config)
}

/// Save configuration to an explicit path
pub fn save_config_to(config: &EngineConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let data = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, data).context("Failed to write config file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.staleness(), Duration::from_secs(30 * 60));
        assert_eq!(config.default_limit, 50);
        assert_eq!(config.fuzzy_threshold, 60);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"staleness_minutes": 5}"#).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.staleness_minutes, 5);
        assert_eq!(config.max_cached_tenants, 256);
    }

    #[test]
    fn test_round_trip_and_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = EngineConfig::default().with_max_cached_tenants(4);
        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), config);

        fs::write(&path, r#"{"max_cached_tenants": 0}"#).unwrap();
        assert!(load_config_from(&path).is_err());
    }
}
