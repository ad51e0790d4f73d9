//! Application configuration management.
//!
//! Holds the remote sheet endpoints, the cache location and the request
//! timeout. Stored at `~/.config/spendsheet/config.json`; every field is
//! optional and can be overridden from the environment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::Sheet;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "spendsheet";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_ENDPOINT: &str = "SPENDSHEET_ENDPOINT";
pub const ENV_BUDGETS_ENDPOINT: &str = "SPENDSHEET_BUDGETS_ENDPOINT";
pub const ENV_CACHE_DIR: &str = "SPENDSHEET_CACHE_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Endpoint for the expense sheet, and for budgets unless overridden
    pub endpoint_url: Option<String>,
    pub budgets_endpoint_url: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Set a field by its JSON name. An empty value clears it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        let text = (!value.is_empty()).then(|| value.to_string());
        match key {
            "endpoint_url" => self.endpoint_url = text,
            "budgets_endpoint_url" => self.budgets_endpoint_url = text,
            "cache_dir" => self.cache_dir = text.map(PathBuf::from),
            "request_timeout_secs" => {
                self.request_timeout_secs = match text {
                    Some(secs) => Some(
                        secs.parse::<u64>()
                            .with_context(|| format!("'{}' is not a number of seconds", secs))?,
                    ),
                    None => None,
                }
            }
            other => bail!("unknown config key '{}'", other),
        }
        Ok(())
    }

    /// Apply `SPENDSHEET_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(ENV_ENDPOINT) {
            debug!(key = ENV_ENDPOINT, "Endpoint overridden from environment");
            self.endpoint_url = Some(url);
        }
        if let Some(url) = lookup(ENV_BUDGETS_ENDPOINT) {
            self.budgets_endpoint_url = Some(url);
        }
        if let Some(dir) = lookup(ENV_CACHE_DIR) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
    }

    /// Endpoint for `sheet`, or `None` when running local-only.
    pub fn endpoint_for(&self, sheet: Sheet) -> Option<&str> {
        let endpoint = match sheet {
            Sheet::Expenses => self.endpoint_url.as_deref(),
            Sheet::Budgets => self
                .budgets_endpoint_url
                .as_deref()
                .or(self.endpoint_url.as_deref()),
        };
        endpoint.filter(|url| !url.trim().is_empty())
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_budgets_endpoint_falls_back() {
        let config = Config {
            endpoint_url: Some("https://example.test/exec".into()),
            ..Config::default()
        };
        assert_eq!(config.endpoint_for(Sheet::Expenses), Some("https://example.test/exec"));
        assert_eq!(config.endpoint_for(Sheet::Budgets), Some("https://example.test/exec"));

        let split = Config {
            budgets_endpoint_url: Some("https://example.test/budgets".into()),
            ..config
        };
        assert_eq!(split.endpoint_for(Sheet::Budgets), Some("https://example.test/budgets"));
    }

    #[test]
    fn test_blank_endpoint_means_local_only() {
        let config = Config {
            endpoint_url: Some("  ".into()),
            ..Config::default()
        };
        assert_eq!(config.endpoint_for(Sheet::Expenses), None);
        assert_eq!(Config::default().endpoint_for(Sheet::Budgets), None);
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            (ENV_ENDPOINT, "https://env.test/exec"),
            (ENV_CACHE_DIR, "/tmp/spendsheet-test"),
            (ENV_BUDGETS_ENDPOINT, ""),
        ]);
        let mut config = Config {
            endpoint_url: Some("https://file.test/exec".into()),
            budgets_endpoint_url: Some("https://file.test/budgets".into()),
            ..Config::default()
        };
        config.apply_overrides(|key| vars.get(key).cloned());

        assert_eq!(config.endpoint_url.as_deref(), Some("https://env.test/exec"));
        assert_eq!(config.budgets_endpoint_url.as_deref(), Some("https://file.test/budgets"));
        assert_eq!(config.cache_dir().unwrap(), PathBuf::from("/tmp/spendsheet-test"));
    }

    #[test]
    fn test_request_timeout() {
        assert_eq!(Config::default().request_timeout(), None);
        let config = Config {
            request_timeout_secs: Some(30),
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        let zero = Config {
            request_timeout_secs: Some(0),
            ..Config::default()
        };
        assert_eq!(zero.request_timeout(), None);
    }

    #[test]
    fn test_set_fields() {
        let mut config = Config::default();
        config.set("endpoint_url", " https://x.test/exec ").unwrap();
        config.set("request_timeout_secs", "15").unwrap();
        config.set("cache_dir", "/tmp/ss").unwrap();
        assert_eq!(config.endpoint_url.as_deref(), Some("https://x.test/exec"));
        assert_eq!(config.request_timeout_secs, Some(15));
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/ss")));

        config.set("endpoint_url", "").unwrap();
        assert!(config.endpoint_url.is_none());

        assert!(config.set("request_timeout_secs", "soon").is_err());
        assert!(config.set("colour", "blue").is_err());
    }

    #[test]
    fn test_deserializes_partial_file() {
        let config: Config = serde_json::from_str(r#"{"endpoint_url": "https://x.test"}"#).unwrap();
        assert_eq!(config.endpoint_url.as_deref(), Some("https://x.test"));
        assert!(config.cache_dir.is_none());
    }
}
