use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::{env, DEFAULT_POLL_INTERVAL_MS};

/// Dashboard configuration, loaded from a JSON file and overridable from the environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    /// Base URL of the worker, e.g. `https://my-worker.example.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_url: Option<String>,

    /// Sent as `Authorization: Bearer <key>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Where local preferences are kept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            worker_url: None,
            api_key: None,
            data_dir: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl DashboardConfig {
    /// `<config_dir>/pulseboard/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pulseboard").join("config.json"))
    }

    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: DashboardConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load from `path` if given, else from the default location when it exists,
    /// then apply environment overrides. An explicit path must exist.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::load(&default)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from `lookup` (normally the process environment). Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = lookup(env::WORKER_URL) {
            self.worker_url = Some(url);
        }
        if let Some(key) = lookup(env::API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(dir) = lookup(env::DATA_DIR) {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Configured data dir, else `<data_dir>/pulseboard`, else `./.pulseboard`
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("pulseboard")))
            .unwrap_or_else(|| PathBuf::from(".pulseboard"))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn is_configured(&self) -> bool {
        self.worker_url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}
