//! Sync configuration storage
//!
//! Persists poll timing and the dashboard location next to the host's
//! other settings.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::constants::defaults;
use crate::error::ConfigError;

fn default_poll_interval_ms() -> u64 {
    defaults::POLL_INTERVAL_MS
}

fn default_poll_timeout_ms() -> u64 {
    defaults::POLL_TIMEOUT_MS
}

fn default_dashboard_url() -> String {
    defaults::DASHBOARD_URL.to_string()
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Delay between sync task status queries
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Upper bound on the time spent waiting for a sync task
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    /// Base URL of the web dashboard used for run deep links
    #[serde(default = "default_dashboard_url")]
    pub dashboard_url: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            poll_timeout_ms: default_poll_timeout_ms(),
            dashboard_url: default_dashboard_url(),
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Dashboard page for a workflow
    pub fn workflow_link(&self, workflow_id: &str) -> String {
        format!(
            "{}/workflows/{}",
            self.dashboard_url.trim_end_matches('/'),
            workflow_id
        )
    }

    /// Load configuration from disk, falling back to defaults if absent
    pub async fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(defaults::CONFIG_FILE);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path).await?;

        serde_json::from_str(&contents).map_err(ConfigError::Parse)
    }

    /// Save configuration to disk
    pub async fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        fs::create_dir_all(config_dir).await?;

        let config_path = config_dir.join(defaults::CONFIG_FILE);
        let contents = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        fs::write(&config_path, contents).await?;

        log::info!("Sync configuration saved to {:?}", config_path);
        Ok(())
    }
}
