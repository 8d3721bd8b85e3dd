//! HTTP adapter configuration storage

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sync_engine::ConfigError;
use tokio::fs;

use crate::constants::defaults;

fn default_endpoint() -> String {
    defaults::CLOUD_ENDPOINT.to_string()
}

fn default_local_url() -> String {
    defaults::LOCAL_URL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    defaults::REQUEST_TIMEOUT_MS
}

/// Where the cloud API and the editor host live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpAdapterConfig {
    /// Base URL of the cloud API (also forwarded to the upload route)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Base URL of the local editor host that serves the `/comfy-cloud/*` routes
    #[serde(default = "default_local_url")]
    pub local_url: String,
    /// Per-request timeout
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for HttpAdapterConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            local_url: default_local_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl HttpAdapterConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Build a client honoring the configured timeout
    pub fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(self.request_timeout())
            .build()
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

        log::info!("HTTP adapter configuration saved to {:?}", config_path);
        Ok(())
    }
}
