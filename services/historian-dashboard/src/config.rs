//! Configuration types for the historian dashboard

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Largest feed the dashboard will keep
pub const MAX_FEED_CAPACITY: usize = 1000;

/// Longest highlight accepted for new feed entries
pub const MAX_HIGHLIGHT_MS: u64 = 60_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Historian backend the dashboard reads from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Timer and reconnect settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_queued_messages_interval")]
    pub queued_messages_interval_ms: u64,
    #[serde(default = "default_stats_interval")]
    pub stats_interval_ms: u64,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
}

/// Message feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_capacity")]
    pub capacity: usize,
    #[serde(default = "default_initial_message_limit")]
    pub initial_message_limit: usize,
    #[serde(default = "default_highlight")]
    pub highlight_ms: u64,
}

/// Local server that exposes the rendered dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_ms: u64,
}

impl PollingConfig {
    pub fn queued_messages_interval(&self) -> Duration {
        Duration::from_millis(self.queued_messages_interval_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            queued_messages_interval_ms: default_queued_messages_interval(),
            stats_interval_ms: default_stats_interval(),
            reconnect_delay_ms: default_reconnect_delay(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            capacity: default_feed_capacity(),
            initial_message_limit: default_initial_message_limit(),
            highlight_ms: default_highlight(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_server_port(),
            refresh_interval_ms: default_refresh_interval(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_queued_messages_interval() -> u64 {
    1000
}

fn default_stats_interval() -> u64 {
    5000
}

fn default_reconnect_delay() -> u64 {
    3000
}

fn default_feed_capacity() -> usize {
    20
}

fn default_initial_message_limit() -> usize {
    10
}

fn default_highlight() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

fn default_server_port() -> u16 {
    11120
}

fn default_refresh_interval() -> u64 {
    1000
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::DashboardError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Reject settings the dashboard cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        let base_url = &self.backend.base_url;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(crate::DashboardError::Config(format!(
                "backend.base_url must start with http:// or https://, got {:?}",
                base_url
            )));
        }
        if self.feed.capacity == 0 || self.feed.capacity > MAX_FEED_CAPACITY {
            return Err(crate::DashboardError::Config(format!(
                "feed.capacity must be between 1 and {}, got {}",
                MAX_FEED_CAPACITY, self.feed.capacity
            )));
        }
        if self.feed.highlight_ms > MAX_HIGHLIGHT_MS {
            return Err(crate::DashboardError::Config(format!(
                "feed.highlight_ms must be at most {}, got {}",
                MAX_HIGHLIGHT_MS, self.feed.highlight_ms
            )));
        }
        if self.polling.queued_messages_interval_ms == 0 || self.polling.stats_interval_ms == 0 {
            return Err(crate::DashboardError::Config(
                "polling intervals must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
