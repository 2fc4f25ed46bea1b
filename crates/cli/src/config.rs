//! Console configuration file.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use vaultview_browse::BrowserConfig;
use vaultview_watch::WatchConfig;

/// Settings read from `--config`; every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleConfig {
    /// Default log filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Poll interval of the watch command
    pub poll_interval_ms: u64,
    /// Deadline of one task poll
    pub poll_timeout_ms: u64,
    /// Ids per task listing page
    pub page_size: usize,
    /// Rows kept in the completed list
    pub completed_limit: usize,
    /// Label of the breadcrumb root
    pub root_label: String,
    /// Hide files in target pickers
    pub only_directories: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        let watch = WatchConfig::default();
        let browser = BrowserConfig::default();
        Self {
            log_level: "info".to_string(),
            poll_interval_ms: watch.poll_interval.as_millis() as u64,
            poll_timeout_ms: watch.poll_timeout.as_millis() as u64,
            page_size: watch.page_size,
            completed_limit: watch.completed_limit,
            root_label: browser.root_label,
            only_directories: browser.only_directories,
        }
    }
}

impl ConsoleConfig {
    /// Read a JSON config file.
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Read `path` if given, defaults otherwise.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path).await,
            None => Ok(Self::default()),
        }
    }

    /// Coordinator settings.
    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig::default()
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_poll_timeout(Duration::from_millis(self.poll_timeout_ms))
            .with_page_size(self.page_size)
            .with_completed_limit(self.completed_limit)
    }

    /// Browser settings.
    pub fn browser_config(&self) -> BrowserConfig {
        BrowserConfig::default()
            .with_root_label(self.root_label.clone())
            .with_only_directories(self.only_directories)
    }
}
