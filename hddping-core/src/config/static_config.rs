//! Static configuration loaded once at startup
//!
//! This configuration is read-only after the daemon starts.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::paths::default_settings_file;
use crate::status::{DEFAULT_SETTLE_WINDOW, MAX_SETTLE_WINDOW};

/// Status indicator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StatusConfig {
    /// How long the status stays "working" after a batch starts, in seconds
    pub settle_window_secs: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            settle_window_secs: DEFAULT_SETTLE_WINDOW.as_secs(),
        }
    }
}

impl StatusConfig {
    /// Configured window, capped at [`MAX_SETTLE_WINDOW`].
    pub fn settle_window(&self) -> Duration {
        Duration::from_secs(self.settle_window_secs).min(MAX_SETTLE_WINDOW)
    }
}

/// Static configuration for the hddping daemon.
///
/// Located at `~/.config/hddping/config.toml` by default. Every field is
/// optional in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct StaticConfig {
    /// Settings file holding interval and enabled drives.
    ///
    /// Relative paths resolve against the working directory.
    #[serde(default = "default_settings_file")]
    pub settings_file: PathBuf,

    /// Status indicator configuration
    #[serde(default)]
    pub status: StatusConfig,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            settings_file: default_settings_file(),
            status: StatusConfig::default(),
        }
    }
}

impl StaticConfig {
    /// Parse StaticConfig from TOML string.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
