//! Persisted user settings
//!
//! Stored in the settings file (`.hddping-settings.toml` by default)

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{HddPingError, Result};
use crate::types::{Configuration, DriveSetting};

/// Format version written into every settings file
pub const SETTINGS_VERSION: u32 = 1;

/// On-disk form of [`Configuration`]
///
/// Only enabled drives are ever written, so every entry in `drives` is
/// expected to carry `enabled = true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsData {
    /// Format version, checked before anything else is parsed
    pub version: u32,
    /// Ping interval in seconds
    pub interval_secs: u64,
    /// Drives the user wants pinged
    #[serde(default)]
    pub drives: Vec<DriveSetting>,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

impl SettingsData {
    /// Minimized snapshot of `config`: disabled drives are left out.
    pub fn from_configuration(config: &Configuration) -> Self {
        let mut minimized = config.clone();
        minimized.retain_enabled();
        Self {
            version: SETTINGS_VERSION,
            interval_secs: minimized.interval().as_secs(),
            drives: minimized.drive_settings().to_vec(),
        }
    }

    /// Rebuild a [`Configuration`], validating the interval.
    pub fn into_configuration(self) -> Result<Configuration> {
        Configuration::new(Duration::from_secs(self.interval_secs), self.drives)
    }

    /// Parse SettingsData from TOML string.
    ///
    /// A file from another format version is rejected with
    /// `UnsupportedVersion` before its body is interpreted.
    pub fn from_toml(content: &str) -> Result<Self> {
        let probe: VersionProbe = toml::from_str(content)?;
        if probe.version != SETTINGS_VERSION {
            return Err(HddPingError::UnsupportedVersion {
                found: probe.version,
                expected: SETTINGS_VERSION,
            });
        }
        Ok(toml::from_str(content)?)
    }

    /// Serialize SettingsData to TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
