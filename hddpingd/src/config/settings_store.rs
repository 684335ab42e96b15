//! Settings persistence
//!
//! Reads and writes the single settings file holding the ping interval and
//! the enabled drives. Loading never fails from the caller's point of view;
//! saving reports success as a plain `bool` because nothing upstream can act
//! on the details.

use hddping_core::{Configuration, DriveId, HddPingError, Result, SettingsData};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Owner of the settings file path
#[derive(Debug, Clone)]
pub(crate) struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration, pruning drives that are no longer attached.
    ///
    /// A missing, unreadable, corrupt or foreign-version file yields the
    /// default configuration.
    pub async fn load(&self, attached: &[DriveId]) -> Configuration {
        let mut config = match self.try_load().await {
            Ok(Some(config)) => config,
            Ok(None) => {
                info!(
                    "Settings file not found at {}. Using defaults.",
                    self.path.display()
                );
                return Configuration::default();
            }
            Err(e) => {
                warn!(
                    "Failed to load settings from {}: {}. Using defaults.",
                    self.path.display(),
                    e
                );
                return Configuration::default();
            }
        };

        let pruned = config.prune_detached(attached);
        if pruned > 0 {
            info!("Dropped {} setting(s) for detached drives", pruned);
        }

        info!(
            "Settings loaded: interval {}s, {} drive(s) enabled",
            config.interval().as_secs(),
            config.enabled_drives().len()
        );
        config
    }

    async fn try_load(&self) -> Result<Option<Configuration>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let config = SettingsData::from_toml(&content)?.into_configuration()?;
        Ok(Some(config))
    }

    /// Persist the enabled drives and the interval.
    ///
    /// Disabled drives are not written. Returns `false` on any failure; the
    /// caller is expected to carry on regardless.
    pub async fn save(&self, config: &Configuration) -> bool {
        match self.try_save(config).await {
            Ok(()) => {
                info!("Settings saved to {}", self.path.display());
                true
            }
            Err(e) => {
                warn!(
                    "Failed to save settings to {}: {}",
                    self.path.display(),
                    e
                );
                false
            }
        }
    }

    async fn try_save(&self, config: &Configuration) -> Result<()> {
        let data = SettingsData::from_configuration(config);
        debug!(
            "Saving {} enabled drive(s) to {}",
            data.drives.len(),
            self.path.display()
        );

        let toml_str = data.to_toml()?;
        fs::write(&self.path, toml_str).await.map_err(|e| {
            HddPingError::Config(format!("Failed to write settings file: {}", e))
        })?;
        Ok(())
    }
}
