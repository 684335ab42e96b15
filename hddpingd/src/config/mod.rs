//! Configuration management module
//!
//! Loads the static daemon configuration and owns the settings file.
//! Both are fail-soft: a missing or broken file means defaults, never an
//! aborted start.

mod settings_store;

pub(crate) use settings_store::SettingsStore;

use hddping_core::StaticConfig;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

/// Load the static config from TOML, falling back to defaults.
///
/// Unlike the settings file this one is never written by the daemon.
pub(crate) async fn load_static_config(path: &Path) -> StaticConfig {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(
                "Static config not found at {}. Using defaults.",
                path.display()
            );
            return StaticConfig::default();
        }
        Err(e) => {
            warn!(
                "Failed to read static config {}: {}. Using defaults.",
                path.display(),
                e
            );
            return StaticConfig::default();
        }
    };

    match StaticConfig::from_toml(&content) {
        Ok(config) => {
            info!("Static config loaded from {}", path.display());
            config
        }
        Err(e) => {
            warn!(
                "Failed to parse static config {}: {}. Using defaults.",
                path.display(),
                e
            );
            StaticConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_static_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_static_config(&temp_dir.path().join("config.toml")).await;
        assert_eq!(config.settings_file, PathBuf::from(".hddping-settings.toml"));
    }

    #[tokio::test]
    async fn test_static_config_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "settings_file = \"/tmp/s.toml\"\n[status]\nsettle_window_secs = 9\n")
            .await
            .unwrap();

        let config = load_static_config(&path).await;
        assert_eq!(config.settings_file, PathBuf::from("/tmp/s.toml"));
        assert_eq!(config.status.settle_window_secs, 9);
    }

    #[tokio::test]
    async fn test_broken_static_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[status\nsettle_window_secs = ").await.unwrap();

        let config = load_static_config(&path).await;
        assert_eq!(config.status.settle_window_secs, 5);
    }
}
