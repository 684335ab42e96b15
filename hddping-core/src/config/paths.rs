//! Default path resolution for configuration files

use std::path::PathBuf;

/// Returns the default path for the static configuration file.
///
/// Uses XDG config directory if available:
/// - Linux/macOS: `~/.config/hddping/config.toml`
/// - Fallback: `/etc/hddping/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/etc"))
        .join("hddping")
        .join("config.toml")
}

/// Returns the default settings file, relative to the working directory.
pub fn default_settings_file() -> PathBuf {
    PathBuf::from(".hddping-settings.toml")
}
