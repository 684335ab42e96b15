//! Configuration types for hddping
//!
//! Configuration is split into:
//! - [`StaticConfig`] - daemon settings, loaded once at startup
//! - [`SettingsData`] - the persisted user choices (interval, enabled drives)
//!
//! The settings file lives next to the working directory, the static config
//! in the XDG config directory.

mod paths;
mod settings_data;
mod static_config;

pub use paths::{default_config_path, default_settings_file};
pub use settings_data::{SettingsData, SETTINGS_VERSION};
pub use static_config::{StaticConfig, StatusConfig};
