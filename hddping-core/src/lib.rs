//! hddping Core Library
//!
//! Shared types, the persisted settings format, and configuration for the
//! hddping drive keep-alive daemon. Used by the volume layer and the daemon.

pub mod config;
pub mod error;
pub mod status;
pub mod types;

// Re-export commonly used types
pub use config::{
    default_config_path, default_settings_file, SettingsData, StaticConfig, StatusConfig,
    SETTINGS_VERSION,
};
pub use error::*;
pub use status::{Status, DEFAULT_SETTLE_WINDOW, MAX_SETTLE_WINDOW};
pub use types::*;
