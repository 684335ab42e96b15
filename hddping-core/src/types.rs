//! Core types and data structures for hddping

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use crate::error::{HddPingError, Result};

/// Ping interval used when nothing has been configured yet
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Longest accepted ping interval
pub const MAX_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Interval choices offered by the tray menu, in minutes
pub const INTERVAL_MENU_MINUTES: RangeInclusive<u64> = 1..=25;

/// Stable name of a volume: its root or mount point path.
///
/// Used purely as an equality key. Identity is not guaranteed across
/// re-attachment of removable media.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriveId(String);

impl DriveId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Root directory the ping file is written into
    pub fn root(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for DriveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DriveId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Volume type as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveKind {
    /// Internal disk
    Fixed,
    /// Network share
    Network,
    /// USB stick, SD card, external enclosure
    Removable,
    /// RAM-backed file system
    Ram,
    /// Optical media
    CdRom,
    /// Anything the platform could not classify
    Unknown,
}

impl DriveKind {
    /// Whether volumes of this kind are offered for pinging
    pub fn is_eligible(self) -> bool {
        matches!(
            self,
            DriveKind::Fixed | DriveKind::Network | DriveKind::Removable | DriveKind::Ram
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DriveKind::Fixed => "fixed",
            DriveKind::Network => "network",
            DriveKind::Removable => "removable",
            DriveKind::Ram => "ram",
            DriveKind::CdRom => "cdrom",
            DriveKind::Unknown => "unknown",
        }
    }
}

/// An attached volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drive {
    pub id: DriveId,
    pub kind: DriveKind,
}

impl Drive {
    pub fn new(id: impl Into<DriveId>, kind: DriveKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// Whether a drive the user has configured should be pinged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveSetting {
    pub drive: DriveId,
    pub enabled: bool,
}

impl DriveSetting {
    pub fn new(drive: impl Into<DriveId>, enabled: bool) -> Self {
        Self {
            drive: drive.into(),
            enabled,
        }
    }
}

/// In-memory configuration owned by the control loop.
///
/// Mutations are not written through to disk. The settings file is only
/// rewritten at exit or on an explicit save request, so changes made since
/// the last save are lost if the process dies abruptly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    interval: Duration,
    drive_settings: Vec<DriveSetting>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            drive_settings: Vec::new(),
        }
    }
}

impl Configuration {
    /// Build a configuration, collapsing duplicate drives (last entry wins).
    ///
    /// Returns `InvalidInput` for an interval outside `1s..=MAX_INTERVAL`.
    pub fn new(interval: Duration, drive_settings: Vec<DriveSetting>) -> Result<Self> {
        let mut config = Self::default();
        config.set_interval(interval)?;
        for setting in drive_settings {
            config.add_or_update(setting.drive, setting.enabled);
        }
        Ok(config)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the ping interval. Zero and anything above [`MAX_INTERVAL`]
    /// are rejected.
    pub fn set_interval(&mut self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(HddPingError::InvalidInput(
                "ping interval must be positive".to_string(),
            ));
        }
        if interval > MAX_INTERVAL {
            return Err(HddPingError::InvalidInput(format!(
                "ping interval must be at most {}s",
                MAX_INTERVAL.as_secs()
            )));
        }
        self.interval = interval;
        Ok(())
    }

    pub fn drive_settings(&self) -> &[DriveSetting] {
        &self.drive_settings
    }

    /// Update the setting for `drive` in place, or append it if new.
    pub fn add_or_update(&mut self, drive: DriveId, enabled: bool) {
        match self.drive_settings.iter_mut().find(|s| s.drive == drive) {
            Some(existing) => existing.enabled = enabled,
            None => self.drive_settings.push(DriveSetting { drive, enabled }),
        }
    }

    /// Flip the flag for `drive` (an unknown drive becomes enabled).
    ///
    /// Returns the new value.
    pub fn toggle(&mut self, drive: &DriveId) -> bool {
        let enabled = !self.is_enabled(drive);
        self.add_or_update(drive.clone(), enabled);
        enabled
    }

    pub fn is_enabled(&self, drive: &DriveId) -> bool {
        self.drive_settings
            .iter()
            .any(|s| s.enabled && &s.drive == drive)
    }

    pub fn any_enabled(&self) -> bool {
        self.drive_settings.iter().any(|s| s.enabled)
    }

    /// Enabled drives, in settings order
    pub fn enabled_drives(&self) -> Vec<DriveId> {
        self.drive_settings
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.drive.clone())
            .collect()
    }

    /// Drop settings for drives that are not currently attached.
    ///
    /// Returns the number of settings removed.
    pub fn prune_detached(&mut self, attached: &[DriveId]) -> usize {
        let before = self.drive_settings.len();
        self.drive_settings.retain(|s| attached.contains(&s.drive));
        before - self.drive_settings.len()
    }

    /// Drop disabled settings, keeping only drives that are pinged.
    ///
    /// A drive disabled after being enabled loses its entry entirely.
    /// Returns the number of settings removed.
    pub fn retain_enabled(&mut self) -> usize {
        let before = self.drive_settings.len();
        self.drive_settings.retain(|s| s.enabled);
        before - self.drive_settings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> DriveId {
        DriveId::new(s)
    }

    #[test]
    fn test_default_configuration() {
        let config = Configuration::default();
        assert_eq!(config.interval(), Duration::from_secs(300));
        assert!(config.drive_settings().is_empty());
        assert!(!config.any_enabled());
    }

    #[test]
    fn test_add_or_update_keeps_identifiers_unique() {
        let mut config = Configuration::default();
        config.add_or_update(id("C:\\"), true);
        config.add_or_update(id("D:\\"), true);
        config.add_or_update(id("C:\\"), false);

        assert_eq!(config.drive_settings().len(), 2);
        assert_eq!(config.drive_settings()[0], DriveSetting::new("C:\\", false));
        assert_eq!(config.drive_settings()[1], DriveSetting::new("D:\\", true));
    }

    #[test]
    fn test_new_collapses_duplicates() {
        let config = Configuration::new(
            Duration::from_secs(60),
            vec![
                DriveSetting::new("/mnt/a", true),
                DriveSetting::new("/mnt/a", false),
            ],
        )
        .unwrap();
        assert_eq!(config.drive_settings(), &[DriveSetting::new("/mnt/a", false)]);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = Configuration::default();
        assert!(matches!(
            config.set_interval(Duration::ZERO),
            Err(HddPingError::InvalidInput(_))
        ));
        assert_eq!(config.interval(), DEFAULT_INTERVAL);
        assert!(Configuration::new(Duration::ZERO, vec![]).is_err());
    }

    #[test]
    fn test_oversized_interval_rejected() {
        let mut config = Configuration::default();
        assert!(matches!(
            config.set_interval(Duration::from_secs(u64::MAX)),
            Err(HddPingError::InvalidInput(_))
        ));
        assert!(config.set_interval(MAX_INTERVAL + Duration::from_secs(1)).is_err());
        assert_eq!(config.interval(), DEFAULT_INTERVAL);

        config.set_interval(MAX_INTERVAL).unwrap();
        assert_eq!(config.interval(), MAX_INTERVAL);
    }

    #[test]
    fn test_toggle() {
        let mut config = Configuration::default();
        let c = id("/");

        assert!(config.toggle(&c));
        assert!(config.is_enabled(&c));
        assert!(!config.toggle(&c));
        assert!(!config.is_enabled(&c));
        assert_eq!(config.drive_settings().len(), 1);
    }

    #[test]
    fn test_enabled_drives_preserve_order() {
        let mut config = Configuration::default();
        config.add_or_update(id("/b"), true);
        config.add_or_update(id("/a"), false);
        config.add_or_update(id("/c"), true);

        assert_eq!(config.enabled_drives(), vec![id("/b"), id("/c")]);
        assert!(config.any_enabled());
    }

    #[test]
    fn test_prune_detached() {
        let mut config = Configuration::default();
        config.add_or_update(id("E:\\"), true);
        config.add_or_update(id("C:\\"), false);

        let removed = config.prune_detached(&[id("C:\\"), id("D:\\")]);
        assert_eq!(removed, 1);
        assert_eq!(config.drive_settings(), &[DriveSetting::new("C:\\", false)]);
    }

    #[test]
    fn test_retain_enabled() {
        let mut config = Configuration::default();
        config.add_or_update(id("C:\\"), true);
        config.add_or_update(id("D:\\"), false);

        assert_eq!(config.retain_enabled(), 1);
        assert!(config.drive_settings().iter().all(|s| s.enabled));
    }

    #[test]
    fn test_drive_kind_eligibility() {
        assert!(DriveKind::Fixed.is_eligible());
        assert!(DriveKind::Network.is_eligible());
        assert!(DriveKind::Removable.is_eligible());
        assert!(DriveKind::Ram.is_eligible());
        assert!(!DriveKind::CdRom.is_eligible());
        assert!(!DriveKind::Unknown.is_eligible());
    }

    #[test]
    fn test_drive_id_serializes_as_string() {
        let json = serde_json::to_string(&DriveSetting::new("/mnt/data", true)).unwrap();
        assert_eq!(json, r#"{"drive":"/mnt/data","enabled":true}"#);
    }

    #[test]
    fn test_interval_menu_range() {
        assert_eq!(INTERVAL_MENU_MINUTES.count(), 25);
        assert!(INTERVAL_MENU_MINUTES.contains(&(DEFAULT_INTERVAL.as_secs() / 60)));
    }
}
