//! Volume enumeration
//!
//! Lists the volumes attached right now and keeps the ones whose type makes
//! them worth pinging (fixed, network, removable, RAM-backed). Enumeration is
//! done on request only; nothing here watches for hot-plug events.

use hddping_core::{Drive, DriveId, DriveKind};
use std::collections::HashSet;
use sysinfo::Disks;
use thiserror::Error;
use tracing::debug;

/// File systems that are mounted over the network
const NETWORK_FILE_SYSTEMS: &[&str] = &[
    "nfs", "nfs4", "cifs", "smb", "smbfs", "smb2", "smb3", "afpfs", "9p", "sshfs",
    "fuse.sshfs", "davfs", "fuse.davfs2", "fuse.rclone", "ncpfs", "glusterfs", "ceph",
];

/// File systems that live in memory
const RAM_FILE_SYSTEMS: &[&str] = &["tmpfs", "ramfs"];

/// File systems used by optical media
const OPTICAL_FILE_SYSTEMS: &[&str] = &["iso9660", "udf", "cdfs"];

/// Failure to describe a single volume
#[derive(Debug, Clone, Error)]
pub enum VolumeError {
    /// Mount point cannot be used as a drive identifier
    #[error("Mount point is not valid UTF-8: {0}")]
    NonUtf8MountPoint(String),

    /// Platform refused to describe the volume
    #[error("Volume {mount_point} is unavailable: {reason}")]
    Unavailable { mount_point: String, reason: String },
}

/// Source of attached volumes
///
/// Abstracts the platform so the registry can be exercised without real
/// hardware. Each entry describes one volume; one failed entry must not
/// prevent the others from being reported.
pub trait VolumeSource {
    fn probe(&self) -> Vec<Result<Drive, VolumeError>>;
}

/// Volumes reported by the operating system through `sysinfo`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemVolumes;

impl VolumeSource for SystemVolumes {
    fn probe(&self) -> Vec<Result<Drive, VolumeError>> {
        let disks = Disks::new_with_refreshed_list();

        disks
            .list()
            .iter()
            .map(|disk| {
                let mount_point = disk.mount_point();
                let id = mount_point.to_str().ok_or_else(|| {
                    VolumeError::NonUtf8MountPoint(mount_point.to_string_lossy().into_owned())
                })?;
                if disk.total_space() == 0 {
                    // Card readers without media and dead mounts report no capacity
                    return Err(VolumeError::Unavailable {
                        mount_point: id.to_string(),
                        reason: "no capacity reported".to_string(),
                    });
                }
                let file_system = disk.file_system().to_string_lossy();
                let kind = classify(&file_system, disk.is_removable());

                debug!(
                    "Volume {} ({}, fs={}, removable={})",
                    id,
                    kind.as_str(),
                    file_system,
                    disk.is_removable()
                );
                Ok(Drive::new(id, kind))
            })
            .collect()
    }
}

/// Classify a volume from its file-system name and removability.
pub fn classify(file_system: &str, removable: bool) -> DriveKind {
    let fs = file_system.to_ascii_lowercase();

    if NETWORK_FILE_SYSTEMS.contains(&fs.as_str()) {
        DriveKind::Network
    } else if RAM_FILE_SYSTEMS.contains(&fs.as_str()) {
        DriveKind::Ram
    } else if OPTICAL_FILE_SYSTEMS.contains(&fs.as_str()) {
        DriveKind::CdRom
    } else if removable {
        DriveKind::Removable
    } else if fs.is_empty() {
        DriveKind::Unknown
    } else {
        DriveKind::Fixed
    }
}

/// Eligible drives attached when the registry was built
#[derive(Debug, Clone, Default)]
pub struct DriveRegistry {
    drives: Vec<Drive>,
}

impl DriveRegistry {
    /// Enumerate `source` and keep the eligible drives.
    pub fn enumerate(source: &dyn VolumeSource) -> Self {
        Self {
            drives: Self::list_eligible(source),
        }
    }

    /// Build a registry from an already known drive list.
    pub fn from_drives(drives: Vec<Drive>) -> Self {
        let mut seen = HashSet::new();
        let drives = drives
            .into_iter()
            .filter(|d| d.kind.is_eligible() && seen.insert(d.id.clone()))
            .collect();
        Self { drives }
    }

    /// Query `source` and return the eligible drives.
    ///
    /// Volumes that fail to probe are left out; the rest are still listed.
    /// Duplicate mount points keep their first occurrence.
    pub fn list_eligible(source: &dyn VolumeSource) -> Vec<Drive> {
        let mut seen = HashSet::new();
        let mut drives = Vec::new();

        for probed in source.probe() {
            match probed {
                Ok(drive) if !drive.kind.is_eligible() => {
                    debug!("Skipping {} volume {}", drive.kind.as_str(), drive.id);
                }
                Ok(drive) => {
                    if seen.insert(drive.id.clone()) {
                        drives.push(drive);
                    }
                }
                Err(e) => {
                    debug!("Skipping volume: {}", e);
                }
            }
        }

        drives
    }

    pub fn drives(&self) -> &[Drive] {
        &self.drives
    }

    pub fn ids(&self) -> Vec<DriveId> {
        self.drives.iter().map(|d| d.id.clone()).collect()
    }

    pub fn get(&self, id: &DriveId) -> Option<&Drive> {
        self.drives.iter().find(|d| &d.id == id)
    }

    pub fn contains(&self, id: &DriveId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.drives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drives.is_empty()
    }
}
