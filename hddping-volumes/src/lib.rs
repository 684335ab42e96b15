//! hddping-volumes
//!
//! Platform-facing side of hddping: finding the volumes worth keeping awake
//! and touching them.
//!
//! Public API:
//! - `registry::DriveRegistry`: eligible volumes attached at startup
//! - `registry::SystemVolumes`: `sysinfo`-backed volume enumeration
//! - `ping::FsPinger`: write-then-delete keep-alive probe
//! - `ping::ping_batch`: ping a set of drives with failure isolation

pub mod ping;
pub mod registry;

pub use ping::{ping_batch, touch, BatchReport, DrivePinger, FsPinger, PingOutcome};
pub use registry::{classify, DriveRegistry, SystemVolumes, VolumeError, VolumeSource};
