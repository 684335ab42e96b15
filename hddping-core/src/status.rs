//! Coarse status shown by the tray icon

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default length of the settle window after a batch starts
pub const DEFAULT_SETTLE_WINDOW: Duration = Duration::from_secs(5);

/// Upper bound for a configured settle window
pub const MAX_SETTLE_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Status indicator value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// A ping batch started within the settle window
    Working,
    /// At least one drive is enabled
    Enabled,
    /// No drive is enabled
    Disabled,
}

impl Status {
    /// Derive the status from configuration and batch timing.
    ///
    /// `since_batch_start` is the time elapsed since the most recent batch
    /// started, if any batch has started.
    pub fn derive(
        any_enabled: bool,
        since_batch_start: Option<Duration>,
        settle_window: Duration,
    ) -> Self {
        match since_batch_start {
            Some(elapsed) if elapsed < settle_window => Status::Working,
            _ if any_enabled => Status::Enabled,
            _ => Status::Disabled,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Working => "working",
            Status::Enabled => "enabled",
            Status::Disabled => "disabled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = DEFAULT_SETTLE_WINDOW;

    #[test]
    fn test_disabled_without_enabled_drives() {
        assert_eq!(Status::derive(false, None, WINDOW), Status::Disabled);
    }

    #[test]
    fn test_enabled_without_recent_batch() {
        assert_eq!(Status::derive(true, None, WINDOW), Status::Enabled);
        assert_eq!(
            Status::derive(true, Some(Duration::from_secs(60)), WINDOW),
            Status::Enabled
        );
    }

    #[test]
    fn test_working_inside_window() {
        assert_eq!(
            Status::derive(true, Some(Duration::ZERO), WINDOW),
            Status::Working
        );
        assert_eq!(
            Status::derive(true, Some(Duration::from_millis(4999)), WINDOW),
            Status::Working
        );
        // Window wins even if the last drive was disabled meanwhile
        assert_eq!(
            Status::derive(false, Some(Duration::from_secs(1)), WINDOW),
            Status::Working
        );
    }

    #[test]
    fn test_reverts_when_window_elapses() {
        assert_eq!(
            Status::derive(true, Some(WINDOW), WINDOW),
            Status::Enabled
        );
        assert_eq!(
            Status::derive(false, Some(WINDOW), WINDOW),
            Status::Disabled
        );
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&Status::Working).unwrap(), "\"working\"");
        assert_eq!(Status::Disabled.as_str(), "disabled");
    }
}
