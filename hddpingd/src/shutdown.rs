//! Signal handling and shutdown persistence
//!
//! Ctrl+C and SIGTERM end the control loop; the caller then saves the
//! settings once. On unix, SIGUSR1 triggers an immediate ping, the way the
//! tray's "Ping now" entry would.

use hddping_core::Configuration;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::SettingsStore;
use crate::control::ControlHandle;

/// Wait for a termination signal.
///
/// A handler that cannot be installed simply never fires.
async fn terminate_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        },
    }
}

/// Forward SIGUSR1 as "ping now" until the control loop goes away.
#[cfg(unix)]
async fn forward_ping_signal(handle: ControlHandle) {
    let mut sig = match signal::unix::signal(signal::unix::SignalKind::user_defined1()) {
        Ok(sig) => sig,
        Err(e) => {
            warn!("Failed to install SIGUSR1 handler: {}", e);
            return;
        }
    };

    while sig.recv().await.is_some() {
        info!("Received SIGUSR1, pinging now");
        if handle.ping_now().await.is_err() {
            break;
        }
    }
}

/// Translate process signals into control commands.
pub(crate) fn spawn_signal_handler(handle: ControlHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        #[cfg(unix)]
        let pings = forward_ping_signal(handle.clone());
        #[cfg(not(unix))]
        let pings = std::future::pending::<()>();

        tokio::select! {
            _ = terminate_signal() => {
                if let Err(e) = handle.exit().await {
                    warn!("Failed to stop control loop: {}", e);
                }
            }
            _ = pings => {}
        }
    })
}

/// Save the final configuration once, best effort.
pub(crate) async fn persist_settings(store: &SettingsStore, config: &Configuration) -> bool {
    info!(
        "Persisting {} enabled drive(s) before exit",
        config.enabled_drives().len()
    );
    store.save(config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use hddping_core::DriveId;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_persist_settings_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = SettingsStore::new(temp_dir.path().join(".hddping-settings.toml"));

        let mut config = Configuration::default();
        config.add_or_update(DriveId::new("/"), true);
        config.set_interval(Duration::from_secs(600)).unwrap();

        assert!(persist_settings(&store, &config).await);
        let loaded = store.load(&[DriveId::new("/")]).await;
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_persist_settings_failure_is_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let store = SettingsStore::new(temp_dir.path().join("no/such/dir/settings.toml"));

        assert!(!persist_settings(&store, &Configuration::default()).await);
    }
}
