//! hddping daemon
//!
//! Keeps selected drives awake by writing and deleting a small file on each
//! of them at a fixed interval.
//!
//! # Control
//!
//! Commands are read from stdin, one per line (`ping`, `toggle <drive>`,
//! `interval <minutes>`, `status`, `save`, `exit`, ...). Replies are JSON
//! lines on stdout. Pass `--no-stdin` when running detached.
//!
//! Settings are loaded at start and saved once on exit.

mod config;
mod control;
mod scheduler;
mod shutdown;
mod status;

use anyhow::Result;
use clap::Parser;
use config::{load_static_config, SettingsStore};
use control::{spawn_stdin_control, Controller};
use hddping_core::default_config_path;
use hddping_volumes::{DriveRegistry, FsPinger, SystemVolumes};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// How long in-flight pings get to finish once the daemon is exiting
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// hddping daemon
#[derive(Parser, Debug)]
#[command(name = "hddpingd")]
#[command(version, about = "Keep drives from spinning down", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to settings file (overrides the configuration file)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the drives that can be pinged as JSON and exit
    #[arg(long)]
    list_drives: bool,

    /// Do not read control commands from stdin
    #[arg(long)]
    no_stdin: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(args));

    // A ping stuck on an unresponsive drive must not keep the process alive
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn run(args: Args) -> Result<()> {
    // Determine config path: CLI flag > env var > default
    let config_path = args.config.unwrap_or_else(|| {
        std::env::var("HDDPING_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path())
    });
    info!("Configuration file: {}", config_path.display());

    let mut static_config = load_static_config(&config_path).await;
    if let Some(settings) = args.settings {
        static_config.settings_file = settings;
    }

    let registry = DriveRegistry::enumerate(&SystemVolumes);
    info!("Found {} drive(s) that can be pinged", registry.len());

    if args.list_drives {
        println!("{}", serde_json::to_string_pretty(registry.drives())?);
        return Ok(());
    }

    if registry.is_empty() {
        warn!("No eligible drives found; only the timer will run");
    }

    let store = SettingsStore::new(static_config.settings_file.clone());
    info!("Settings file: {}", store.path().display());
    let config = store.load(&registry.ids()).await;

    let (controller, handle) = Controller::new(
        config,
        registry,
        store.clone(),
        Arc::new(FsPinger),
        static_config.status.settle_window(),
    );

    status::spawn_status_log(handle.subscribe_status());
    shutdown::spawn_signal_handler(handle.clone());
    if !args.no_stdin {
        spawn_stdin_control(handle.clone());
    }
    // Background tasks hold their own handles
    drop(handle);

    info!("hddping daemon ready");
    let config = controller.run().await;

    shutdown::persist_settings(&store, &config).await;
    info!("Shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // stdout carries command replies, so logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["hddpingd"]);
        assert!(args.config.is_none());
        assert!(args.settings.is_none());
        assert!(!args.verbose);
        assert!(!args.list_drives);
        assert!(!args.no_stdin);
    }

    #[test]
    fn test_args_flags() {
        let args = Args::parse_from([
            "hddpingd",
            "--config",
            "/etc/hddping/config.toml",
            "-s",
            "/tmp/settings.toml",
            "-v",
            "--no-stdin",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("/etc/hddping/config.toml")));
        assert_eq!(args.settings, Some(PathBuf::from("/tmp/settings.toml")));
        assert!(args.verbose);
        assert!(args.no_stdin);
    }
}
