//! Text command parsing and execution
//!
//! One command per line. Replies are single-line JSON objects carrying an
//! `ok` flag, so scripts driving the daemon over a pipe can parse them.

use hddping_core::{DriveId, HddPingError, INTERVAL_MENU_MINUTES};
use serde_json::{json, Value};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use super::ControlHandle;

/// A parsed control command
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Request {
    Ping,
    Toggle(DriveId),
    Enable(DriveId),
    Disable(DriveId),
    /// New interval in minutes
    Interval(u64),
    Intervals,
    Drives,
    Status,
    Save,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("{0} requires a drive")]
    MissingDrive(&'static str),

    #[error("invalid interval: {0} (expected a positive number of minutes)")]
    InvalidInterval(String),
}

impl FromStr for Request {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        // Drive roots may contain spaces, so the drive is the rest of the line
        let drive = |name: &'static str| {
            if rest.is_empty() {
                Err(ParseError::MissingDrive(name))
            } else {
                Ok(DriveId::new(rest))
            }
        };

        match verb.to_ascii_lowercase().as_str() {
            "" => Err(ParseError::Empty),
            "ping" => Ok(Request::Ping),
            "toggle" => drive("toggle").map(Request::Toggle),
            "enable" => drive("enable").map(Request::Enable),
            "disable" => drive("disable").map(Request::Disable),
            "interval" => match rest.parse::<u64>() {
                Ok(minutes) if minutes > 0 => Ok(Request::Interval(minutes)),
                _ => Err(ParseError::InvalidInterval(rest.to_string())),
            },
            "intervals" => Ok(Request::Intervals),
            "drives" => Ok(Request::Drives),
            "status" => Ok(Request::Status),
            "save" => Ok(Request::Save),
            "exit" | "quit" => Ok(Request::Exit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

fn error_reply(e: impl std::fmt::Display) -> Value {
    json!({ "ok": false, "error": e.to_string() })
}

/// Build the reply for a line that failed to parse.
pub(crate) fn parse_error_reply(e: &ParseError) -> Value {
    error_reply(e)
}

/// Run `request` against the control loop and build the reply.
pub(crate) async fn execute(handle: &ControlHandle, request: Request) -> Value {
    match run(handle, request).await {
        Ok(reply) => reply,
        Err(e) => error_reply(e),
    }
}

async fn run(handle: &ControlHandle, request: Request) -> Result<Value, HddPingError> {
    let reply = match request {
        Request::Ping => {
            let started = handle.ping_now().await?;
            json!({ "ok": true, "started": started })
        }
        Request::Toggle(drive) => {
            let enabled = handle.toggle_drive(drive.clone()).await?;
            json!({ "ok": true, "drive": drive, "enabled": enabled })
        }
        Request::Enable(drive) => {
            handle.set_drive(drive.clone(), true).await?;
            json!({ "ok": true, "drive": drive, "enabled": true })
        }
        Request::Disable(drive) => {
            handle.set_drive(drive.clone(), false).await?;
            json!({ "ok": true, "drive": drive, "enabled": false })
        }
        Request::Interval(minutes) => {
            let interval = Duration::from_secs(minutes.saturating_mul(60));
            handle.set_interval(interval).await?;
            json!({ "ok": true, "interval_minutes": minutes })
        }
        Request::Intervals => {
            let snapshot = handle.snapshot().await?;
            let menu: Vec<Value> = INTERVAL_MENU_MINUTES
                .map(|minutes| {
                    json!({
                        "minutes": minutes,
                        "selected": minutes * 60 == snapshot.interval_secs,
                    })
                })
                .collect();
            json!({ "ok": true, "intervals": menu })
        }
        Request::Drives => {
            let snapshot = handle.snapshot().await?;
            json!({ "ok": true, "drives": snapshot.drives })
        }
        Request::Status => {
            let snapshot = handle.snapshot().await?;
            let mut reply = serde_json::to_value(&snapshot)?;
            if let Value::Object(map) = &mut reply {
                map.insert("ok".to_string(), Value::Bool(true));
            }
            reply
        }
        Request::Save => {
            let saved = handle.save().await?;
            json!({ "ok": saved })
        }
        Request::Exit => {
            handle.exit().await?;
            json!({ "ok": true })
        }
    };
    Ok(reply)
}
