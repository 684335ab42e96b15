//! Line-oriented control over stdin/stdout

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::commands::{execute, parse_error_reply, Request};
use super::ControlHandle;

/// Answer commands read from `reader` until EOF or `exit`.
///
/// EOF only ends this reader; the daemon keeps pinging.
pub(crate) async fn serve_lines<R, W>(
    handle: ControlHandle,
    reader: R,
    mut writer: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let (reply, exit) = match line.parse::<Request>() {
            Ok(request) => {
                debug!("Control command: {:?}", request);
                let exit = request == Request::Exit;
                (execute(&handle, request).await, exit)
            }
            Err(e) => (parse_error_reply(&e), false),
        };

        let mut out = reply.to_string();
        out.push('\n');
        writer.write_all(out.as_bytes()).await?;
        writer.flush().await?;

        if exit {
            break;
        }
    }

    Ok(())
}

/// Serve commands from the process's stdin in the background.
pub(crate) fn spawn_stdin_control(handle: ControlHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        let reader = BufReader::new(tokio::io::stdin());
        match serve_lines(handle, reader, tokio::io::stdout()).await {
            Ok(()) => debug!("Stdin control closed"),
            Err(e) => warn!("Stdin control failed: {}", e),
        }
    })
}
