//! Start command: record a live session until the user stops it.

use std::future::Future;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracktime_db::{Database, StoredSession};

use super::util::{format_duration, format_timestamp};
use crate::clock::Clock;
use crate::recorder::Recorder;

/// Runs the start command.
///
/// Opens a session, autosaves it every `autosave` while `stop` is pending,
/// then finalizes it. The session is finalized even if `stop` fails.
pub async fn run<W, F>(
    writer: &mut W,
    db: Database,
    clock: Arc<dyn Clock>,
    autosave: Duration,
    stop: F,
) -> Result<StoredSession>
where
    W: Write,
    F: Future<Output = Result<()>>,
{
    let db = Arc::new(Mutex::new(db));
    let recorder = Recorder::start(db, clock)?;

    writeln!(writer, "Session timer started. Press Enter to stop.")?;
    writer.flush()?;

    let cancel = CancellationToken::new();
    let autosave_task = tokio::spawn({
        let recorder = recorder.clone();
        let cancel = cancel.clone();
        async move { recorder.autosave(autosave, cancel).await }
    });

    let stopped = stop.await;
    cancel.cancel();
    autosave_task.await.context("autosave task panicked")?;

    let session = recorder.finish()?;
    writeln!(
        writer,
        "Session recorded: {} - {} ({})",
        format_timestamp(session.start()),
        format_timestamp(session.end()),
        format_duration(session.session.duration())
    )?;

    stopped?;
    Ok(session)
}

/// Waits for Enter, end of input, or Ctrl-C.
pub async fn wait_for_stop() -> Result<()> {
    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut line = String::new();

    tokio::select! {
        read = stdin.read_line(&mut line) => {
            read.context("failed to read from stdin")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            tracing::info!("interrupted; finalizing session");
        }
    }

    Ok(())
}
