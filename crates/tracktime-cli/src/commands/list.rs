//! List command for printing the session log.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;
use tracktime_core::{Session, SessionStatus, split_by_day};
use tracktime_db::{Database, StoredSession};

use super::util::format_timestamp;

/// One listed entry. With `--by-day`, several entries may share an `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    /// ID of the recorded session this entry comes from.
    pub id: i64,
    pub start: String,
    pub end: String,
    pub duration_ms: i64,
    pub status: SessionStatus,
}

/// The entries one stored session lists as.
fn session_pieces(stored: &StoredSession, by_day: bool) -> Result<Vec<Session>> {
    if by_day {
        split_by_day(&[stored.session])
            .with_context(|| format!("session {} in the log is malformed", stored.id))
    } else {
        Ok(vec![stored.session])
    }
}

/// Builds the entries to list, optionally split at midnight.
pub fn list_entries(sessions: &[StoredSession], by_day: bool) -> Result<Vec<ListEntry>> {
    let mut entries = Vec::with_capacity(sessions.len());
    for stored in sessions {
        let pieces = session_pieces(stored, by_day)?;
        entries.extend(pieces.into_iter().map(|piece| ListEntry {
            id: stored.id,
            start: piece.start.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            end: piece.end.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            duration_ms: piece.duration().num_milliseconds(),
            status: stored.status,
        }));
    }
    Ok(entries)
}

/// Writes sessions one per line, numbered from 1.
fn write_human<W: Write>(writer: &mut W, sessions: &[StoredSession], by_day: bool) -> Result<()> {
    if sessions.is_empty() {
        writeln!(writer, "No sessions recorded.")?;
        return Ok(());
    }

    let mut n = 0;
    for stored in sessions {
        let pieces = session_pieces(stored, by_day)?;
        for piece in pieces {
            n += 1;
            let open = if stored.is_open() { " (open)" } else { "" };
            writeln!(
                writer,
                "Session {n}: Start: {} | End: {}{open}",
                format_timestamp(piece.start),
                format_timestamp(piece.end),
            )?;
        }
    }
    Ok(())
}

/// Runs the list command.
pub fn run<W: Write>(writer: &mut W, db: &Database, by_day: bool, json: bool) -> Result<()> {
    let sessions = db.list_sessions().context("failed to read session log")?;

    if json {
        let entries = list_entries(&sessions, by_day)?;
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
    } else {
        write_human(writer, &sessions, by_day)?;
    }
    Ok(())
}
