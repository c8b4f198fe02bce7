//! Storage layer for tracktime.
//!
//! Provides persistence for the session log using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! This means a `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! The live recorder shares one connection between the autosave task and the
//! foreground task through a `Mutex<Database>`.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are local wall-clock times stored as TEXT with a fixed six-digit
//! fraction (e.g., `2024-01-15T10:30:00.000000`). The fixed width ensures:
//! - Lexicographic ordering matches chronological ordering
//! - Human-readable values in the database
//! - Round-trips at the microsecond resolution the day splitter uses
//!
//! ## Session Status
//!
//! `status` is `open` while a recorder is still autosaving the row and
//! `closed` once the session is finalized. An `open` row with no running
//! recorder is left over from a crash; [`Database::close_stale_sessions`]
//! finalizes it at its last autosaved end.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, SubsecRound};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use tracktime_core::{Session, SessionStatus, ValidationError};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for session {session_id}: {timestamp}")]
    TimestampParse {
        session_id: i64,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored status column holds an unknown value.
    #[error("invalid status for session {session_id}")]
    InvalidStatus {
        session_id: i64,
        #[source]
        source: ValidationError,
    },
    /// A session would end (or was stored as ending) before it starts.
    #[error("session {session_id} has an invalid interval")]
    InvalidInterval {
        session_id: i64,
        #[source]
        source: ValidationError,
    },
    /// No session exists with the given ID.
    #[error("session {0} not found")]
    SessionNotFound(i64),
    /// The session has already been finalized.
    #[error("session {0} is already closed")]
    SessionClosed(i64),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A session row from the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredSession {
    pub id: i64,
    pub session: Session,
    pub status: SessionStatus,
}

impl StoredSession {
    pub const fn start(&self) -> NaiveDateTime {
        self.session.start
    }

    pub const fn end(&self) -> NaiveDateTime {
        self.session.end
    }

    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }
}

/// Raw column values before parsing.
struct SessionRow {
    id: i64,
    start_time: String,
    end_time: String,
    status: String,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Sessions table: one row per tracked session
            -- start_time/end_time: local wall-clock, '%Y-%m-%dT%H:%M:%S%.6f'
            -- status: 'open' while being recorded, 'closed' once finalized
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'open'
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_start ON sessions(start_time);
            CREATE INDEX IF NOT EXISTS idx_sessions_status ON sessions(status);
            ",
        )?;
        Ok(())
    }

    /// Records a new open session starting (and provisionally ending) at `start`.
    pub fn begin_session(&self, start: NaiveDateTime) -> Result<StoredSession, DbError> {
        let start = format_timestamp(start);
        self.conn.execute(
            "INSERT INTO sessions (start_time, end_time, status) VALUES (?1, ?1, ?2)",
            params![start, SessionStatus::Open.as_str()],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, %start, "began session");
        self.require_session(id)
    }

    /// Moves the provisional end of an open session to `end`.
    ///
    /// This is the autosave write: it keeps the session open.
    pub fn touch_session(&self, id: i64, end: NaiveDateTime) -> Result<StoredSession, DbError> {
        self.update_end(id, end, SessionStatus::Open)
    }

    /// Finalizes an open session at `end`.
    pub fn close_session(&self, id: i64, end: NaiveDateTime) -> Result<StoredSession, DbError> {
        self.update_end(id, end, SessionStatus::Closed)
    }

    fn update_end(
        &self,
        id: i64,
        end: NaiveDateTime,
        status: SessionStatus,
    ) -> Result<StoredSession, DbError> {
        let current = self.require_session(id)?;
        if !current.is_open() {
            return Err(DbError::SessionClosed(id));
        }

        let end = end.trunc_subsecs(6);
        Session::new(current.start(), end).map_err(|source| DbError::InvalidInterval {
            session_id: id,
            source,
        })?;

        self.conn.execute(
            "UPDATE sessions SET end_time = ?1, status = ?2 WHERE id = ?3",
            params![format_timestamp(end), status.as_str(), id],
        )?;
        self.require_session(id)
    }

    /// Finalizes every open session at its last autosaved end.
    ///
    /// Returns the sessions that were closed.
    pub fn close_stale_sessions(&mut self) -> Result<Vec<StoredSession>, DbError> {
        let stale = self.query_sessions(
            "
            SELECT id, start_time, end_time, status
            FROM sessions
            WHERE status = 'open'
            ORDER BY start_time ASC, id ASC
            ",
            [],
        )?;
        if stale.is_empty() {
            return Ok(stale);
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("UPDATE sessions SET status = 'closed' WHERE id = ?")?;
            for session in &stale {
                stmt.execute([session.id])?;
            }
        }
        tx.commit()?;

        Ok(stale
            .into_iter()
            .map(|s| StoredSession {
                status: SessionStatus::Closed,
                ..s
            })
            .collect())
    }

    /// Returns the session with the given ID, if any.
    pub fn get_session(&self, id: i64) -> Result<Option<StoredSession>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, start_time, end_time, status FROM sessions WHERE id = ?",
                [id],
                read_row,
            )
            .optional()?;
        row.map(parse_row).transpose()
    }

    fn require_session(&self, id: i64) -> Result<StoredSession, DbError> {
        self.get_session(id)?.ok_or(DbError::SessionNotFound(id))
    }

    /// Returns the most recently started open session, if any.
    pub fn open_session(&self) -> Result<Option<StoredSession>, DbError> {
        let mut sessions = self.query_sessions(
            "
            SELECT id, start_time, end_time, status
            FROM sessions
            WHERE status = 'open'
            ORDER BY start_time DESC, id DESC
            LIMIT 1
            ",
            [],
        )?;
        Ok(sessions.pop())
    }

    /// Lists all sessions ordered by start time then ID.
    pub fn list_sessions(&self) -> Result<Vec<StoredSession>, DbError> {
        self.query_sessions(
            "
            SELECT id, start_time, end_time, status
            FROM sessions
            ORDER BY start_time ASC, id ASC
            ",
            [],
        )
    }

    /// Lists sessions that overlap the calendar dates `from..=to`.
    ///
    /// Sessions are returned whole; callers split them by day and drop
    /// pieces outside the range.
    pub fn sessions_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<StoredSession>, DbError> {
        if to < from {
            return Ok(Vec::new());
        }
        let window_start = format_timestamp(from.and_time(NaiveTime::MIN));
        let window_end = to
            .succ_opt()
            .map(|d| format_timestamp(d.and_time(NaiveTime::MIN)));

        match window_end {
            Some(window_end) => self.query_sessions(
                "
                SELECT id, start_time, end_time, status
                FROM sessions
                WHERE start_time < ?1 AND end_time >= ?2
                ORDER BY start_time ASC, id ASC
                ",
                [window_end, window_start],
            ),
            None => self.query_sessions(
                "
                SELECT id, start_time, end_time, status
                FROM sessions
                WHERE end_time >= ?1
                ORDER BY start_time ASC, id ASC
                ",
                [window_start],
            ),
        }
    }

    /// Counts sessions in the log.
    pub fn session_count(&self) -> Result<i64, DbError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?)
    }

    fn query_sessions<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<StoredSession>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, read_row)?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(parse_row(row?)?);
        }
        Ok(sessions)
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRow> {
    Ok(SessionRow {
        id: row.get(0)?,
        start_time: row.get(1)?,
        end_time: row.get(2)?,
        status: row.get(3)?,
    })
}

fn parse_row(row: SessionRow) -> Result<StoredSession, DbError> {
    let start = parse_timestamp(&row.start_time, row.id)?;
    let end = parse_timestamp(&row.end_time, row.id)?;
    let status = row
        .status
        .parse::<SessionStatus>()
        .map_err(|source| DbError::InvalidStatus {
            session_id: row.id,
            source,
        })?;
    let session = Session::new(start, end).map_err(|source| DbError::InvalidInterval {
        session_id: row.id,
        source,
    })?;
    Ok(StoredSession {
        id: row.id,
        session,
        status,
    })
}

fn parse_timestamp(timestamp: &str, session_id: i64) -> Result<NaiveDateTime, DbError> {
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_PARSE_FORMAT).map_err(|source| {
        DbError::TimestampParse {
            session_id,
            timestamp: timestamp.to_string(),
            source,
        }
    })
}

fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}
