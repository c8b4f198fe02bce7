//! Subdividing sessions at calendar-day boundaries.
//!
//! A session that crosses one or more midnights is cut into one piece per
//! calendar day it touches. Each piece but the last ends one [`SPLIT_TICK`]
//! before the following midnight, and the next piece starts exactly at that
//! midnight, so the pieces partition the original span without gaps or
//! overlaps.

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};

use crate::session::Session;
use crate::types::ValidationError;

/// Gap between the end of one day's piece and the start of the next.
///
/// One microsecond, the resolution timestamps are persisted at.
pub const SPLIT_TICK: TimeDelta = TimeDelta::microseconds(1);

/// Splits every session into single-day pieces.
///
/// Output order follows input order: all pieces of session `i` come before
/// any piece of session `i + 1`, and pieces of one session are chronological.
/// Sessions already within one calendar day are emitted unchanged.
///
/// Every input is validated before any output is produced, so a single
/// inverted interval fails the whole call with
/// [`ValidationError::InvalidInterval`].
pub fn split_by_day(sessions: &[Session]) -> Result<Vec<Session>, ValidationError> {
    for session in sessions {
        session.validate()?;
    }

    let mut pieces = Vec::with_capacity(sessions.len());
    for session in sessions {
        split_session_into(*session, &mut pieces);
    }

    tracing::trace!(
        sessions = sessions.len(),
        pieces = pieces.len(),
        "split sessions by day"
    );
    Ok(pieces)
}

/// Appends the single-day pieces of one validated session to `out`.
fn split_session_into(session: Session, out: &mut Vec<Session>) {
    let mut rest = session;
    while !rest.is_single_day() {
        let Some(next_midnight) = next_midnight(rest.start) else {
            break;
        };
        // Starts within the final tick of a day, or in a leap second, end
        // where they start.
        out.push(Session {
            start: rest.start,
            end: (next_midnight - SPLIT_TICK).max(rest.start),
        });
        rest = Session {
            start: next_midnight,
            end: rest.end,
        };
    }
    out.push(rest);
}

/// Returns 00:00:00 of the calendar date after `t`.
///
/// `None` only for the last representable date, which cannot start a session
/// that crosses a midnight.
fn next_midnight(t: NaiveDateTime) -> Option<NaiveDateTime> {
    t.date().succ_opt().map(|d| d.and_time(NaiveTime::MIN))
}
