//! Tracked work sessions.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// A contiguous span of tracked time.
///
/// Timestamps are local wall-clock times. The calendar date of a session
/// boundary is the date component of the timestamp, so day boundaries are
/// unaffected by DST transitions.
///
/// Values from [`Session::new`] or deserialization satisfy `end >= start`.
/// The fields are public, so a struct literal is unchecked until
/// [`Session::validate`] is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SessionFields")]
pub struct Session {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Deserialize)]
struct SessionFields {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TryFrom<SessionFields> for Session {
    type Error = ValidationError;

    fn try_from(fields: SessionFields) -> Result<Self, Self::Error> {
        Self::new(fields.start, fields.end)
    }
}

impl Session {
    /// Creates a session, rejecting intervals that end before they start.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, ValidationError> {
        let session = Self { start, end };
        session.validate()?;
        Ok(session)
    }

    /// Checks the `end >= start` invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.end < self.start {
            return Err(ValidationError::InvalidInterval {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Elapsed time between start and end.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// The calendar date the session starts on.
    pub const fn date(&self) -> NaiveDate {
        self.start.date()
    }

    /// Whether start and end fall on the same calendar date.
    pub fn is_single_day(&self) -> bool {
        self.start.date() == self.end.date()
    }
}
