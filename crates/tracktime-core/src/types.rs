//! Core type definitions with validation.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A session ends before it starts.
    #[error("invalid interval: end {end} precedes start {start}")]
    InvalidInterval {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// Invalid session status value.
    #[error("invalid session status: {value}")]
    InvalidSessionStatus { value: String },
}

/// Whether a recorded session is still being written by a recorder.
///
/// This enum encodes the valid status values, preventing invalid string values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// The session is live; its end time is the most recent autosave.
    Open,
    /// The session has been finalized.
    Closed,
}

impl SessionStatus {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(ValidationError::InvalidSessionStatus {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    #[test]
    fn session_status_from_str() {
        assert_eq!(
            "open".parse::<SessionStatus>().unwrap(),
            SessionStatus::Open
        );
        assert_eq!(
            "closed".parse::<SessionStatus>().unwrap(),
            SessionStatus::Closed
        );
        assert!("finished".parse::<SessionStatus>().is_err());
    }

    #[test]
    fn session_status_serde_matches_storage_string() {
        for status in [SessionStatus::Open, SessionStatus::Closed] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn invalid_interval_message_names_both_ends() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let err = ValidationError::InvalidInterval { start, end };
        assert_eq!(
            err.to_string(),
            "invalid interval: end 2024-01-01 00:00:00 precedes start 2024-01-02 00:00:00"
        );
    }
}
