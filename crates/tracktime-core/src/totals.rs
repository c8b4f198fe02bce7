//! Per-day time totals.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::session::Session;
use crate::split::split_by_day;
use crate::types::ValidationError;

/// Tracked time attributed to one calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayTotal {
    pub date: NaiveDate,
    /// Sum of the durations of all pieces falling on `date`.
    pub duration: Duration,
    /// Number of single-day pieces that contributed.
    pub sessions: usize,
}

/// Splits sessions by day and sums the pieces per calendar date.
///
/// Overlapping sessions are summed rather than unioned. Totals are returned
/// in ascending date order; dates with no tracked time are omitted.
pub fn daily_totals(sessions: &[Session]) -> Result<Vec<DayTotal>, ValidationError> {
    let mut by_date: BTreeMap<NaiveDate, DayTotal> = BTreeMap::new();

    for piece in split_by_day(sessions)? {
        let date = piece.date();
        let total = by_date.entry(date).or_insert_with(|| DayTotal {
            date,
            duration: Duration::zero(),
            sessions: 0,
        });
        total.duration += piece.duration();
        total.sessions += 1;
    }

    Ok(by_date.into_values().collect())
}
