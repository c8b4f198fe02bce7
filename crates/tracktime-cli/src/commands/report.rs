//! Report command for per-day time totals.
//!
//! This module implements `tracktime report`. Sessions are split at midnight
//! so time is attributed to the calendar day it was spent on, then summed per
//! day. Output is human-readable or JSON.

use std::fmt::Write;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracktime_core::{DayTotal, Session, daily_totals, ordinal};
use tracktime_db::Database;

use super::util::format_duration;

/// Computed report data.
#[derive(Debug)]
pub struct ReportData {
    pub generated_at: NaiveDateTime,
    /// First day requested, if bounded.
    pub from: Option<NaiveDate>,
    /// Last day requested, if bounded.
    pub to: Option<NaiveDate>,
    /// Days with tracked time, ascending.
    pub days: Vec<DayTotal>,
}

impl ReportData {
    fn total(&self) -> Duration {
        self.days
            .iter()
            .fold(Duration::zero(), |acc, day| acc + day.duration)
    }
}

// ========== Report Generation ==========

/// Generates report data from the session log.
///
/// Sessions crossing a range boundary contribute only the pieces that fall
/// inside `from..=to`.
pub fn generate_report_data(
    db: &Database,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    generated_at: NaiveDateTime,
) -> Result<ReportData> {
    let stored = match (from, to) {
        (Some(from), Some(to)) => db.sessions_between(from, to)?,
        _ => db.list_sessions()?,
    };
    let sessions: Vec<Session> = stored.iter().map(|s| s.session).collect();

    let days = daily_totals(&sessions)
        .context("session log contains an invalid interval")?
        .into_iter()
        .filter(|day| from.is_none_or(|from| day.date >= from))
        .filter(|day| to.is_none_or(|to| day.date <= to))
        .collect();

    Ok(ReportData {
        generated_at,
        from,
        to,
        days,
    })
}

// ========== Formatting ==========

/// Formats a date as e.g. "Monday, January 1st".
pub fn format_day_heading(date: NaiveDate) -> String {
    format!(
        "{}, {} {}",
        date.format("%A"),
        date.format("%B"),
        ordinal(i64::from(date.day()))
    )
}

/// Formats the period description for the report header.
fn format_period_description(data: &ReportData) -> String {
    let start = data.from.or_else(|| data.days.first().map(|d| d.date));
    let end = data.to.or_else(|| data.days.last().map(|d| d.date));

    match (start, end) {
        // "Wednesday, Jan 29, 2025"
        (Some(start), Some(end)) if start == end => start.format("%A, %b %-d, %Y").to_string(),
        // "Jan 27, 2025 to Feb 2, 2025"
        (Some(start), Some(end)) => format!(
            "{} to {}",
            start.format("%b %-d, %Y"),
            end.format("%b %-d, %Y")
        ),
        (Some(start), None) => format!("since {}", start.format("%b %-d, %Y")),
        (None, Some(end)) => format!("through {}", end.format("%b %-d, %Y")),
        (None, None) => "all sessions".to_string(),
    }
}

/// Generates a 10-character progress bar.
/// Values <5% of max get a single block for visibility.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress_bar(value: i64, max: i64) -> String {
    if max <= 0 {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = value as f64 / max as f64;
    let filled = if ratio < 0.05 && value > 0 {
        1
    } else {
        (ratio * 10.0).round().clamp(0.0, 10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

/// Formats the human-readable report output.
pub fn format_report(data: &ReportData) -> String {
    let mut output = String::new();

    writeln!(output, "TIME REPORT: {}", format_period_description(data)).unwrap();

    if data.days.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No sessions recorded in this period.").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Hint: Run 'tracktime start' to record a session.").unwrap();
        return output;
    }

    let max_ms = data
        .days
        .iter()
        .map(|d| d.duration.num_milliseconds())
        .max()
        .unwrap_or(0);

    writeln!(output).unwrap();
    for day in &data.days {
        let heading = format_day_heading(day.date);
        let duration = format_duration(day.duration);
        let bar = progress_bar(day.duration.num_milliseconds(), max_ms);
        writeln!(output, "{heading:<30}{duration:>8}  {bar}").unwrap();
    }

    let total = data.total();
    let day_count = i32::try_from(data.days.len()).unwrap_or(i32::MAX);

    writeln!(output).unwrap();
    writeln!(output, "SUMMARY").unwrap();
    writeln!(output, "───────").unwrap();
    writeln!(output, "Days tracked:   {}", data.days.len()).unwrap();
    writeln!(output, "Total tracked:  {}", format_duration(total)).unwrap();
    writeln!(output, "Daily average:  {}", format_duration(total / day_count)).unwrap();

    output
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub generated_at: String,
    pub period: JsonPeriod,
    pub days: Vec<JsonDay>,
    pub totals: JsonTotals,
}

#[derive(Debug, Serialize)]
pub struct JsonPeriod {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JsonDay {
    pub date: String,
    pub duration_ms: i64,
    pub sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct JsonTotals {
    pub duration_ms: i64,
    pub days: usize,
}

/// Formats report data as JSON.
pub fn format_report_json(data: &ReportData) -> Result<String> {
    let format_date = |d: NaiveDate| d.format("%Y-%m-%d").to_string();

    let report = JsonReport {
        generated_at: data.generated_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        period: JsonPeriod {
            start: data.from.map(format_date),
            end: data.to.map(format_date),
        },
        days: data
            .days
            .iter()
            .map(|day| JsonDay {
                date: format_date(day.date),
                duration_ms: day.duration.num_milliseconds(),
                sessions: day.sessions,
            })
            .collect(),
        totals: JsonTotals {
            duration_ms: data.total().num_milliseconds(),
            days: data.days.len(),
        },
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run<W: std::io::Write>(
    writer: &mut W,
    db: &Database,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let generated_at = Local::now().naive_local();
    let data = generate_report_data(db, from, to, generated_at)?;

    if json {
        writeln!(writer, "{}", format_report_json(&data)?)?;
    } else {
        write!(writer, "{}", format_report(&data))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn at(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn seeded_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        for (start, end) in [
            ("2024-01-01T23:00:00", "2024-01-02T01:00:00"),
            ("2024-01-02T09:00:00", "2024-01-02T17:30:00"),
            ("2024-01-04T10:00:00", "2024-01-04T10:45:00"),
        ] {
            let session = db.begin_session(at(start)).unwrap();
            db.close_session(session.id, at(end)).unwrap();
        }
        db
    }

    fn report(from: Option<&str>, to: Option<&str>) -> ReportData {
        generate_report_data(
            &seeded_db(),
            from.map(date),
            to.map(date),
            at("2024-01-05T12:00:00"),
        )
        .unwrap()
    }

    // ========== Heading Tests ==========

    #[test]
    fn test_day_heading_uses_ordinals() {
        assert_eq!(format_day_heading(date("2024-01-01")), "Monday, January 1st");
        assert_eq!(format_day_heading(date("2024-01-02")), "Tuesday, January 2nd");
        assert_eq!(format_day_heading(date("2024-01-03")), "Wednesday, January 3rd");
        assert_eq!(format_day_heading(date("2024-01-11")), "Thursday, January 11th");
        assert_eq!(format_day_heading(date("2024-01-22")), "Monday, January 22nd");
    }

    // ========== Progress Bar Tests ==========

    #[test]
    fn test_progress_bar_full_and_empty() {
        assert_eq!(progress_bar(100, 100), "██████████");
        assert_eq!(progress_bar(0, 100), "░░░░░░░░░░");
        assert_eq!(progress_bar(0, 0), "░░░░░░░░░░");
    }

    #[test]
    fn test_progress_bar_small_values_get_one_block() {
        assert_eq!(progress_bar(1, 100), "█░░░░░░░░░");
    }

    #[test]
    fn test_progress_bar_rounds() {
        assert_eq!(progress_bar(50, 100), "█████░░░░░");
        assert_eq!(progress_bar(74, 100), "███████░░░");
    }

    // ========== Report Data Tests ==========

    #[test]
    fn test_overnight_session_counts_toward_both_days() {
        let data = report(None, None);
        let dates: Vec<NaiveDate> = data.days.iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![date("2024-01-01"), date("2024-01-02"), date("2024-01-04")]
        );
        assert_eq!(data.days[1].sessions, 2);
        assert_eq!(data.days[1].duration, Duration::minutes(570));
    }

    #[test]
    fn test_range_keeps_only_pieces_inside() {
        let data = report(Some("2024-01-02"), Some("2024-01-02"));
        assert_eq!(data.days.len(), 1);
        assert_eq!(data.days[0].date, date("2024-01-02"));
        assert_eq!(data.days[0].duration, Duration::minutes(570));
    }

    #[test]
    fn test_open_ended_range() {
        let data = report(Some("2024-01-03"), None);
        assert_eq!(data.days.len(), 1);
        assert_eq!(data.days[0].date, date("2024-01-04"));
    }

    // ========== Output Tests ==========

    #[test]
    fn test_format_report_snapshot() {
        assert_snapshot!(format_report(&report(None, None)), @r"
        TIME REPORT: Jan 1, 2024 to Jan 4, 2024

        Monday, January 1st                59m  █░░░░░░░░░
        Tuesday, January 2nd            9h 30m  ██████████
        Thursday, January 4th              45m  █░░░░░░░░░

        SUMMARY
        ───────
        Days tracked:   3
        Total tracked:  11h 14m
        Daily average:  3h 44m
        ");
    }

    #[test]
    fn test_format_report_single_day_header() {
        let output = format_report(&report(Some("2024-01-02"), Some("2024-01-02")));
        assert!(output.starts_with("TIME REPORT: Tuesday, Jan 2, 2024\n"));
    }

    #[test]
    fn test_format_report_empty_period() {
        let output = format_report(&report(Some("2024-02-01"), Some("2024-02-07")));
        assert_snapshot!(output, @r"
        TIME REPORT: Feb 1, 2024 to Feb 7, 2024

        No sessions recorded in this period.

        Hint: Run 'tracktime start' to record a session.
        ");
    }

    #[test]
    fn test_format_report_json() {
        let json = format_report_json(&report(Some("2024-01-01"), Some("2024-01-02"))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["generated_at"], "2024-01-05T12:00:00");
        assert_eq!(value["period"]["start"], "2024-01-01");
        assert_eq!(value["period"]["end"], "2024-01-02");
        assert_eq!(value["days"][0]["date"], "2024-01-01");
        assert_eq!(value["days"][0]["duration_ms"], 3_599_999);
        assert_eq!(value["days"][1]["sessions"], 2);
        assert_eq!(value["totals"]["days"], 2);
        assert_eq!(value["totals"]["duration_ms"], 3_599_999 + 34_200_000);
    }
}
