//! Status command for showing the session log and any open session.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracktime_db::Database;

use super::util::{format_duration, format_timestamp};

pub fn run<W: Write>(writer: &mut W, db: &Database, database_path: &Path) -> Result<()> {
    let count = db.session_count().context("failed to count sessions")?;
    let open = db.open_session().context("failed to read open session")?;

    writeln!(writer, "Time tracker status")?;
    writeln!(writer, "Log:      {}", database_path.display())?;
    writeln!(writer, "Sessions: {count}")?;

    match open {
        Some(session) => {
            writeln!(writer, "Open session:")?;
            writeln!(writer, "- started:    {}", format_timestamp(session.start()))?;
            writeln!(
                writer,
                "- last saved: {} ({} so far)",
                format_timestamp(session.end()),
                format_duration(session.session.duration())
            )?;
        }
        None => writeln!(writer, "No open session.")?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDateTime;
    use insta::assert_snapshot;

    fn at(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    #[test]
    fn status_command_outputs_open_session() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("tracktime.db");
        let db = Database::open(&db_path).unwrap();

        let done = db.begin_session(at("2025-01-01T09:00:00")).unwrap();
        db.close_session(done.id, at("2025-01-01T10:00:00")).unwrap();
        let open = db.begin_session(at("2025-01-02T09:00:00")).unwrap();
        db.touch_session(open.id, at("2025-01-02T10:15:00")).unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, &db_path).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&db_path.display().to_string(), "[TEMP]/tracktime.db");
        assert_snapshot!(output, @r"
        Time tracker status
        Log:      [TEMP]/tracktime.db
        Sessions: 2
        Open session:
        - started:    01/02/25, 09:00:00
        - last saved: 01/02/25, 10:15:00 (1h 15m so far)
        ");
    }

    #[test]
    fn status_command_without_open_session() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        run(&mut output, &db, Path::new("log.db")).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Sessions: 0"));
        assert!(output.ends_with("No open session.\n"));
    }
}
