//! Live session recording with periodic autosave.
//!
//! While a session is open, an autosave task rewrites its end time every
//! period so a crash loses at most one period of tracked time. Every write
//! goes through the shared `Mutex<Database>`; the guard is taken inside
//! synchronous helpers and never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracktime_db::{Database, StoredSession};

use crate::clock::Clock;

/// Handle to the currently open session.
#[derive(Clone)]
pub struct Recorder {
    db: Arc<Mutex<Database>>,
    session_id: i64,
    clock: Arc<dyn Clock>,
}

impl Recorder {
    /// Opens a new session at the current time.
    ///
    /// Sessions left open by a recorder that never finished are closed first
    /// at their last autosaved end.
    pub fn start(db: Arc<Mutex<Database>>, clock: Arc<dyn Clock>) -> Result<Self> {
        let session = {
            let mut guard = lock(&db)?;
            for stale in guard
                .close_stale_sessions()
                .context("failed to close stale sessions")?
            {
                tracing::warn!(
                    id = stale.id,
                    start = %stale.start(),
                    end = %stale.end(),
                    "closed session left open by an earlier run"
                );
            }
            guard
                .begin_session(clock.now())
                .context("failed to begin session")?
        };

        tracing::info!(id = session.id, start = %session.start(), "session started");
        Ok(Self {
            db,
            session_id: session.id,
            clock,
        })
    }

    pub const fn session_id(&self) -> i64 {
        self.session_id
    }

    /// Writes the current time as the open session's provisional end.
    pub fn save(&self) -> Result<StoredSession> {
        let now = self.clock.now();
        let session = lock(&self.db)?
            .touch_session(self.session_id, now)
            .context("failed to autosave session")?;
        tracing::debug!(id = session.id, end = %session.end(), "autosaved session");
        Ok(session)
    }

    /// Saves every `period` until `cancel` fires.
    ///
    /// A zero period disables autosave; the task then only waits for
    /// cancellation. Failed saves are logged and retried next period.
    pub async fn autosave(&self, period: Duration, cancel: CancellationToken) {
        if period.is_zero() {
            tracing::debug!("autosave disabled");
            cancel.cancelled().await;
            return;
        }

        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.save() {
                        tracing::warn!(error = %e, "autosave failed");
                    }
                }
            }
        }
    }

    /// Finalizes the session at the current time.
    pub fn finish(self) -> Result<StoredSession> {
        let now = self.clock.now();
        let session = lock(&self.db)?
            .close_session(self.session_id, now)
            .context("failed to finalize session")?;
        tracing::info!(
            id = session.id,
            start = %session.start(),
            end = %session.end(),
            "session finished"
        );
        Ok(session)
    }
}

fn lock(db: &Mutex<Database>) -> Result<MutexGuard<'_, Database>> {
    db.lock().map_err(|_| anyhow!("session log lock poisoned"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDateTime;
    use tracktime_core::SessionStatus;

    use crate::clock::testing::ManualClock;

    fn at(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    fn setup(start: &str) -> (Arc<Mutex<Database>>, Arc<ManualClock>) {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        (db, Arc::new(ManualClock::at(start)))
    }

    fn current(db: &Mutex<Database>, id: i64) -> StoredSession {
        db.lock().unwrap().get_session(id).unwrap().unwrap()
    }

    #[test]
    fn start_opens_zero_length_session() {
        let (db, clock) = setup("2024-05-05T09:00:00");
        let recorder = Recorder::start(db.clone(), clock).unwrap();

        let session = current(&db, recorder.session_id());
        assert!(session.is_open());
        assert_eq!(session.start(), at("2024-05-05T09:00:00"));
        assert_eq!(session.end(), at("2024-05-05T09:00:00"));
    }

    #[test]
    fn start_closes_sessions_left_open() {
        let (db, clock) = setup("2024-05-05T09:00:00");
        let crashed = {
            let guard = db.lock().unwrap();
            let s = guard.begin_session(at("2024-05-04T22:00:00")).unwrap();
            guard.touch_session(s.id, at("2024-05-04T23:30:00")).unwrap();
            s.id
        };

        let recorder = Recorder::start(db.clone(), clock).unwrap();

        let stale = current(&db, crashed);
        assert_eq!(stale.status, SessionStatus::Closed);
        assert_eq!(stale.end(), at("2024-05-04T23:30:00"));
        assert_eq!(
            db.lock().unwrap().open_session().unwrap().map(|s| s.id),
            Some(recorder.session_id())
        );
    }

    #[test]
    fn save_moves_end_to_clock_time() {
        let (db, clock) = setup("2024-05-05T09:00:00");
        let recorder = Recorder::start(db, clock.clone()).unwrap();

        clock.advance(chrono::Duration::minutes(5));
        let saved = recorder.save().unwrap();
        assert!(saved.is_open());
        assert_eq!(saved.end(), at("2024-05-05T09:05:00"));
    }

    #[test]
    fn finish_closes_session() {
        let (db, clock) = setup("2024-05-05T23:30:00");
        let recorder = Recorder::start(db.clone(), clock.clone()).unwrap();

        clock.advance(chrono::Duration::hours(1));
        let finished = recorder.finish().unwrap();
        assert_eq!(finished.status, SessionStatus::Closed);
        assert_eq!(finished.end(), at("2024-05-06T00:30:00"));
        assert_eq!(db.lock().unwrap().open_session().unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn autosave_writes_each_period_until_cancelled() {
        let (db, clock) = setup("2024-05-05T09:00:00");
        let recorder = Recorder::start(db.clone(), clock.clone()).unwrap();
        let cancel = CancellationToken::new();

        let task = tokio::spawn({
            let recorder = recorder.clone();
            let cancel = cancel.clone();
            async move { recorder.autosave(Duration::from_secs(60), cancel).await }
        });

        clock.advance(chrono::Duration::minutes(1));
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(
            current(&db, recorder.session_id()).end(),
            at("2024-05-05T09:01:00")
        );

        clock.advance(chrono::Duration::minutes(1));
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(
            current(&db, recorder.session_id()).end(),
            at("2024-05-05T09:02:00")
        );

        cancel.cancel();
        task.await.unwrap();

        // No further writes after cancellation.
        clock.advance(chrono::Duration::minutes(10));
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(
            current(&db, recorder.session_id()).end(),
            at("2024-05-05T09:02:00")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_disables_autosave() {
        let (db, clock) = setup("2024-05-05T09:00:00");
        let recorder = Recorder::start(db.clone(), clock.clone()).unwrap();
        let cancel = CancellationToken::new();

        let task = tokio::spawn({
            let recorder = recorder.clone();
            let cancel = cancel.clone();
            async move { recorder.autosave(Duration::ZERO, cancel).await }
        });

        clock.advance(chrono::Duration::hours(1));
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(
            current(&db, recorder.session_id()).end(),
            at("2024-05-05T09:00:00")
        );

        cancel.cancel();
        task.await.unwrap();
    }
}
