//! Wall-clock source for session timestamps.

use chrono::{Local, NaiveDateTime};

/// Provides the current local wall-clock time. Swappable so recorder tests
/// can control the timestamps written to the log.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use chrono::{Duration, NaiveDateTime};

    use super::Clock;

    /// A clock that only moves when told to.
    pub struct ManualClock(Mutex<NaiveDateTime>);

    impl ManualClock {
        pub fn at(s: &str) -> Self {
            Self(Mutex::new(s.parse().unwrap()))
        }

        pub fn advance(&self, by: Duration) {
            *self.0.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> NaiveDateTime {
            *self.0.lock().unwrap()
        }
    }
}
