//! Nullable clock: deterministic time for testing.

use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};
use sigver_types::Clock;

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to.
pub struct NullClock {
    current: Mutex<DateTime<Utc>>,
}

impl NullClock {
    pub fn new(initial: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(initial),
        }
    }

    /// Start at the given unix time in seconds.
    pub fn at_secs(secs: i64) -> Self {
        let initial = Utc
            .timestamp_opt(secs, 0)
            .single()
            .unwrap_or_else(|| DateTime::<Utc>::UNIX_EPOCH);
        Self::new(initial)
    }

    /// Advance time.
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().unwrap();
        *current += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.current.lock().unwrap() = to;
    }
}

impl Default for NullClock {
    /// 2024-01-01T00:00:00Z
    fn default() -> Self {
        Self::at_secs(1_704_067_200)
    }
}

impl Clock for NullClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap()
    }
}
