//! Clock abstraction so that TTL expiry can be tested without waiting.
//!
//! - `SystemClock`: the wall clock
//! - `MockClock`: returns a controllable time that only moves when told to

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

pub trait Clock: Send + Sync + 'static {
    /// Return the current time.
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock clock for tests. `now()` returns a fixed time that advances only when you call `advance()`. Clones share the
/// same time.
#[derive(Clone, Debug)]
pub struct MockClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { current: Arc::new(Mutex::new(start)) }
    }

    /// Advance the mock clock by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += duration;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}
