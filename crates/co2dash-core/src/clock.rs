//! Source of "today".

use std::sync::Mutex;

use time::OffsetDateTime;

use co2dash_types::DayKey;

/// Supplies the current calendar day.
pub trait Clock: Send + Sync {
    /// The current calendar day.
    fn today(&self) -> DayKey;
}

/// Wall clock in the local timezone, falling back to UTC when the local
/// offset cannot be determined.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> DayKey {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        DayKey::new(now.date())
    }
}

/// A settable clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    today: Mutex<DayKey>,
}

impl FixedClock {
    /// Create a clock stuck on `today`.
    pub fn new(today: DayKey) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    /// Move the clock to another day.
    pub fn set(&self, today: DayKey) {
        *self.today.lock().unwrap_or_else(|e| e.into_inner()) = today;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> DayKey {
        *self.today.lock().unwrap_or_else(|e| e.into_inner())
    }
}
