//! Wall-clock source, swappable for tests.

use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Local, TimeZone, Timelike};

/// Source of "now" as Unix epoch seconds.
pub trait Clock {
    fn now(&self) -> f64;

    /// Hour of day (0..24) at epoch seconds `at`. UTC unless overridden.
    fn hour_of_day(&self, at: f64) -> f64 {
        (at / 3600.0).rem_euclid(24.0)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> f64 {
        (**self).now()
    }

    fn hour_of_day(&self, at: f64) -> f64 {
        (**self).hour_of_day(at)
    }
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        // A clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Local wall-clock hour. Falls back to UTC for unrepresentable times.
    fn hour_of_day(&self, at: f64) -> f64 {
        let secs = at.floor();
        let nanos = ((at - secs) * 1e9) as u32;
        match Local.timestamp_opt(secs as i64, nanos).earliest() {
            Some(local) => {
                f64::from(local.hour())
                    + f64::from(local.minute()) / 60.0
                    + (f64::from(local.second()) + f64::from(local.nanosecond()) / 1e9) / 3600.0
            }
            None => (at / 3600.0).rem_euclid(24.0),
        }
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(now: f64) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: f64) {
        self.now.set(now);
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}
