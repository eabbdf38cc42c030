//! Wall-clock sources for reminder scans.

use chrono::{Local, NaiveDateTime, TimeDelta};
use std::sync::{Mutex, PoisonError};

/// Source of the current local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Host local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Manually driven clock for simulations and tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, value: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Wall-clock anchored at `base` that advances with the tokio timer.
///
/// Under a paused tokio runtime this clock moves only when the runtime's
/// time is advanced, which keeps reminder simulations deterministic.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeClock {
    base: NaiveDateTime,
    origin: tokio::time::Instant,
}

impl RuntimeClock {
    /// Anchors `base` at the runtime's current instant.
    pub fn starting_at(base: NaiveDateTime) -> Self {
        Self {
            base,
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for RuntimeClock {
    fn now(&self) -> NaiveDateTime {
        let Ok(elapsed) = TimeDelta::from_std(self.origin.elapsed()) else {
            return NaiveDateTime::MAX;
        };
        self.base
            .checked_add_signed(elapsed)
            .unwrap_or(NaiveDateTime::MAX)
    }
}
