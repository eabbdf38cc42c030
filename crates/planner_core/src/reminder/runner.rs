//! Reminder polling loop.
//!
//! Spawns one tokio task that owns both timers: a one-shot warm-up and the
//! fixed-cadence interval. Every tick runs a full scan through the engine.
//!
//! # Invariants
//! - Both timers live in the same task and are released together by `stop`.
//! - `stop` is idempotent and also runs on drop.
//! - Once `stop` returns, no further notification reaches the sink.
//! - Thresholds come from the loop's own settings, so `restart` applies both
//!   the cadence and the reminder windows.

use crate::config::ReminderSettings;
use crate::engine::PlannerEngine;
use crate::reminder::clock::Clock;
use crate::reminder::notification::NotificationSink;
use crate::reminder::scanner::ReminderScanner;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderLoopError {
    /// Called outside a tokio runtime.
    RuntimeUnavailable,
    /// Polling interval must be non-zero.
    ZeroInterval,
}

impl Display for ReminderLoopError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RuntimeUnavailable => write!(f, "reminder loop requires a tokio runtime"),
            Self::ZeroInterval => write!(f, "reminder interval must be greater than zero"),
        }
    }
}

impl Error for ReminderLoopError {}

/// Running reminder loop bound to one engine, clock, sink and cadence.
pub struct ReminderLoop {
    engine: PlannerEngine,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
    settings: ReminderSettings,
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ReminderLoop {
    /// Starts polling on the current tokio runtime.
    ///
    /// # Errors
    /// - `RuntimeUnavailable` when no tokio runtime is active.
    /// - `ZeroInterval` when `settings.interval_ms == 0`.
    pub fn start(
        engine: PlannerEngine,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
        settings: ReminderSettings,
    ) -> Result<Self, ReminderLoopError> {
        let mut reminder_loop = Self {
            engine,
            clock,
            sink,
            settings,
            cancelled: Arc::new(AtomicBool::new(false)),
            handle: None,
        };
        reminder_loop.spawn()?;
        Ok(reminder_loop)
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn settings(&self) -> &ReminderSettings {
        &self.settings
    }

    /// Tears down the current timers and starts again with `settings`.
    ///
    /// The warm-up scan runs again, so the first check after a restart does
    /// not wait a full cycle.
    pub fn restart(&mut self, settings: ReminderSettings) -> Result<(), ReminderLoopError> {
        self.stop();
        self.settings = settings;
        self.cancelled = Arc::new(AtomicBool::new(false));
        self.spawn()
    }

    /// Releases both timers. Calling it again is a no-op.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.engine.cancel_scans(&self.cancelled);
        handle.abort();
        info!("event=reminder_loop_stopped module=reminder status=ok");
    }

    fn spawn(&mut self) -> Result<(), ReminderLoopError> {
        if self.settings.interval_ms == 0 {
            return Err(ReminderLoopError::ZeroInterval);
        }
        let runtime = Handle::try_current().map_err(|_| ReminderLoopError::RuntimeUnavailable)?;

        let engine = self.engine.clone();
        let clock = Arc::clone(&self.clock);
        let sink = Arc::clone(&self.sink);
        let cancelled = Arc::clone(&self.cancelled);
        let scanner = ReminderScanner::new(&self.settings);
        let warmup = self.settings.warmup();
        let interval = self.settings.interval();

        self.handle = Some(runtime.spawn(async move {
            poll(engine, clock, scanner, sink, cancelled, warmup, interval).await;
        }));
        info!(
            "event=reminder_loop_started module=reminder status=ok warmup_ms={} interval_ms={} pre_window_min={} start_grace_min={}",
            self.settings.warmup_ms,
            self.settings.interval_ms,
            self.settings.pre_window_minutes,
            self.settings.start_grace_minutes
        );
        Ok(())
    }
}

impl Drop for ReminderLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll(
    engine: PlannerEngine,
    clock: Arc<dyn Clock>,
    scanner: ReminderScanner,
    sink: Arc<dyn NotificationSink>,
    cancelled: Arc<AtomicBool>,
    warmup: Duration,
    interval: Duration,
) {
    let started = Instant::now();
    let warmup_timer = sleep_until(started + warmup);
    tokio::pin!(warmup_timer);
    let mut warmup_pending = true;
    let mut ticker = interval_at(started + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut warmup_timer, if warmup_pending => {
                warmup_pending = false;
            }
            _ = ticker.tick() => {}
        }

        match engine.scan_unless_cancelled(clock.as_ref(), &scanner, sink.as_ref(), &cancelled) {
            Some(fired) => debug!(
                "event=reminder_scan module=reminder status=ok fired={}",
                fired.len()
            ),
            None => break,
        }
    }
}
