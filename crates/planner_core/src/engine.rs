//! Planner engine: occurrence index, reminder ledger and notification center.
//!
//! # Responsibility
//! - Own the process-lifetime reminder state behind one lock.
//! - Serialize index rebuilds and reminder scans so a scan never observes a
//!   partially rebuilt index and its checks and marks are never interleaved.
//! - Hand fired records to the sink after the state lock is released, so a
//!   slow sink never stalls rebuilds.
//!
//! # Invariants
//! - Ledger and history start empty and only grow.
//! - A fired key is marked even when the sink fails to present it.
//! - After `cancel_scans` returns for a flag, no scan gated on that flag
//!   delivers anything.
//! - The state lock and the delivery lock are never held together.

use crate::config::PlannerConfig;
use crate::index::{OccurrenceIndex, TaskFilter};
use crate::model::occurrence::Occurrence;
use crate::model::task::Task;
use crate::reminder::clock::Clock;
use crate::reminder::ledger::NotificationLedger;
use crate::reminder::notification::{NotificationCenter, NotificationRecord, NotificationSink};
use crate::reminder::scanner::ReminderScanner;
use crate::snapshot::{decode_tasks, SnapshotResult};
use chrono::NaiveDateTime;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct EngineState {
    index: OccurrenceIndex,
    ledger: NotificationLedger,
    center: NotificationCenter,
    scanner: ReminderScanner,
}

/// Shared handle to planner state. Clones share the same state.
#[derive(Clone)]
pub struct PlannerEngine {
    state: Arc<Mutex<EngineState>>,
    delivery: Arc<Mutex<()>>,
}

impl Default for PlannerEngine {
    fn default() -> Self {
        Self::new(&PlannerConfig::default())
    }
}

impl PlannerEngine {
    /// Creates an engine with empty index, ledger and history.
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(EngineState {
                index: OccurrenceIndex::new(config.expansion),
                ledger: NotificationLedger::new(),
                center: NotificationCenter::new(),
                scanner: ReminderScanner::new(&config.reminders),
            })),
            delivery: Arc::new(Mutex::new(())),
        }
    }

    /// Replaces the task snapshot. Returns the rebuilt occurrence count.
    pub fn replace_tasks(&self, tasks: Vec<Task>) -> usize {
        self.lock().index.rebuild(tasks).len()
    }

    /// Decodes a store payload and replaces the task snapshot with it.
    pub fn load_snapshot_json(&self, raw: &str) -> SnapshotResult<usize> {
        let tasks = decode_tasks(raw)?;
        Ok(self.replace_tasks(tasks))
    }

    /// Replaces active filters. Returns the rebuilt occurrence count.
    pub fn set_filter(&self, filter: TaskFilter) -> usize {
        self.lock().index.set_filter(filter).len()
    }

    /// Current published occurrence list.
    pub fn occurrences(&self) -> Arc<Vec<Occurrence>> {
        self.lock().index.snapshot()
    }

    /// Occurrences starting in `[from, to)`.
    pub fn occurrences_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> Vec<Occurrence> {
        self.lock()
            .index
            .between(from, to)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Notification history, most recent first.
    pub fn history(&self) -> Vec<NotificationRecord> {
        self.lock().center.history().cloned().collect()
    }

    pub fn current_notification(&self) -> Option<NotificationRecord> {
        self.lock().center.current().cloned()
    }

    /// Closes the current pop-up without touching history.
    pub fn dismiss_current(&self) -> Option<NotificationRecord> {
        self.lock().center.dismiss_current()
    }

    /// Runs one scan cycle at `now` with the configured thresholds and hands
    /// fired records to `sink`.
    pub fn scan(&self, now: NaiveDateTime, sink: &dyn NotificationSink) -> Vec<NotificationRecord> {
        let fired = {
            let mut state = self.lock();
            let scanner = state.scanner;
            record_scan(&mut state, &scanner, now)
        };
        let _delivering = self.lock_delivery();
        deliver_all(sink, &fired);
        fired
    }

    /// Runs one scan cycle with `scanner` unless `cancelled` is set.
    ///
    /// The flag is checked and the clock is read under the state lock, and
    /// checked again under the delivery lock. Returns `None` when the scan
    /// was suppressed or cancelled before delivery.
    pub(crate) fn scan_unless_cancelled(
        &self,
        clock: &dyn Clock,
        scanner: &ReminderScanner,
        sink: &dyn NotificationSink,
        cancelled: &AtomicBool,
    ) -> Option<Vec<NotificationRecord>> {
        let fired = {
            let mut state = self.lock();
            if cancelled.load(Ordering::SeqCst) {
                return None;
            }
            let now = clock.now();
            record_scan(&mut state, scanner, now)
        };

        let _delivering = self.lock_delivery();
        if cancelled.load(Ordering::SeqCst) {
            return None;
        }
        deliver_all(sink, &fired);
        Some(fired)
    }

    /// Sets `cancelled` and waits for any in-flight delivery to finish.
    pub(crate) fn cancel_scans(&self, cancelled: &AtomicBool) {
        {
            let _state = self.lock();
            cancelled.store(true, Ordering::SeqCst);
        }
        let _delivering = self.lock_delivery();
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_delivery(&self) -> MutexGuard<'_, ()> {
        self.delivery.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks and records fired reminders. Delivery happens after the caller
/// releases the state lock.
fn record_scan(
    state: &mut EngineState,
    scanner: &ReminderScanner,
    now: NaiveDateTime,
) -> Vec<NotificationRecord> {
    let occurrences = state.index.snapshot();
    let fired = scanner.scan(occurrences.as_slice(), now, &mut state.ledger);

    for record in &fired {
        info!(
            "event=reminder_fired module=reminder status=ok occurrence={} threshold={}",
            record.occurrence_id, record.tag
        );
        state.center.push(record.clone());
    }
    fired
}

fn deliver_all(sink: &dyn NotificationSink, fired: &[NotificationRecord]) {
    for record in fired {
        deliver(sink, record);
    }
}

fn deliver(sink: &dyn NotificationSink, record: &NotificationRecord) {
    if let Err(err) = sink.deliver(record) {
        warn!(
            "event=sink_delivery_failed module=reminder status=error stage=deliver occurrence={} error={}",
            record.occurrence_id, err
        );
    }
    if let Err(err) = sink.play_alert() {
        warn!(
            "event=sink_delivery_failed module=reminder status=error stage=alert occurrence={} error={}",
            record.occurrence_id, err
        );
    }
}
