//! Threshold evaluation over one occurrence snapshot.
//!
//! # Invariants
//! - `now` is read once per scan by the caller and passed in.
//! - A key is marked in the ledger in the same step that builds its record,
//!   so one scan can never emit the same key twice.

use crate::config::ReminderSettings;
use crate::model::occurrence::Occurrence;
use crate::reminder::ledger::{NotificationKey, NotificationLedger, ThresholdTag};
use crate::reminder::notification::NotificationRecord;
use chrono::NaiveDateTime;

pub const STARTING_NOW_MESSAGE: &str = "Starting now";

/// Minutes from `now` until `start`; negative once started.
pub fn minutes_to_start(start: NaiveDateTime, now: NaiveDateTime) -> f64 {
    (start - now).num_milliseconds() as f64 / 60_000.0
}

/// Stateless evaluator for the `pre` and `start` thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReminderScanner {
    pre_window_minutes: f64,
    start_grace_minutes: f64,
}

impl Default for ReminderScanner {
    fn default() -> Self {
        Self::new(&ReminderSettings::default())
    }
}

impl ReminderScanner {
    pub fn new(settings: &ReminderSettings) -> Self {
        Self {
            pre_window_minutes: settings.pre_window_minutes,
            start_grace_minutes: settings.start_grace_minutes,
        }
    }

    /// Threshold whose window contains `minutes`, if any.
    ///
    /// Windows are disjoint: `pre` is `(0, pre_window]`, `start` is
    /// `(-start_grace, 0]`.
    pub fn threshold_for(&self, minutes: f64) -> Option<ThresholdTag> {
        if minutes > 0.0 && minutes <= self.pre_window_minutes {
            Some(ThresholdTag::Pre)
        } else if minutes <= 0.0 && minutes > -self.start_grace_minutes {
            Some(ThresholdTag::Start)
        } else {
            None
        }
    }

    /// Evaluates every occurrence against both thresholds.
    ///
    /// Returns the records fired by this scan in occurrence order. Each
    /// returned key has been marked in `ledger`.
    pub fn scan(
        &self,
        occurrences: &[Occurrence],
        now: NaiveDateTime,
        ledger: &mut NotificationLedger,
    ) -> Vec<NotificationRecord> {
        let mut fired = Vec::new();
        for occurrence in occurrences {
            let minutes = minutes_to_start(occurrence.start, now);
            let Some(tag) = self.threshold_for(minutes) else {
                continue;
            };
            let key = NotificationKey::new(occurrence.id.clone(), tag);
            if ledger.has_fired(&key) {
                continue;
            }
            ledger.mark_fired(key);
            fired.push(NotificationRecord::new(
                occurrence.id.clone(),
                tag,
                occurrence.title.clone(),
                reminder_message(tag, occurrence.start, minutes),
                now,
            ));
        }
        fired
    }
}

fn reminder_message(tag: ThresholdTag, start: NaiveDateTime, minutes: f64) -> String {
    match tag {
        ThresholdTag::Pre => format!(
            "Starts at {} (in {} min)",
            start.format("%H:%M"),
            minutes.ceil() as i64
        ),
        ThresholdTag::Start => STARTING_NOW_MESSAGE.to_string(),
    }
}
