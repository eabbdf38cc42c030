//! At-most-once notification bookkeeping.

use crate::model::occurrence::OccurrenceId;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

/// Reminder stage for one occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdTag {
    /// "Coming up soon" warning.
    Pre,
    /// "Starting now" notice.
    Start,
}

impl ThresholdTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pre => "pre",
            Self::Start => "start",
        }
    }
}

impl Display for ThresholdTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NotificationKey {
    pub occurrence_id: OccurrenceId,
    pub tag: ThresholdTag,
}

impl NotificationKey {
    pub fn new(occurrence_id: OccurrenceId, tag: ThresholdTag) -> Self {
        Self { occurrence_id, tag }
    }
}

/// Monotonic set of keys that already fired.
///
/// Entries are never removed; keys of occurrences that disappear from the
/// index simply stay inert.
#[derive(Debug, Default)]
pub struct NotificationLedger {
    fired: HashSet<NotificationKey>,
}

impl NotificationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_fired(&self, key: &NotificationKey) -> bool {
        self.fired.contains(key)
    }

    /// Marks `key` as fired. Returns `false` when it was already marked.
    pub fn mark_fired(&mut self, key: NotificationKey) -> bool {
        self.fired.insert(key)
    }

    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}
