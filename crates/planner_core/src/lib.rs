//! Core engine for the planner calendar.
//! Expands recurring tasks into occurrences and raises reminders for them.

pub mod config;
pub mod engine;
pub mod index;
pub mod logging;
pub mod model;
pub mod recurrence;
pub mod reminder;
pub mod snapshot;

pub use config::{
    ConfigError, ConfigResult, ExpansionPolicy, LoggingSettings, PlannerConfig, ReminderSettings,
};
pub use engine::PlannerEngine;
pub use index::{build_occurrences, OccurrenceIndex, TaskFilter};
pub use logging::{
    default_log_level, init_logging, init_logging_with, logging_status, LoggingError,
};
pub use model::color::{color_hex, color_wire_name, OccurrenceColors, PaletteColor};
pub use model::occurrence::{Occurrence, OccurrenceId};
pub use model::task::{Recurrence, Task, TaskId};
pub use recurrence::{expand, expand_shared};
pub use reminder::clock::{Clock, ManualClock, RuntimeClock, SystemClock};
pub use reminder::ledger::{NotificationKey, NotificationLedger, ThresholdTag};
pub use reminder::notification::{
    ChannelSink, NotificationCenter, NotificationRecord, NotificationSink, NullSink, SinkError,
};
pub use reminder::runner::{ReminderLoop, ReminderLoopError};
pub use reminder::scanner::{minutes_to_start, ReminderScanner};
pub use snapshot::{decode_tasks, SnapshotError, SnapshotResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
