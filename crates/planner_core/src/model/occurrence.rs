//! Derived calendar occurrence.
//!
//! # Invariants
//! - Occurrences are rebuilt from tasks on every expansion pass; nothing keeps
//!   a reference to an occurrence across rebuilds.
//! - State that outlives a rebuild is keyed by `OccurrenceId`, a structural
//!   `(task id, sequence index)` pair.

use crate::model::color::OccurrenceColors;
use crate::model::task::{Recurrence, Task, TaskId};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Composite occurrence identity.
///
/// Non-recurring tasks always use index `0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OccurrenceId {
    pub task_id: TaskId,
    pub index: u32,
}

impl OccurrenceId {
    pub fn new(task_id: TaskId, index: u32) -> Self {
        Self { task_id, index }
    }
}

impl Display for OccurrenceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.task_id, self.index)
    }
}

/// One concrete, datable instance of a task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occurrence {
    pub id: OccurrenceId,
    pub title: String,
    pub start: NaiveDateTime,
    /// Tasks are point-in-time; `end == start`.
    pub end: NaiveDateTime,
    pub recurrence: Recurrence,
    pub done: bool,
    pub priority: u8,
    pub colors: OccurrenceColors,
    /// Owning task record, shared by all its occurrences.
    #[serde(skip)]
    pub task: Arc<Task>,
}

impl Occurrence {
    pub(crate) fn from_task(task: &Arc<Task>, index: u32, start: NaiveDateTime) -> Self {
        Self {
            id: OccurrenceId::new(task.id.clone(), index),
            title: task.title.clone(),
            start,
            end: start,
            recurrence: task.recurrence,
            done: task.done,
            priority: task.priority(),
            colors: OccurrenceColors::for_task(task.color.as_deref(), task.done),
            task: Arc::clone(task),
        }
    }
}
