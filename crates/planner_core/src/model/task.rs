//! Task record as delivered by the external task store.
//!
//! # Responsibility
//! - Mirror the CRUD API task shape so snapshots decode without loss.
//! - Resolve schedule-relevant fields (anchor, rule, end bound) into typed values.
//!
//! # Invariants
//! - Core never mutates or persists task records; they are read-only input.
//! - Opaque fields (`notes`, `custom_fields`, `attachments`) are carried
//!   through unchanged.
//! - Unparseable schedule fields resolve to `None`, never to an error.

use crate::model::wall_clock::{parse_end_bound, parse_local_datetime};
use chrono::NaiveDateTime;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};

/// Priority used when the store omits one (`1 = low`).
pub const DEFAULT_PRIORITY: u8 = 1;

/// Key inside `custom_fields` where older clients store the recurrence end.
const CUSTOM_FIELD_RECURRENCE_END: &str = "recurrence_end";

/// Stable task identifier issued by the external store.
///
/// The store emits integer ids; string ids are accepted too so that ids are
/// never reinterpreted or reformatted by core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

macro_rules! task_id_from_integer {
    ($($int:ty),*) => {
        $(
            impl From<$int> for TaskId {
                fn from(value: $int) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

task_id_from_integer!(i32, i64, u32, u64);

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawTaskId {
            Number(i64),
            Text(String),
        }

        match RawTaskId::deserialize(deserializer)? {
            RawTaskId::Number(value) => Ok(Self::from(value)),
            RawTaskId::Text(value) if value.trim().is_empty() => {
                Err(D::Error::custom("task id cannot be empty"))
            }
            RawTaskId::Text(value) => Ok(Self(value)),
        }
    }
}

/// Recurrence cadence applied to a task anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    /// Single occurrence at the anchor deadline.
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    /// Parses the store's wire value.
    ///
    /// Empty and unknown values map to `Recurrence::None`: the store schema
    /// only guarantees the closed `daily|weekly|monthly` set.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value.map(|raw| raw.trim().to_ascii_lowercase()).as_deref() {
            Some("daily") => Self::Daily,
            Some("weekly") => Self::Weekly,
            Some("monthly") => Self::Monthly,
            _ => Self::None,
        }
    }

    pub fn is_recurring(self) -> bool {
        self != Self::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl Display for Recurrence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn deserialize_recurrence<'de, D>(deserializer: D) -> Result<Recurrence, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(Recurrence::from_wire(raw.as_deref()))
}

/// Task snapshot record.
///
/// Field names match the CRUD API wire schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Anchor deadline as sent by the store (ISO-8601 local wall-clock).
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default, deserialize_with = "deserialize_recurrence")]
    pub recurrence: Recurrence,
    /// Explicit recurrence end. Falls back to `custom_fields.recurrence_end`.
    #[serde(default)]
    pub recurrence_end: Option<String>,
    #[serde(default)]
    pub done: bool,
    /// `1 = low`, `2 = medium`, `3 = high`.
    #[serde(default)]
    pub priority: Option<u8>,
    /// Canonical color name (`blau|rot|grün|gelb`) or a legacy hex value.
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub custom_fields: Option<serde_json::Value>,
    #[serde(default)]
    pub attachments: Option<Vec<String>>,
}

impl Task {
    /// Creates an open, non-recurring task without deadline.
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            deadline: None,
            recurrence: Recurrence::None,
            recurrence_end: None,
            done: false,
            priority: None,
            color: None,
            project_id: None,
            notes: None,
            custom_fields: None,
            attachments: None,
        }
    }

    /// Effective priority, defaulting to low.
    pub fn priority(&self) -> u8 {
        self.priority.unwrap_or(DEFAULT_PRIORITY)
    }

    /// Parsed anchor deadline.
    ///
    /// Returns `None` when the task has no deadline or it cannot be parsed.
    pub fn anchor(&self) -> Option<NaiveDateTime> {
        self.deadline.as_deref().and_then(parse_local_datetime)
    }

    /// Raw recurrence end, top-level field first, then `custom_fields`.
    pub fn raw_recurrence_end(&self) -> Option<&str> {
        if let Some(value) = self.recurrence_end.as_deref() {
            if !value.trim().is_empty() {
                return Some(value);
            }
        }
        self.custom_fields
            .as_ref()
            .and_then(|fields| fields.get(CUSTOM_FIELD_RECURRENCE_END))
            .and_then(serde_json::Value::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Inclusive upper bound for generated occurrences.
    ///
    /// Date-only values cover the whole day. Unparseable values resolve to
    /// `None` so expansion falls back to default look-ahead caps.
    pub fn recurrence_end_bound(&self) -> Option<NaiveDateTime> {
        self.raw_recurrence_end().and_then(parse_end_bound)
    }
}
