//! Task snapshot decoding.
//!
//! # Responsibility
//! - Decode the task store's full-list JSON payload.
//!
//! # Invariants
//! - A record that fails to decode is skipped; it never fails the snapshot.
//! - Only a payload that is not a JSON array is rejected as a whole.

use crate::model::task::Task;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SnapshotResult<T> = Result<T, SnapshotError>;

#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
    /// Payload decoded, but its top-level value is not a list.
    NotAList(&'static str),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "task snapshot is not valid JSON: {err}"),
            Self::NotAList(kind) => write!(f, "task snapshot must be a JSON array, got {kind}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::NotAList(_) => None,
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Decodes a task list, skipping records that do not match the task schema.
pub fn decode_tasks(raw: &str) -> SnapshotResult<Vec<Task>> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let records = match value {
        serde_json::Value::Array(records) => records,
        other => return Err(SnapshotError::NotAList(json_kind(&other))),
    };

    let total = records.len();
    let mut tasks = Vec::with_capacity(total);
    for (position, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Task>(record) {
            Ok(task) => tasks.push(task),
            Err(err) => warn!(
                "event=snapshot_record_skipped module=snapshot status=skip position={} line={} column={}",
                position,
                err.line(),
                err.column()
            ),
        }
    }

    debug!(
        "event=snapshot_decoded module=snapshot status=ok records={} decoded={}",
        total,
        tasks.len()
    );
    Ok(tasks)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
