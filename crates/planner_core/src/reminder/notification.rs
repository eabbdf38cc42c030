//! Fired notification records, in-app history and sink contract.

use crate::model::occurrence::OccurrenceId;
use crate::reminder::ledger::ThresholdTag;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// One raised reminder. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub occurrence_id: OccurrenceId,
    pub tag: ThresholdTag,
    /// Title of the occurrence this record is about.
    pub title: String,
    pub message: String,
    pub raised_at: NaiveDateTime,
}

impl NotificationRecord {
    pub fn new(
        occurrence_id: OccurrenceId,
        tag: ThresholdTag,
        title: impl Into<String>,
        message: impl Into<String>,
        raised_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurrence_id,
            tag,
            title: title.into(),
            message: message.into(),
            raised_at,
        }
    }
}

/// Sink-side delivery failure. Never propagated past the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Receiving side is gone.
    Closed,
    /// Presentation or audio backend refused the notification.
    Unavailable(String),
}

impl Display for SinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "notification receiver closed"),
            Self::Unavailable(message) => write!(f, "notification sink unavailable: {message}"),
        }
    }
}

impl Error for SinkError {}

/// Presentation collaborator receiving fired notifications.
///
/// Implementations must not block: delivery happens inside the scan.
pub trait NotificationSink: Send + Sync {
    /// Shows `record` as the current pop-up.
    fn deliver(&self, record: &NotificationRecord) -> Result<(), SinkError>;

    /// Plays the audible cue for a freshly delivered record.
    fn play_alert(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Sink forwarding records into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<NotificationRecord>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<NotificationRecord>) -> Self {
        Self { tx }
    }
}

impl NotificationSink for ChannelSink {
    fn deliver(&self, record: &NotificationRecord) -> Result<(), SinkError> {
        self.tx.send(record.clone()).map_err(|_| SinkError::Closed)
    }
}

/// Sink that discards everything; useful when only history is consumed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn deliver(&self, _record: &NotificationRecord) -> Result<(), SinkError> {
        Ok(())
    }
}

/// In-app notification history plus the current pop-up.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    history: VecDeque<NotificationRecord>,
    current: Option<NotificationRecord>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends `record` to history and makes it the current pop-up.
    pub fn push(&mut self, record: NotificationRecord) {
        self.current = Some(record.clone());
        self.history.push_front(record);
    }

    /// History, most recent first.
    pub fn history(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn current(&self) -> Option<&NotificationRecord> {
        self.current.as_ref()
    }

    /// Closes the pop-up; history is untouched.
    pub fn dismiss_current(&mut self) -> Option<NotificationRecord> {
        self.current.take()
    }
}

#[cfg(test)]
mod tests {
    use super::{ChannelSink, NotificationCenter, NotificationRecord, NotificationSink, SinkError};
    use crate::model::occurrence::OccurrenceId;
    use crate::model::task::TaskId;
    use crate::reminder::ledger::ThresholdTag;
    use chrono::NaiveDate;

    fn record(title: &str) -> NotificationRecord {
        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        NotificationRecord::new(
            OccurrenceId::new(TaskId::from(1), 0),
            ThresholdTag::Start,
            title,
            "Starting now",
            at,
        )
    }

    #[test]
    fn history_is_most_recent_first_and_popup_is_replaced() {
        let mut center = NotificationCenter::new();
        center.push(record("first"));
        center.push(record("second"));

        let titles: Vec<_> = center.history().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);
        assert_eq!(center.current().map(|r| r.title.as_str()), Some("second"));

        let dismissed = center.dismiss_current().unwrap();
        assert_eq!(dismissed.title, "second");
        assert!(center.current().is_none());
        assert_eq!(center.len(), 2);
    }

    #[test]
    fn channel_sink_reports_closed_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = ChannelSink::new(tx);
        drop(rx);
        assert_eq!(sink.deliver(&record("late")), Err(SinkError::Closed));
    }
}
