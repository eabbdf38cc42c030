use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use planner_core::{
    NotificationRecord, NotificationSink, NullSink, PlannerEngine, Recurrence, SinkError, Task,
    ThresholdTag,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 4, 8)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn meeting(id: i64, deadline: NaiveDateTime) -> Task {
    let mut task = Task::new(id, format!("Meeting {id}"));
    task.deadline = Some(deadline.format("%Y-%m-%dT%H:%M:%S").to_string());
    task
}

#[derive(Default)]
struct RecordingSink {
    delivered: Mutex<Vec<NotificationRecord>>,
    alerts: AtomicUsize,
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, record: &NotificationRecord) -> Result<(), SinkError> {
        self.delivered.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn play_alert(&self) -> Result<(), SinkError> {
        self.alerts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct BrokenSink;

impl NotificationSink for BrokenSink {
    fn deliver(&self, _record: &NotificationRecord) -> Result<(), SinkError> {
        Err(SinkError::Unavailable("display detached".to_string()))
    }

    fn play_alert(&self) -> Result<(), SinkError> {
        Err(SinkError::Unavailable("autoplay blocked".to_string()))
    }
}

fn simulate(
    engine: &PlannerEngine,
    sink: &dyn NotificationSink,
    from: NaiveDateTime,
    minutes: i64,
) -> Vec<NotificationRecord> {
    let mut fired = Vec::new();
    let mut now = from;
    let until = from + TimeDelta::minutes(minutes);
    while now <= until {
        fired.extend(engine.scan(now, sink));
        now += TimeDelta::seconds(10);
    }
    fired
}

#[test]
fn thirty_minutes_of_scans_fire_pre_and_start_exactly_once() {
    let engine = PlannerEngine::default();
    engine.replace_tasks(vec![meeting(1, at(10, 10))]);
    let sink = RecordingSink::default();

    let fired = simulate(&engine, &sink, at(10, 0), 30);

    let tags: Vec<_> = fired.iter().map(|record| record.tag).collect();
    assert_eq!(tags, vec![ThresholdTag::Pre, ThresholdTag::Start]);
    assert_eq!(fired[0].raised_at, at(10, 0));
    assert_eq!(fired[0].message, "Starts at 10:10 (in 10 min)");
    assert_eq!(fired[1].raised_at, at(10, 10));
    assert_eq!(sink.delivered.lock().unwrap().len(), 2);
    assert_eq!(sink.alerts.load(Ordering::SeqCst), 2);
}

#[test]
fn irregular_scan_timings_never_duplicate_keys() {
    let engine = PlannerEngine::default();
    engine.replace_tasks(vec![meeting(1, at(10, 10))]);

    let mut fired = Vec::new();
    for offset_secs in [0, 1, 1, 59, 300, 301, 599, 600, 600, 601, 899, 1200] {
        let now = at(10, 0) + TimeDelta::seconds(offset_secs);
        fired.extend(engine.scan(now, &NullSink));
    }
    assert_eq!(fired.len(), 2);
    assert_ne!(fired[0].tag, fired[1].tag);
}

#[test]
fn history_is_most_recent_first_and_popup_tracks_latest() {
    let engine = PlannerEngine::default();
    engine.replace_tasks(vec![meeting(1, at(10, 5)), meeting(2, at(10, 0))]);

    let fired = engine.scan(at(10, 0), &NullSink);
    assert_eq!(fired.len(), 2);

    let history = engine.history();
    assert_eq!(history[0].title, "Meeting 2");
    assert_eq!(history[0].tag, ThresholdTag::Start);
    assert_eq!(history[1].title, "Meeting 1");
    assert_eq!(
        engine.current_notification().map(|record| record.title),
        Some("Meeting 2".to_string())
    );

    engine.dismiss_current();
    assert!(engine.current_notification().is_none());
    assert_eq!(engine.history().len(), 2);
}

#[test]
fn sink_failure_still_marks_key_as_fired() {
    let engine = PlannerEngine::default();
    engine.replace_tasks(vec![meeting(1, at(10, 10))]);

    let first = engine.scan(at(10, 0), &BrokenSink);
    assert_eq!(first.len(), 1);
    let again = engine.scan(at(10, 1), &RecordingSink::default());
    assert!(again.is_empty());
    assert_eq!(engine.history().len(), 1);
}

#[test]
fn deleted_task_ledger_entries_stay_inert() {
    let engine = PlannerEngine::default();
    engine.replace_tasks(vec![meeting(1, at(10, 10)), meeting(2, at(10, 12))]);
    assert_eq!(engine.scan(at(10, 0), &NullSink).len(), 2);

    engine.replace_tasks(vec![meeting(2, at(10, 12))]);
    assert_eq!(engine.occurrences().len(), 1);
    let later = engine.scan(at(10, 12), &NullSink);
    assert_eq!(later.len(), 1);
    assert_eq!(later[0].occurrence_id.task_id.as_str(), "2");

    // Re-created with the same composite id: present again, already-fired
    // thresholds stay silent, the remaining one still fires.
    engine.replace_tasks(vec![meeting(1, at(10, 13)), meeting(2, at(10, 12))]);
    assert_eq!(engine.occurrences().len(), 2);
    let recreated = engine.scan(at(10, 13), &NullSink);
    assert_eq!(recreated.len(), 1);
    assert_eq!(recreated[0].occurrence_id.task_id.as_str(), "1");
    assert_eq!(recreated[0].tag, ThresholdTag::Start);
}

#[test]
fn each_recurring_occurrence_has_its_own_keys() {
    let engine = PlannerEngine::default();
    let mut daily = meeting(7, at(10, 0));
    daily.recurrence = Recurrence::Daily;
    engine.replace_tasks(vec![daily]);

    assert_eq!(engine.scan(at(9, 50), &NullSink).len(), 1);
    let next_day = at(9, 50) + TimeDelta::days(1);
    let fired = engine.scan(next_day, &NullSink);
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].occurrence_id.index, 1);
}

#[test]
fn completed_and_distant_occurrences_follow_time_only() {
    let engine = PlannerEngine::default();
    let mut done = meeting(1, at(10, 10));
    done.done = true;
    engine.replace_tasks(vec![done, meeting(2, at(12, 0))]);

    let fired = engine.scan(at(10, 0), &NullSink);
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].occurrence_id.task_id.as_str(), "1");
}

/// Sink that reads engine state while presenting a record.
struct HistoryPeekingSink {
    engine: PlannerEngine,
    seen_history: Mutex<Vec<usize>>,
}

impl NotificationSink for HistoryPeekingSink {
    fn deliver(&self, _record: &NotificationRecord) -> Result<(), SinkError> {
        let len = self.engine.history().len();
        self.engine.set_filter(Default::default());
        self.seen_history.lock().unwrap().push(len);
        Ok(())
    }
}

#[test]
fn sink_can_use_engine_during_delivery() {
    let engine = PlannerEngine::default();
    engine.replace_tasks(vec![meeting(1, at(10, 10)), meeting(2, at(10, 0))]);
    let sink = HistoryPeekingSink {
        engine: engine.clone(),
        seen_history: Mutex::new(Vec::new()),
    };

    let fired = engine.scan(at(10, 0), &sink);

    assert_eq!(fired.len(), 2);
    assert_eq!(*sink.seen_history.lock().unwrap(), vec![2, 2]);
    assert_eq!(engine.occurrences().len(), 2);
}
