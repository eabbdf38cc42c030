use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use planner_core::{
    ChannelSink, NotificationRecord, NullSink, PlannerEngine, ReminderLoop, ReminderLoopError,
    ReminderSettings, RuntimeClock, Task, ThresholdTag,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 6)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

fn meeting_in(minutes: i64) -> Task {
    let mut task = Task::new(1, "Sync");
    let start = base() + TimeDelta::minutes(minutes);
    task.deadline = Some(start.format("%Y-%m-%dT%H:%M:%S").to_string());
    task
}

fn drain(rx: &mut UnboundedReceiver<NotificationRecord>) -> Vec<NotificationRecord> {
    let mut records = Vec::new();
    while let Ok(record) = rx.try_recv() {
        records.push(record);
    }
    records
}

fn start_loop(
    engine: &PlannerEngine,
    settings: ReminderSettings,
) -> (ReminderLoop, UnboundedReceiver<NotificationRecord>) {
    let (tx, rx) = unbounded_channel();
    let reminder_loop = ReminderLoop::start(
        engine.clone(),
        Arc::new(RuntimeClock::starting_at(base())),
        Arc::new(ChannelSink::new(tx)),
        settings,
    )
    .unwrap();
    (reminder_loop, rx)
}

#[tokio::test(start_paused = true)]
async fn warmup_scan_runs_before_first_interval() {
    let engine = PlannerEngine::default();
    engine.replace_tasks(vec![meeting_in(10)]);
    let (_reminder_loop, mut rx) = start_loop(&engine, ReminderSettings::default());

    tokio::time::sleep(Duration::from_millis(1_900)).await;
    assert!(drain(&mut rx).is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    let records = drain(&mut rx);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].tag, ThresholdTag::Pre);
    assert_eq!(records[0].raised_at, base() + TimeDelta::seconds(2));
    assert_eq!(records[0].message, "Starts at 08:10 (in 10 min)");
}

#[tokio::test(start_paused = true)]
async fn polling_for_thirty_minutes_fires_each_threshold_once() {
    let engine = PlannerEngine::default();
    engine.replace_tasks(vec![meeting_in(10)]);
    let (reminder_loop, mut rx) = start_loop(&engine, ReminderSettings::default());

    tokio::time::sleep(Duration::from_secs(30 * 60)).await;
    assert!(reminder_loop.is_running());

    let records = drain(&mut rx);
    let tags: Vec<_> = records.iter().map(|record| record.tag).collect();
    assert_eq!(tags, vec![ThresholdTag::Pre, ThresholdTag::Start]);
    assert_eq!(records[1].raised_at, base() + TimeDelta::minutes(10));
    assert_eq!(engine.history().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn stop_releases_timers_and_is_idempotent() {
    let engine = PlannerEngine::default();
    engine.replace_tasks(vec![meeting_in(10)]);
    let (mut reminder_loop, mut rx) = start_loop(&engine, ReminderSettings::default());

    tokio::time::sleep(Duration::from_secs(3)).await;
    reminder_loop.stop();
    reminder_loop.stop();
    assert!(!reminder_loop.is_running());

    tokio::time::sleep(Duration::from_secs(20 * 60)).await;
    let records = drain(&mut rx);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].tag, ThresholdTag::Pre);
    assert_eq!(engine.history().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_loop_stops_delivery() {
    let engine = PlannerEngine::default();
    engine.replace_tasks(vec![meeting_in(10)]);
    let (reminder_loop, mut rx) = start_loop(&engine, ReminderSettings::default());
    drop(reminder_loop);

    tokio::time::sleep(Duration::from_secs(20 * 60)).await;
    assert!(drain(&mut rx).is_empty());
    assert!(engine.history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn restart_runs_warmup_again_and_sees_rebuilt_index() {
    let engine = PlannerEngine::default();
    let (mut reminder_loop, mut rx) = start_loop(&engine, ReminderSettings::default());

    tokio::time::sleep(Duration::from_secs(5)).await;
    let slower = ReminderSettings {
        interval_ms: 60_000,
        ..ReminderSettings::default()
    };
    reminder_loop.restart(slower).unwrap();
    engine.replace_tasks(vec![meeting_in(15)]);

    tokio::time::sleep(Duration::from_secs(3)).await;
    let records = drain(&mut rx);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].raised_at, base() + TimeDelta::seconds(7));
    assert_eq!(reminder_loop.settings().interval_ms, 60_000);
}

#[tokio::test(start_paused = true)]
async fn restart_applies_new_reminder_window() {
    let engine = PlannerEngine::default();
    engine.replace_tasks(vec![meeting_in(30)]);
    let (mut reminder_loop, mut rx) = start_loop(&engine, ReminderSettings::default());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(drain(&mut rx).is_empty());

    let wider = ReminderSettings {
        pre_window_minutes: 60.0,
        ..ReminderSettings::default()
    };
    reminder_loop.restart(wider).unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;
    let records = drain(&mut rx);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].tag, ThresholdTag::Pre);
    assert_eq!(records[0].raised_at, base() + TimeDelta::seconds(7));
    assert_eq!(records[0].message, "Starts at 08:30 (in 30 min)");
}

#[tokio::test(start_paused = true)]
async fn zero_interval_is_rejected() {
    let settings = ReminderSettings {
        interval_ms: 0,
        ..ReminderSettings::default()
    };
    let result = ReminderLoop::start(
        PlannerEngine::default(),
        Arc::new(RuntimeClock::starting_at(base())),
        Arc::new(NullSink),
        settings,
    );
    assert!(matches!(result, Err(ReminderLoopError::ZeroInterval)));
}

#[test]
fn start_outside_runtime_is_rejected() {
    let result = ReminderLoop::start(
        PlannerEngine::default(),
        Arc::new(planner_core::SystemClock),
        Arc::new(NullSink),
        ReminderSettings::default(),
    );
    assert!(matches!(result, Err(ReminderLoopError::RuntimeUnavailable)));
}
