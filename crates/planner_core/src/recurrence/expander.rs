//! Task-to-occurrence expansion.

use crate::config::ExpansionPolicy;
use crate::model::occurrence::Occurrence;
use crate::model::task::{Recurrence, Task};
use chrono::{Days, Months, NaiveDateTime};
use log::{debug, warn};
use std::sync::Arc;

/// Expands one task into its ordered occurrences.
///
/// Convenience wrapper over [`expand_shared`] for callers holding a plain
/// task reference.
pub fn expand(task: &Task, policy: &ExpansionPolicy) -> Vec<Occurrence> {
    expand_shared(&Arc::new(task.clone()), policy)
}

/// Expands one shared task into its ordered occurrences.
///
/// # Contract
/// - No anchor (missing or unparseable deadline): empty result.
/// - No recurrence rule: exactly one occurrence, index `0`.
/// - With a rule, candidate `i` is `anchor + i` days, weeks or calendar
///   months; the first matching stop condition wins:
///   1. an explicit end bound exists and the candidate is after it;
///   2. no end bound and `i` exceeds the rule's default cap;
///   3. `i` reaches `policy.effective_ceiling()`, at most 260.
/// - Monthly steps clamp to the last day of shorter months.
pub fn expand_shared(task: &Arc<Task>, policy: &ExpansionPolicy) -> Vec<Occurrence> {
    match task.anchor() {
        Some(anchor) => expand_from_anchor(task, anchor, policy),
        None => Vec::new(),
    }
}

/// Expands a task whose deadline the caller already parsed into `anchor`.
pub(crate) fn expand_from_anchor(
    task: &Arc<Task>,
    anchor: NaiveDateTime,
    policy: &ExpansionPolicy,
) -> Vec<Occurrence> {
    if !task.recurrence.is_recurring() {
        return vec![Occurrence::from_task(task, 0, anchor)];
    }

    let end_bound = resolve_end_bound(task);
    let default_cap = default_cap(task.recurrence, policy);
    let ceiling = policy.effective_ceiling();
    let mut occurrences = Vec::new();

    for index in 0..ceiling {
        let Some(candidate) = advance(anchor, task.recurrence, index) else {
            break;
        };
        match end_bound {
            Some(end) if candidate > end => break,
            None if index > default_cap => break,
            _ => {}
        }
        occurrences.push(Occurrence::from_task(task, index, candidate));
    }

    if occurrences.len() >= ceiling as usize {
        debug!(
            "event=recurrence_ceiling_reached module=recurrence status=ok task_id={} rule={} ceiling={}",
            task.id, task.recurrence, ceiling
        );
    }

    occurrences
}

fn resolve_end_bound(task: &Task) -> Option<NaiveDateTime> {
    let raw = task.raw_recurrence_end()?;
    let bound = task.recurrence_end_bound();
    if bound.is_none() {
        warn!(
            "event=recurrence_end_ignored module=recurrence status=skip task_id={} reason=unparseable",
            task.id
        );
    } else {
        debug!(
            "event=recurrence_end_resolved module=recurrence status=ok task_id={} raw_len={}",
            task.id,
            raw.len()
        );
    }
    bound
}

fn default_cap(rule: Recurrence, policy: &ExpansionPolicy) -> u32 {
    match rule {
        Recurrence::Daily => policy.daily_cap,
        Recurrence::Weekly => policy.weekly_cap,
        Recurrence::Monthly => policy.monthly_cap,
        Recurrence::None => 0,
    }
}

fn advance(anchor: NaiveDateTime, rule: Recurrence, index: u32) -> Option<NaiveDateTime> {
    match rule {
        Recurrence::None => Some(anchor),
        Recurrence::Daily => anchor.checked_add_days(Days::new(u64::from(index))),
        Recurrence::Weekly => anchor.checked_add_days(Days::new(7 * u64::from(index))),
        Recurrence::Monthly => anchor.checked_add_months(Months::new(index)),
    }
}
