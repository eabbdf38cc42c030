//! Live occurrence index.
//!
//! # Responsibility
//! - Flatten the current task snapshot into calendar occurrences.
//! - Re-derive the whole set whenever tasks or filters change.
//!
//! # Invariants
//! - Every rebuild fully replaces the previous output; nothing is merged.
//! - Tasks without a usable deadline never appear in the output.
//! - Published snapshots are immutable; readers never see a partial rebuild.

use crate::config::ExpansionPolicy;
use crate::model::occurrence::Occurrence;
use crate::model::task::Task;
use crate::recurrence::expander::expand_from_anchor;
use chrono::NaiveDateTime;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Active task filters, mirroring the store's list query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub priority: Option<u8>,
    pub done: Option<bool>,
    /// Case-insensitive substring over title and description.
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        self.priority.is_none() && self.done.is_none() && self.normalized_search().is_none()
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(priority) = self.priority {
            if task.priority() != priority {
                return false;
            }
        }
        if let Some(done) = self.done {
            if task.done != done {
                return false;
            }
        }
        match self.normalized_search() {
            None => true,
            Some(needle) => {
                contains_normalized(task.title.as_str(), needle.as_str())
                    || task
                        .description
                        .as_deref()
                        .is_some_and(|description| contains_normalized(description, &needle))
            }
        }
    }

    fn normalized_search(&self) -> Option<String> {
        let raw = self.search.as_deref()?;
        let collapsed = normalize_text(raw);
        if collapsed.is_empty() {
            None
        } else {
            Some(collapsed)
        }
    }
}

fn normalize_text(value: &str) -> String {
    WHITESPACE_RE
        .replace_all(value.trim(), " ")
        .to_lowercase()
}

fn contains_normalized(haystack: &str, needle: &str) -> bool {
    normalize_text(haystack).contains(needle)
}

/// Builds the flattened occurrence list for a task snapshot.
///
/// Output order is task order, then sequence index within each task.
pub fn build_occurrences(
    tasks: &[Arc<Task>],
    filter: &TaskFilter,
    policy: &ExpansionPolicy,
) -> Vec<Occurrence> {
    let mut occurrences = Vec::new();
    for task in tasks {
        if task.deadline.is_none() || !filter.matches(task) {
            continue;
        }
        let Some(anchor) = task.anchor() else {
            warn!(
                "event=task_skipped module=index status=skip task_id={} reason=unparseable_deadline",
                task.id
            );
            continue;
        };
        occurrences.extend(expand_from_anchor(task, anchor, policy));
    }
    occurrences
}

/// Current task snapshot plus its derived occurrences.
#[derive(Debug)]
pub struct OccurrenceIndex {
    policy: ExpansionPolicy,
    filter: TaskFilter,
    tasks: Vec<Arc<Task>>,
    occurrences: Arc<Vec<Occurrence>>,
}

impl Default for OccurrenceIndex {
    fn default() -> Self {
        Self::new(ExpansionPolicy::default())
    }
}

impl OccurrenceIndex {
    pub fn new(policy: ExpansionPolicy) -> Self {
        Self {
            policy,
            filter: TaskFilter::default(),
            tasks: Vec::new(),
            occurrences: Arc::new(Vec::new()),
        }
    }

    /// Replaces the task snapshot and rebuilds all occurrences.
    pub fn rebuild(&mut self, tasks: Vec<Task>) -> &[Occurrence] {
        self.tasks = tasks.into_iter().map(Arc::new).collect();
        self.refresh()
    }

    /// Replaces active filters and rebuilds all occurrences.
    pub fn set_filter(&mut self, filter: TaskFilter) -> &[Occurrence] {
        self.filter = filter;
        self.refresh()
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    pub fn tasks(&self) -> &[Arc<Task>] {
        self.tasks.as_slice()
    }

    pub fn occurrences(&self) -> &[Occurrence] {
        self.occurrences.as_slice()
    }

    /// Cheap handle to the current published occurrence list.
    pub fn snapshot(&self) -> Arc<Vec<Occurrence>> {
        Arc::clone(&self.occurrences)
    }

    /// Occurrences starting in `[from, to)`, in index order.
    pub fn between(&self, from: NaiveDateTime, to: NaiveDateTime) -> Vec<&Occurrence> {
        self.occurrences
            .iter()
            .filter(|occurrence| occurrence.start >= from && occurrence.start < to)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    fn refresh(&mut self) -> &[Occurrence] {
        let rebuilt = build_occurrences(&self.tasks, &self.filter, &self.policy);
        info!(
            "event=occurrence_index_rebuilt module=index status=ok tasks={} occurrences={} filtered={}",
            self.tasks.len(),
            rebuilt.len(),
            !self.filter.is_empty()
        );
        self.occurrences = Arc::new(rebuilt);
        self.occurrences.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::{build_occurrences, OccurrenceIndex, TaskFilter};
    use crate::config::ExpansionPolicy;
    use crate::model::task::{Recurrence, Task};
    use std::sync::Arc;

    fn task(id: i64, title: &str, deadline: Option<&str>) -> Task {
        let mut task = Task::new(id, title);
        task.deadline = deadline.map(str::to_string);
        task
    }

    #[test]
    fn search_filter_is_case_and_whitespace_insensitive() {
        let mut dentist = task(1, "Visit   Dentist", Some("2024-01-01T09:00:00"));
        dentist.description = Some("bring card".to_string());
        let filter = TaskFilter {
            search: Some("  visit dentist ".to_string()),
            ..TaskFilter::default()
        };
        assert!(filter.matches(&dentist));

        let by_description = TaskFilter {
            search: Some("CARD".to_string()),
            ..TaskFilter::default()
        };
        assert!(by_description.matches(&dentist));
        assert!(TaskFilter {
            search: Some("   ".to_string()),
            ..TaskFilter::default()
        }
        .is_empty());
    }

    #[test]
    fn filter_change_rebuilds_output() {
        let mut index = OccurrenceIndex::default();
        let mut urgent = task(1, "urgent", Some("2024-01-01T09:00:00"));
        urgent.priority = Some(3);
        let relaxed = task(2, "relaxed", Some("2024-01-02T09:00:00"));
        index.rebuild(vec![urgent, relaxed]);
        assert_eq!(index.len(), 2);

        let filtered = index.set_filter(TaskFilter {
            priority: Some(3),
            ..TaskFilter::default()
        });
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "urgent");

        index.set_filter(TaskFilter::default());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn build_expands_parsed_anchor_and_skips_garbage_deadline() {
        let mut weekly = task(1, "weekly", Some("2024-01-01 09:00"));
        weekly.recurrence = Recurrence::Weekly;
        weekly.recurrence_end = Some("2024-01-15".to_string());
        let broken = task(2, "broken", Some("soon"));
        let undated = task(3, "undated", None);
        let tasks: Vec<Arc<Task>> = vec![Arc::new(weekly), Arc::new(broken), Arc::new(undated)];

        let occurrences =
            build_occurrences(&tasks, &TaskFilter::default(), &ExpansionPolicy::default());
        let indexes: Vec<_> = occurrences.iter().map(|o| o.id.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert!(occurrences.iter().all(|o| o.id.task_id.as_str() == "1"));
    }

    #[test]
    fn snapshot_is_not_mutated_by_later_rebuild() {
        let mut index = OccurrenceIndex::default();
        index.rebuild(vec![task(1, "a", Some("2024-01-01T09:00:00"))]);
        let before = index.snapshot();
        index.rebuild(Vec::new());
        assert_eq!(before.len(), 1);
        assert!(index.is_empty());
    }
}
