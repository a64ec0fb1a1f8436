//! Reporting views over the stored pomodoro log.
//!
//! Everything here is read-only and computed on demand from a
//! [`Document`], so a report taken right after a store mutation always
//! reflects it. Task ids that no longer resolve (the task was deleted) show
//! up as a [`TaskRef`] titled "Deleted Task".

mod daily;
mod monthly;
mod weekly;

pub use daily::{DailyReport, TaskPomodoros};
pub use monthly::MonthlyReport;
pub use weekly::{DayBucket, WeeklyReport};

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::{Document, PomodoroEntry, Report, Task};

/// Title substituted for tasks that no longer exist.
pub const DELETED_TASK_TITLE: &str = "Deleted Task";

/// Task identity as shown in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: Uuid,
    pub title: String,
}

/// Pomodoro count for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCount {
    pub task: TaskRef,
    pub count: usize,
}

/// Entry point for all report views.
#[derive(Debug, Clone, Copy)]
pub struct ReportView<'a> {
    tasks: &'a [Task],
    reports: &'a [Report],
}

impl<'a> ReportView<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self {
            tasks: &doc.tasks,
            reports: &doc.reports,
        }
    }

    pub fn from_parts(tasks: &'a [Task], reports: &'a [Report]) -> Self {
        Self { tasks, reports }
    }

    /// Resolve a task id, substituting a placeholder for deleted tasks.
    pub fn task_ref(&self, id: Uuid) -> TaskRef {
        match self.tasks.iter().find(|t| t.id == id) {
            Some(task) => TaskRef {
                id,
                title: task.title.clone(),
            },
            None => TaskRef {
                id,
                title: DELETED_TASK_TITLE.to_string(),
            },
        }
    }

    /// All entries logged on `date`, in log order.
    pub(crate) fn entries_on(&self, date: NaiveDate) -> Vec<PomodoroEntry> {
        self.reports
            .iter()
            .filter(|r| r.date == date)
            .flat_map(|r| r.pomodoros.iter().cloned())
            .collect()
    }

    /// All entries logged within `[start, end]`, in log order.
    pub(crate) fn entries_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<PomodoroEntry> {
        self.reports
            .iter()
            .filter(|r| r.date >= start && r.date <= end)
            .flat_map(|r| r.pomodoros.iter().cloned())
            .collect()
    }

    /// Per-task counts in order of first appearance.
    pub(crate) fn count_by_task(&self, entries: &[PomodoroEntry]) -> Vec<TaskCount> {
        let mut counts: IndexMap<Uuid, usize> = IndexMap::new();
        for entry in entries {
            *counts.entry(entry.task_id).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(id, count)| TaskCount {
                task: self.task_ref(id),
                count,
            })
            .collect()
    }
}
