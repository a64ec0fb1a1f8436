use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ReportView, TaskRef};

/// Pomodoros for one task on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPomodoros {
    pub task: TaskRef,
    pub count: usize,
    pub timestamps: Vec<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub total: usize,
    /// Grouped by task, in order of each task's first pomodoro that day.
    pub tasks: Vec<TaskPomodoros>,
}

impl ReportView<'_> {
    pub fn daily(&self, date: NaiveDate) -> DailyReport {
        let entries = self.entries_on(date);

        let mut grouped: IndexMap<Uuid, Vec<DateTime<Utc>>> = IndexMap::new();
        for entry in &entries {
            grouped.entry(entry.task_id).or_default().push(entry.timestamp);
        }

        DailyReport {
            date,
            total: entries.len(),
            tasks: grouped
                .into_iter()
                .map(|(id, timestamps)| TaskPomodoros {
                    task: self.task_ref(id),
                    count: timestamps.len(),
                    timestamps,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::DELETED_TASK_TITLE;
    use crate::storage::{local_day, Store, TaskDraft};
    use chrono::{Duration, TimeZone};

    fn midday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn groups_by_task_in_first_seen_order() {
        let mut store = Store::in_memory();
        let a = store.add_task(TaskDraft::new("A")).unwrap();
        let b = store.add_task(TaskDraft::new("B")).unwrap();
        let now = midday();
        store.add_pomodoro_at(b, now).unwrap();
        store.add_pomodoro_at(a, now + Duration::seconds(1)).unwrap();
        store.add_pomodoro_at(b, now + Duration::seconds(2)).unwrap();

        let report = ReportView::new(store.document()).daily(local_day(now));
        assert_eq!(report.total, 3);
        assert_eq!(report.tasks.len(), 2);
        assert_eq!(report.tasks[0].task.title, "B");
        assert_eq!(report.tasks[0].count, 2);
        assert_eq!(report.tasks[0].timestamps, vec![now, now + Duration::seconds(2)]);
        assert_eq!(report.tasks[1].task.title, "A");
    }

    #[test]
    fn empty_day() {
        let store = Store::in_memory();
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let report = ReportView::new(store.document()).daily(date);
        assert_eq!(report.total, 0);
        assert!(report.tasks.is_empty());
        assert_eq!(report.date, date);
    }

    #[test]
    fn deleted_task_gets_placeholder() {
        let mut store = Store::in_memory();
        let id = store.add_task(TaskDraft::new("Temporary")).unwrap();
        let now = midday();
        store.add_pomodoro_at(id, now).unwrap();
        store.delete_task(id).unwrap();

        let report = ReportView::new(store.document()).daily(local_day(now));
        assert_eq!(report.total, 1);
        assert_eq!(report.tasks[0].task.id, id);
        assert_eq!(report.tasks[0].task.title, DELETED_TASK_TITLE);
    }
}
