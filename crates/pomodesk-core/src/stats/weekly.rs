use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{ReportView, TaskCount};
use crate::storage::PomodoroEntry;

/// One day of a weekly report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub count: usize,
    pub pomodoros: Vec<PomodoroEntry>,
    pub tasks: Vec<TaskCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyReport {
    /// Monday of the week.
    pub week_start: NaiveDate,
    /// Sunday of the week.
    pub week_end: NaiveDate,
    pub total: usize,
    /// Always seven buckets, Monday first.
    pub days: Vec<DayBucket>,
}

/// Monday of the week containing `date`.
pub(crate) fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

impl ReportView<'_> {
    pub fn weekly(&self, date: NaiveDate) -> WeeklyReport {
        let start = week_start(date);
        let days: Vec<DayBucket> = start
            .iter_days()
            .take(7)
            .map(|day| {
                let pomodoros = self.entries_on(day);
                DayBucket {
                    date: day,
                    count: pomodoros.len(),
                    tasks: self.count_by_task(&pomodoros),
                    pomodoros,
                }
            })
            .collect();

        WeeklyReport {
            week_start: start,
            week_end: days.last().map_or(start, |d| d.date),
            total: days.iter().map(|d| d.count).sum(),
            days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Document, PomodoroEntry, Report, Store, TaskDraft};
    use chrono::{Utc, Weekday};
    use uuid::Uuid;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_week_has_seven_empty_buckets() {
        let store = Store::in_memory();
        let report = ReportView::new(store.document()).weekly(ymd(2024, 3, 7));
        assert_eq!(report.days.len(), 7);
        assert!(report.days.iter().all(|d| d.count == 0 && d.pomodoros.is_empty()));
        assert_eq!(report.total, 0);
    }

    #[test]
    fn week_starts_on_monday() {
        // 2024-03-10 is a Sunday.
        let report = ReportView::new(&Document::default()).weekly(ymd(2024, 3, 10));
        assert_eq!(report.week_start, ymd(2024, 3, 4));
        assert_eq!(report.week_start.weekday(), Weekday::Mon);
        assert_eq!(report.week_end, ymd(2024, 3, 10));

        let monday = ReportView::new(&Document::default()).weekly(ymd(2024, 3, 4));
        assert_eq!(monday.week_start, ymd(2024, 3, 4));
    }

    #[test]
    fn buckets_count_per_day_and_task() {
        let mut store = Store::in_memory();
        let a = store.add_task(TaskDraft::new("A")).unwrap();
        let ghost = Uuid::new_v4();
        let at = Utc::now();
        let mut doc = store.document().clone();
        doc.reports = vec![
            Report {
                date: ymd(2024, 3, 5),
                pomodoros: vec![
                    PomodoroEntry { task_id: a, timestamp: at },
                    PomodoroEntry { task_id: ghost, timestamp: at },
                    PomodoroEntry { task_id: a, timestamp: at },
                ],
            },
            // Outside the week.
            Report {
                date: ymd(2024, 3, 11),
                pomodoros: vec![PomodoroEntry { task_id: a, timestamp: at }],
            },
        ];
        store = Store::from_document(doc);

        let report = ReportView::new(store.document()).weekly(ymd(2024, 3, 6));
        assert_eq!(report.total, 3);
        let tuesday = &report.days[1];
        assert_eq!(tuesday.date, ymd(2024, 3, 5));
        assert_eq!(tuesday.count, 3);
        assert_eq!(tuesday.tasks.len(), 2);
        assert_eq!(tuesday.tasks[0].task.title, "A");
        assert_eq!(tuesday.tasks[0].count, 2);
        assert_eq!(tuesday.tasks[1].task.title, "Deleted Task");
        assert_eq!(report.days[6].count, 0);
    }

    #[test]
    fn week_can_span_months() {
        let report = ReportView::new(&Document::default()).weekly(ymd(2024, 3, 1));
        assert_eq!(report.week_start, ymd(2024, 2, 26));
        assert_eq!(report.week_end, ymd(2024, 3, 3));
    }
}
