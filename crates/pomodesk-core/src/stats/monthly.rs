use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{ReportView, TaskCount};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub month_start: NaiveDate,
    pub month_end: NaiveDate,
    pub total: usize,
    /// Number of distinct tasks with at least one pomodoro.
    pub active_tasks: usize,
    /// Descending by count; equal counts keep first-appearance order.
    pub tasks: Vec<TaskCount>,
}

/// First and last day of the month containing `date`.
pub(crate) fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = date.with_day(1).unwrap_or(date);
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(start);
    (start, end)
}

impl ReportView<'_> {
    pub fn monthly(&self, date: NaiveDate) -> MonthlyReport {
        let (start, end) = month_bounds(date);
        let entries = self.entries_between(start, end);

        let mut tasks = self.count_by_task(&entries);
        // sort_by is stable, so ties stay in first-appearance order.
        tasks.sort_by(|a, b| b.count.cmp(&a.count));

        MonthlyReport {
            month_start: start,
            month_end: end,
            total: entries.len(),
            active_tasks: tasks.len(),
            tasks,
        }
    }
}
