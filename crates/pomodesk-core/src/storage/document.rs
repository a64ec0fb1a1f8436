//! The persisted document and its records.
//!
//! Field names serialize in camelCase so the file stays readable by the
//! desktop front-end that shares it:
//!
//! ```json
//! { "version": 1, "tasks": [...], "settings": {...}, "reports": [...] }
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::StoreError;

/// Schema version written by this release.
pub const CURRENT_VERSION: u32 = 1;

fn default_work_time() -> u32 {
    25
}
fn default_break_time() -> u32 {
    5
}
fn default_long_break_time() -> u32 {
    15
}

/// How often a task comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    #[serde(rename = "none")]
    Never,
    Daily,
    Weekly,
    Monthly,
}

impl FromStr for Repeat {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "never" => Ok(Repeat::Never),
            "daily" => Ok(Repeat::Daily),
            "weekly" => Ok(Repeat::Weekly),
            "monthly" => Ok(Repeat::Monthly),
            other => Err(StoreError::invalid(
                "repeat",
                format!("expected none, daily, weekly or monthly, got '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl Subtask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reminder: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub repeat: Option<Repeat>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub pomodoros_completed: u32,
}

/// Phase durations in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_work_time")]
    pub work_time: u32,
    #[serde(default = "default_break_time")]
    pub break_time: u32,
    #[serde(default = "default_long_break_time")]
    pub long_break_time: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_time: default_work_time(),
            break_time: default_break_time(),
            long_break_time: default_long_break_time(),
        }
    }
}

/// One completed work phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroEntry {
    pub task_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// All pomodoros completed on one local calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub date: NaiveDate,
    #[serde(default)]
    pub pomodoros: Vec<PomodoroEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub reports: Vec<Report>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            tasks: Vec::new(),
            settings: Settings::default(),
            reports: Vec::new(),
        }
    }
}

impl Document {
    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub(crate) fn task_mut(&mut self, id: Uuid) -> Result<&mut Task, StoreError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::task_not_found(id))
    }

    pub fn report_for(&self, date: NaiveDate) -> Option<&Report> {
        self.reports.iter().find(|r| r.date == date)
    }
}

// ── Inputs ───────────────────────────────────────────────────────────

/// Fields for a new task. Anything left unset gets its default.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub reminder: Option<DateTime<Utc>>,
    pub subtasks: Vec<Subtask>,
    pub repeat: Option<Repeat>,
    pub notes: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub(crate) fn into_task(self, id: Uuid, created: DateTime<Utc>) -> Result<Task, StoreError> {
        let title = validate_title(&self.title)?;
        Ok(Task {
            id,
            title,
            description: self.description.unwrap_or_default(),
            completed: false,
            created,
            due_date: self.due_date,
            reminder: self.reminder,
            subtasks: self.subtasks,
            repeat: self.repeat,
            notes: self.notes.unwrap_or_default(),
            pomodoros_completed: 0,
        })
    }
}

/// Shallow field-level update for a task. `None` leaves a field untouched;
/// for nullable fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub reminder: Option<Option<DateTime<Utc>>>,
    pub subtasks: Option<Vec<Subtask>>,
    pub repeat: Option<Option<Repeat>>,
    pub notes: Option<String>,
    pub pomodoros_completed: Option<u32>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.due_date.is_none()
            && self.reminder.is_none()
            && self.subtasks.is_none()
            && self.repeat.is_none()
            && self.notes.is_none()
            && self.pomodoros_completed.is_none()
    }

    /// Validate first, then merge, so a rejected patch leaves the task as it was.
    pub(crate) fn apply(self, task: &mut Task) -> Result<(), StoreError> {
        let title = self.title.as_deref().map(validate_title).transpose()?;
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(reminder) = self.reminder {
            task.reminder = reminder;
        }
        if let Some(subtasks) = self.subtasks {
            task.subtasks = subtasks;
        }
        if let Some(repeat) = self.repeat {
            task.repeat = repeat;
        }
        if let Some(notes) = self.notes {
            task.notes = notes;
        }
        if let Some(count) = self.pomodoros_completed {
            task.pomodoros_completed = count;
        }
        Ok(())
    }
}

/// Replace-merge for settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub work_time: Option<u32>,
    pub break_time: Option<u32>,
    pub long_break_time: Option<u32>,
}

impl SettingsPatch {
    pub(crate) fn merged_into(self, current: Settings) -> Result<Settings, StoreError> {
        let merged = Settings {
            work_time: self.work_time.unwrap_or(current.work_time),
            break_time: self.break_time.unwrap_or(current.break_time),
            long_break_time: self.long_break_time.unwrap_or(current.long_break_time),
        };
        for (field, value) in [
            ("workTime", merged.work_time),
            ("breakTime", merged.break_time),
            ("longBreakTime", merged.long_break_time),
        ] {
            if value == 0 {
                return Err(StoreError::invalid(field, "must be at least 1 minute"));
            }
        }
        Ok(merged)
    }
}

fn validate_title(title: &str) -> Result<String, StoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(StoreError::invalid("title", "must not be empty"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_defaults_fill_missing_fields() {
        let s: Settings = serde_json::from_str(r#"{"workTime": 40}"#).unwrap();
        assert_eq!(s.work_time, 40);
        assert_eq!(s.break_time, 5);
        assert_eq!(s.long_break_time, 15);
    }

    #[test]
    fn task_uses_camel_case_fields() {
        let task = TaskDraft::new("Write report")
            .into_task(Uuid::nil(), Utc::now())
            .unwrap();
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["pomodorosCompleted"], 0);
        assert!(json["dueDate"].is_null());
        assert_eq!(json["completed"], false);
    }

    #[test]
    fn repeat_none_serializes_as_none() {
        assert_eq!(serde_json::to_string(&Repeat::Never).unwrap(), "\"none\"");
        assert_eq!("Weekly".parse::<Repeat>().unwrap(), Repeat::Weekly);
        assert!("fortnightly".parse::<Repeat>().is_err());
    }

    #[test]
    fn patch_rejects_blank_title_without_changes() {
        let mut task = TaskDraft::new("Keep me").into_task(Uuid::nil(), Utc::now()).unwrap();
        let patch = TaskPatch {
            title: Some("   ".into()),
            completed: Some(true),
            ..TaskPatch::default()
        };
        assert!(patch.apply(&mut task).is_err());
        assert_eq!(task.title, "Keep me");
        assert!(!task.completed);
    }

    #[test]
    fn patch_can_clear_nullable_fields() {
        let mut draft = TaskDraft::new("Due soon");
        draft.due_date = Some(Utc::now());
        let mut task = draft.into_task(Uuid::nil(), Utc::now()).unwrap();
        TaskPatch {
            due_date: Some(None),
            ..TaskPatch::default()
        }
        .apply(&mut task)
        .unwrap();
        assert!(task.due_date.is_none());
    }

    #[test]
    fn settings_patch_rejects_zero() {
        let patch = SettingsPatch {
            break_time: Some(0),
            ..SettingsPatch::default()
        };
        assert!(patch.merged_into(Settings::default()).is_err());
    }
}
