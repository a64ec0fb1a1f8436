//! JSON document store.
//!
//! The store owns the whole [`Document`] in memory. Every successful
//! mutation rewrites the complete document to a single file; there is no
//! incremental write, no log, and no transaction. The write goes through a
//! sibling temp file and a rename, so a crash mid-write leaves the previous
//! version in place.
//!
//! Loading never fails: a missing, unreadable, or unparseable file yields the
//! default document and a log line. A file from a newer release makes the
//! store read-only instead of letting the next mutation replace it.
//! Persisting never fails either: write errors are retried with backoff,
//! then logged and counted (see [`Store::persist_warning`]).

use chrono::{DateTime, Local, NaiveDate, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

use super::document::{
    Document, PomodoroEntry, Report, Settings, SettingsPatch, Subtask, Task, TaskDraft, TaskPatch,
};
use super::migrations;
use crate::error::{RecordKind, StoreError};

/// How hard to try when writing the document fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistPolicy {
    /// Extra attempts after the first failed write.
    pub retry_attempts: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub retry_base: Duration,
    /// Consecutive failed persists before [`Store::persist_warning`] speaks up.
    pub warn_after_failures: u32,
}

impl Default for PersistPolicy {
    fn default() -> Self {
        Self {
            retry_attempts: 2,
            retry_base: Duration::from_millis(50),
            warn_after_failures: 3,
        }
    }
}

/// The single owner of the document.
#[derive(Debug)]
pub struct Store {
    doc: Document,
    path: Option<PathBuf>,
    policy: PersistPolicy,
    consecutive_failures: u32,
    /// Set when the file on disk was written by a newer release.
    newer_version: Option<u32>,
}

impl Store {
    /// Load the document at `path`, falling back to defaults.
    ///
    /// A document written by a newer release also loads as defaults, but the
    /// store then refuses every mutation so the file is never overwritten.
    pub fn open(path: impl Into<PathBuf>, policy: PersistPolicy) -> Self {
        let path = path.into();
        let mut newer_version = None;
        let doc = match load_document(&path) {
            Ok(Some(doc)) => {
                tracing::debug!(path = %path.display(), tasks = doc.tasks.len(), "loaded document");
                doc
            }
            Ok(None) => {
                tracing::debug!(path = %path.display(), "no document yet, starting empty");
                Document::default()
            }
            Err(e) => {
                if let StoreError::UnsupportedVersion { found, .. } = &e {
                    newer_version = Some(*found);
                }
                tracing::warn!(path = %path.display(), error = %e, "failed to load document, using defaults");
                Document::default()
            }
        };
        Self {
            doc,
            path: Some(path),
            policy,
            consecutive_failures: 0,
            newer_version,
        }
    }

    /// Re-read the document from disk, picking up changes written by another
    /// process since this store was opened.
    ///
    /// A missing or unreadable file leaves the in-memory document as it is.
    pub fn reload(&mut self) {
        let Some(path) = self.path.clone() else {
            return;
        };
        match load_document(&path) {
            Ok(Some(doc)) => {
                tracing::debug!(path = %path.display(), "reloaded document");
                self.doc = doc;
                self.newer_version = None;
            }
            Ok(None) => {}
            Err(StoreError::UnsupportedVersion { found, supported }) => {
                tracing::warn!(path = %path.display(), found, supported, "document on disk is newer, keeping it untouched");
                self.newer_version = Some(found);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to reload document, keeping the loaded copy");
            }
        }
    }

    /// A store that never touches the filesystem (for tests and previews).
    pub fn in_memory() -> Self {
        Self::from_document(Document::default())
    }

    /// Wrap an existing document without a backing file.
    pub fn from_document(doc: Document) -> Self {
        Self {
            doc,
            path: None,
            policy: PersistPolicy::default(),
            consecutive_failures: 0,
            newer_version: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn tasks(&self) -> &[Task] {
        &self.doc.tasks
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.doc.task(id)
    }

    pub fn settings(&self) -> Settings {
        self.doc.settings
    }

    pub fn reports(&self) -> &[Report] {
        &self.doc.reports
    }

    /// Number of persists in a row that failed after all retries.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// True when the file on disk is newer than this release can write.
    pub fn is_read_only(&self) -> bool {
        self.newer_version.is_some()
    }

    /// A message for the user once saving has failed repeatedly.
    pub fn persist_warning(&self) -> Option<String> {
        let threshold = self.policy.warn_after_failures.max(1);
        if self.consecutive_failures < threshold {
            return None;
        }
        let location = self
            .path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        Some(format!(
            "could not save data to {location} ({} attempts in a row failed); recent changes may be lost",
            self.consecutive_failures
        ))
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn add_task(&mut self, draft: TaskDraft) -> Result<Uuid, StoreError> {
        self.ensure_writable()?;
        let id = Uuid::new_v4();
        let task = draft.into_task(id, Utc::now())?;
        tracing::info!(task_id = %id, title = %task.title, "task added");
        self.doc.tasks.push(task);
        self.persist();
        Ok(id)
    }

    pub fn update_task(&mut self, id: Uuid, patch: TaskPatch) -> Result<(), StoreError> {
        self.ensure_writable()?;
        let task = self.doc.task_mut(id)?;
        patch.apply(task)?;
        tracing::debug!(task_id = %id, "task updated");
        self.persist();
        Ok(())
    }

    /// Flip the completed flag, returning the new value.
    pub fn toggle_task(&mut self, id: Uuid) -> Result<bool, StoreError> {
        self.ensure_writable()?;
        let task = self.doc.task_mut(id)?;
        task.completed = !task.completed;
        let completed = task.completed;
        self.persist();
        Ok(completed)
    }

    /// Remove a task. Report entries that reference it stay as they are.
    pub fn delete_task(&mut self, id: Uuid) -> Result<Task, StoreError> {
        self.ensure_writable()?;
        let idx = self
            .doc
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| StoreError::task_not_found(id))?;
        let task = self.doc.tasks.remove(idx);
        tracing::info!(task_id = %id, "task deleted");
        self.persist();
        Ok(task)
    }

    /// Append a note, separated from earlier notes by a blank line.
    pub fn add_note(&mut self, id: Uuid, note: &str) -> Result<(), StoreError> {
        self.ensure_writable()?;
        let note = note.trim();
        if note.is_empty() {
            return Err(StoreError::invalid("note", "must not be empty"));
        }
        let task = self.doc.task_mut(id)?;
        if task.notes.is_empty() {
            task.notes = note.to_string();
        } else {
            task.notes = format!("{}\n\n{note}", task.notes);
        }
        self.persist();
        Ok(())
    }

    // ── Subtasks ─────────────────────────────────────────────────────

    pub fn add_subtask(&mut self, task_id: Uuid, title: &str) -> Result<Uuid, StoreError> {
        self.ensure_writable()?;
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::invalid("title", "must not be empty"));
        }
        let task = self.doc.task_mut(task_id)?;
        let subtask = Subtask::new(title);
        let id = subtask.id;
        task.subtasks.push(subtask);
        self.persist();
        Ok(id)
    }

    /// Flip a subtask's completed flag, returning the new value.
    pub fn toggle_subtask(&mut self, task_id: Uuid, subtask_id: Uuid) -> Result<bool, StoreError> {
        self.ensure_writable()?;
        let subtask = self
            .doc
            .task_mut(task_id)?
            .subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id)
            .ok_or(StoreError::NotFound {
                kind: RecordKind::Subtask,
                id: subtask_id,
            })?;
        subtask.completed = !subtask.completed;
        let completed = subtask.completed;
        self.persist();
        Ok(completed)
    }

    pub fn remove_subtask(&mut self, task_id: Uuid, subtask_id: Uuid) -> Result<Subtask, StoreError> {
        self.ensure_writable()?;
        let subtasks = &mut self.doc.task_mut(task_id)?.subtasks;
        let idx = subtasks
            .iter()
            .position(|s| s.id == subtask_id)
            .ok_or(StoreError::NotFound {
                kind: RecordKind::Subtask,
                id: subtask_id,
            })?;
        let removed = subtasks.remove(idx);
        self.persist();
        Ok(removed)
    }

    // ── Pomodoros ────────────────────────────────────────────────────

    /// Credit one completed pomodoro to a task, now.
    pub fn add_pomodoro(&mut self, task_id: Uuid) -> Result<PomodoroEntry, StoreError> {
        self.add_pomodoro_at(task_id, Utc::now())
    }

    /// Credit one completed pomodoro to a task at a given instant.
    ///
    /// The task counter and the day's report change together and are
    /// persisted as one document version. The report is keyed by the local
    /// calendar day of `at`.
    pub fn add_pomodoro_at(
        &mut self,
        task_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<PomodoroEntry, StoreError> {
        self.ensure_writable()?;
        let task = self.doc.task_mut(task_id)?;
        task.pomodoros_completed = task.pomodoros_completed.saturating_add(1);

        let date = local_day(at);
        let entry = PomodoroEntry {
            task_id,
            timestamp: at,
        };
        match self.doc.reports.iter_mut().find(|r| r.date == date) {
            Some(report) => report.pomodoros.push(entry.clone()),
            None => self.doc.reports.push(Report {
                date,
                pomodoros: vec![entry.clone()],
            }),
        }

        tracing::info!(task_id = %task_id, %date, "pomodoro recorded");
        self.persist();
        Ok(entry)
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn update_settings(&mut self, patch: SettingsPatch) -> Result<Settings, StoreError> {
        self.ensure_writable()?;
        let merged = patch.merged_into(self.doc.settings)?;
        self.doc.settings = merged;
        tracing::info!(?merged, "settings updated");
        self.persist();
        Ok(merged)
    }

    // ── Persistence ──────────────────────────────────────────────────

    fn ensure_writable(&self) -> Result<(), StoreError> {
        match self.newer_version {
            Some(found) => Err(StoreError::UnsupportedVersion {
                found,
                supported: super::document::CURRENT_VERSION,
            }),
            None => Ok(()),
        }
    }

    /// Write the whole document, retrying with exponential backoff.
    fn persist(&mut self) {
        let Some(path) = self.path.clone() else {
            return;
        };
        let body = match serde_json::to_string_pretty(&self.doc) {
            Ok(body) => body,
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                tracing::error!(error = %e, "failed to serialize document");
                return;
            }
        };

        let mut delay = self.policy.retry_base;
        for attempt in 0..=self.policy.retry_attempts {
            match write_atomically(&path, &body) {
                Ok(()) => {
                    if self.consecutive_failures > 0 {
                        tracing::info!(path = %path.display(), "document saved again after earlier failures");
                    }
                    self.consecutive_failures = 0;
                    return;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), attempt, error = %e, "failed to write document");
                    if attempt < self.policy.retry_attempts {
                        std::thread::sleep(delay);
                        delay = delay.saturating_mul(2);
                    }
                }
            }
        }

        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        tracing::error!(
            path = %path.display(),
            consecutive_failures = self.consecutive_failures,
            "giving up on saving document"
        );
    }
}

/// Local calendar day of an instant.
pub fn local_day(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Local).date_naive()
}

fn load_document(path: &Path) -> Result<Option<Document>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let raw: serde_json::Value = serde_json::from_str(&content)?;
    let migrated = migrations::migrate(raw)?;
    Ok(Some(serde_json::from_value(migrated)?))
}

fn write_atomically(path: &Path, body: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, body)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn midday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap()
    }

    fn no_retry() -> PersistPolicy {
        PersistPolicy {
            retry_attempts: 0,
            retry_base: Duration::ZERO,
            warn_after_failures: 2,
        }
    }

    #[test]
    fn add_task_defaults() {
        let mut store = Store::in_memory();
        let id = store.add_task(TaskDraft::new("Write tests")).unwrap();
        let task = store.tasks().iter().find(|t| t.id == id).unwrap();
        assert_eq!(task.pomodoros_completed, 0);
        assert!(!task.completed);
        assert!(task.subtasks.is_empty());
        assert_eq!(task.repeat, None);
    }

    #[test]
    fn add_task_rejects_blank_title() {
        let mut store = Store::in_memory();
        assert!(store.add_task(TaskDraft::new("  ")).is_err());
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let mut store = Store::in_memory();
        let ghost = Uuid::new_v4();
        assert!(store
            .update_task(ghost, TaskPatch::default())
            .unwrap_err()
            .is_not_found());
        assert!(store.delete_task(ghost).unwrap_err().is_not_found());
        assert!(store.add_pomodoro(ghost).unwrap_err().is_not_found());
        assert!(store.reports().is_empty());
    }

    #[test]
    fn two_pomodoros_same_day_share_one_report() {
        let mut store = Store::in_memory();
        let id = store.add_task(TaskDraft::new("Focus")).unwrap();
        let now = midday();
        store.add_pomodoro_at(id, now).unwrap();
        store.add_pomodoro_at(id, now + ChronoDuration::seconds(1)).unwrap();

        assert_eq!(store.reports().len(), 1);
        assert_eq!(store.reports()[0].pomodoros.len(), 2);
        assert_eq!(store.reports()[0].date, local_day(now));
        assert_eq!(store.task(id).unwrap().pomodoros_completed, 2);
    }

    #[test]
    fn pomodoros_on_different_days_get_separate_reports() {
        let mut store = Store::in_memory();
        let id = store.add_task(TaskDraft::new("Focus")).unwrap();
        let now = midday();
        store.add_pomodoro_at(id, now - ChronoDuration::days(1)).unwrap();
        store.add_pomodoro_at(id, now).unwrap();
        assert_eq!(store.reports().len(), 2);
    }

    #[test]
    fn notes_are_separated_by_blank_line() {
        let mut store = Store::in_memory();
        let id = store.add_task(TaskDraft::new("Notes")).unwrap();
        store.add_note(id, "first").unwrap();
        store.add_note(id, "  second  ").unwrap();
        assert_eq!(store.task(id).unwrap().notes, "first\n\nsecond");
    }

    #[test]
    fn subtask_lifecycle() {
        let mut store = Store::in_memory();
        let id = store.add_task(TaskDraft::new("Parent")).unwrap();
        let sub = store.add_subtask(id, "child").unwrap();
        assert!(store.toggle_subtask(id, sub).unwrap());
        assert!(store.task(id).unwrap().subtasks[0].completed);

        let removed = store.remove_subtask(id, sub).unwrap();
        assert_eq!(removed.title, "child");
        assert!(store.task(id).unwrap().subtasks.is_empty());
        assert!(store.toggle_subtask(id, sub).unwrap_err().is_not_found());
    }

    #[test]
    fn settings_merge_keeps_unset_fields() {
        let mut store = Store::in_memory();
        let merged = store
            .update_settings(SettingsPatch {
                work_time: Some(50),
                ..SettingsPatch::default()
            })
            .unwrap();
        assert_eq!(merged.work_time, 50);
        assert_eq!(merged.break_time, 5);
        assert_eq!(store.settings(), merged);
    }

    #[test]
    fn persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let mut store = Store::open(&path, no_retry());
        let id = store.add_task(TaskDraft::new("Persist me")).unwrap();
        store.add_pomodoro(id).unwrap();

        let reloaded = Store::open(&path, no_retry());
        assert_eq!(reloaded.document(), store.document());
        assert!(!dir.path().join("data.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{ not json").unwrap();

        let store = Store::open(&path, no_retry());
        assert_eq!(store.document(), &Document::default());
    }

    #[test]
    fn failed_writes_are_counted_not_returned() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes every write fail.
        let path = dir.path().join("data.json");
        fs::create_dir_all(path.join("blocker")).unwrap();

        let mut store = Store::open(&path, no_retry());
        assert!(store.add_task(TaskDraft::new("one")).is_ok());
        assert_eq!(store.consecutive_failures(), 1);
        assert!(store.persist_warning().is_none());

        store.add_task(TaskDraft::new("two")).unwrap();
        assert_eq!(store.consecutive_failures(), 2);
        assert!(store.persist_warning().is_some());
        assert_eq!(store.tasks().len(), 2);
    }
}
