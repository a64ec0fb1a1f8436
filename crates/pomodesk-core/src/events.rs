use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::Phase;

/// Every timer state change and recorded pomodoro produces an Event.
/// The CLI prints them; notifiers react to `PhaseCompleted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: u64,
        task_id: Option<Uuid>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// The countdown reached zero and the engine moved to the next phase.
    PhaseCompleted {
        phase: Phase,
        next_phase: Phase,
        task_id: Option<Uuid>,
        message: String,
        completed_work_cycles: u32,
        at: DateTime<Utc>,
    },
    /// A completed work phase was credited to a task.
    PomodoroRecorded {
        task_id: Uuid,
        date: NaiveDate,
        pomodoros_completed: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        active: bool,
        remaining_secs: u64,
        total_secs: u64,
        completed_work_cycles: u32,
        task_id: Option<Uuid>,
        at: DateTime<Utc>,
    },
}
