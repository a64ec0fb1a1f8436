//! Timer engine implementation.
//!
//! The timer engine is a one-second-resolution state machine. It does not use
//! internal threads - the caller (normally [`super::TimerDriver`]) is
//! responsible for calling `tick()` once per second while the timer is active.
//!
//! ## Phase Transitions
//!
//! ```text
//! Work -> Break -> Work -> Break -> Work -> Break -> Work -> LongBreak -> Work ...
//! ```
//!
//! The engine deactivates after every transition; the next phase only runs
//! once `start()` is called again.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(settings);
//! engine.start();
//! // Once per second:
//! engine.tick(); // Returns Some(Event::PhaseCompleted) when the phase ends
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::phase::Phase;
use crate::events::Event;
use crate::storage::Settings;

/// Core timer engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    settings: Settings,
    phase: Phase,
    active: bool,
    /// Remaining time in seconds for the current phase.
    remaining_secs: u64,
    /// Length of the current phase as it was when the phase began.
    total_secs: u64,
    completed_work_cycles: u32,
    /// Task the next completed work phase is attributed to.
    #[serde(default)]
    task_id: Option<Uuid>,
}

impl TimerEngine {
    /// Create an idle engine positioned at the start of a work phase.
    pub fn new(settings: Settings) -> Self {
        let total_secs = Phase::Work.duration_secs(&settings);
        Self {
            settings,
            phase: Phase::Work,
            active: false,
            remaining_secs: total_secs,
            total_secs,
            completed_work_cycles: 0,
            task_id: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn completed_work_cycles(&self) -> u32 {
        self.completed_work_cycles
    }

    pub fn task_id(&self) -> Option<Uuid> {
        self.task_id
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_secs as f64 / self.total_secs as f64)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            active: self.active,
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs,
            completed_work_cycles: self.completed_work_cycles,
            task_id: self.task_id,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.active {
            return None;
        }
        if self.remaining_secs == 0 {
            self.restart_phase();
        }
        self.active = true;
        Some(Event::TimerStarted {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            task_id: self.task_id,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.active {
            return None;
        }
        self.active = false;
        Some(Event::TimerPaused {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Rewind the current phase to its configured length and deactivate.
    pub fn reset(&mut self) -> Event {
        self.active = false;
        self.restart_phase();
        Event::TimerReset {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        }
    }

    pub fn select_task(&mut self, task_id: Option<Uuid>) {
        self.task_id = task_id;
    }

    /// Adopt new phase durations.
    ///
    /// While inactive the current phase is rewound to its new length at once.
    /// While active the running countdown is left alone; the new durations
    /// apply from the next reset or phase transition.
    pub fn apply_settings(&mut self, settings: Settings) {
        self.settings = settings;
        if !self.active {
            self.restart_phase();
        }
    }

    /// Advance by one second. Returns `Some(Event::PhaseCompleted)` when the
    /// phase runs out.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.active {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return Some(self.complete_phase());
        }
        None
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn restart_phase(&mut self) {
        self.total_secs = self.phase.duration_secs(&self.settings);
        self.remaining_secs = self.total_secs;
    }

    fn complete_phase(&mut self) -> Event {
        let finished = self.phase;
        if finished == Phase::Work {
            self.completed_work_cycles = self.completed_work_cycles.saturating_add(1);
        }
        let next = finished.next(self.completed_work_cycles);
        self.phase = next;
        self.active = false;
        self.restart_phase();
        Event::PhaseCompleted {
            phase: finished,
            next_phase: next,
            task_id: self.task_id,
            message: finished.completion_message().to_string(),
            completed_work_cycles: self.completed_work_cycles,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_settings() -> Settings {
        Settings {
            work_time: 1,
            break_time: 1,
            long_break_time: 2,
        }
    }

    /// Drive the engine through the whole current phase.
    fn run_phase(engine: &mut TimerEngine) -> Event {
        engine.start();
        loop {
            if let Some(event) = engine.tick() {
                return event;
            }
        }
    }

    #[test]
    fn start_pause_keeps_remaining() {
        let mut engine = TimerEngine::new(Settings::default());
        assert!(!engine.is_active());

        assert!(engine.start().is_some());
        assert!(engine.is_active());
        assert!(engine.start().is_none());

        engine.tick();
        engine.tick();
        assert!(engine.pause().is_some());
        assert!(!engine.is_active());
        assert_eq!(engine.remaining_secs(), 25 * 60 - 2);

        // Paused ticks do nothing.
        assert!(engine.tick().is_none());
        assert_eq!(engine.remaining_secs(), 25 * 60 - 2);
        assert!(engine.pause().is_none());
    }

    #[test]
    fn reset_rewinds_current_phase() {
        let mut engine = TimerEngine::new(Settings::default());
        engine.start();
        engine.tick();
        engine.reset();
        assert!(!engine.is_active());
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.remaining_secs(), 25 * 60);
    }

    #[test]
    fn work_completion_moves_to_break_and_deactivates() {
        let mut engine = TimerEngine::new(short_settings());
        let task = Uuid::new_v4();
        engine.select_task(Some(task));

        match run_phase(&mut engine) {
            Event::PhaseCompleted {
                phase,
                next_phase,
                task_id,
                message,
                completed_work_cycles,
                ..
            } => {
                assert_eq!(phase, Phase::Work);
                assert_eq!(next_phase, Phase::Break);
                assert_eq!(task_id, Some(task));
                assert_eq!(message, "Time to take a break!");
                assert_eq!(completed_work_cycles, 1);
            }
            other => panic!("Expected PhaseCompleted, got {other:?}"),
        }
        assert!(!engine.is_active());
        assert_eq!(engine.phase(), Phase::Break);
        assert_eq!(engine.remaining_secs(), 60);
    }

    #[test]
    fn fourth_work_phase_goes_to_long_break() {
        let mut engine = TimerEngine::new(short_settings());
        let mut after_work = Vec::new();
        for _ in 0..4 {
            if let Event::PhaseCompleted { next_phase, .. } = run_phase(&mut engine) {
                after_work.push(next_phase);
            }
            // Finish the break as well.
            run_phase(&mut engine);
        }
        assert_eq!(
            after_work,
            vec![Phase::Break, Phase::Break, Phase::Break, Phase::LongBreak]
        );
        assert_eq!(engine.phase(), Phase::Work);
    }

    #[test]
    fn break_completion_messages() {
        let mut engine = TimerEngine::new(short_settings());
        run_phase(&mut engine);
        match run_phase(&mut engine) {
            Event::PhaseCompleted { phase, message, .. } => {
                assert_eq!(phase, Phase::Break);
                assert_eq!(message, "Break's over! Back to work.");
            }
            other => panic!("Expected PhaseCompleted, got {other:?}"),
        }
    }

    #[test]
    fn settings_apply_immediately_when_idle() {
        let mut engine = TimerEngine::new(Settings::default());
        engine.apply_settings(Settings {
            work_time: 50,
            ..Settings::default()
        });
        assert_eq!(engine.remaining_secs(), 50 * 60);
        assert_eq!(engine.total_secs(), 50 * 60);
    }

    #[test]
    fn settings_deferred_while_active() {
        let mut engine = TimerEngine::new(Settings::default());
        engine.start();
        engine.tick();
        engine.apply_settings(Settings {
            work_time: 50,
            ..Settings::default()
        });
        assert_eq!(engine.remaining_secs(), 25 * 60 - 1);
        assert_eq!(engine.total_secs(), 25 * 60);

        engine.reset();
        assert_eq!(engine.remaining_secs(), 50 * 60);
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let engine = TimerEngine::new(Settings::default());
        match engine.snapshot() {
            Event::StateSnapshot {
                phase,
                active,
                remaining_secs,
                ..
            } => {
                assert_eq!(phase, Phase::Work);
                assert!(!active);
                assert_eq!(remaining_secs, 25 * 60);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }

    #[test]
    fn engine_survives_serde() {
        let mut engine = TimerEngine::new(short_settings());
        engine.start();
        engine.tick();
        engine.pause();
        let json = serde_json::to_string(&engine).unwrap();
        let back: TimerEngine = serde_json::from_str(&json).unwrap();
        assert_eq!(back.remaining_secs(), engine.remaining_secs());
        assert_eq!(back.phase(), engine.phase());
    }
}
