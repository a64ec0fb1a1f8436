//! Timer engine wired to the store and the notification channel.
//!
//! A [`Session`] is the unit the [`TimerDriver`](crate::timer::TimerDriver)
//! ticks. When a work phase completes with a task selected, the pomodoro is
//! credited through [`Store::add_pomodoro`] before the tick returns, so any
//! report read afterwards already includes it. The document is re-read from
//! disk first, so edits made by another process during the phase survive.

use uuid::Uuid;

use crate::error::StoreError;
use crate::events::Event;
use crate::notify::{Notifier, NOTIFICATION_TITLE};
use crate::storage::{Settings, SettingsPatch, Store};
use crate::timer::{Phase, Tick, TimerEngine};

pub struct Session {
    engine: TimerEngine,
    store: Store,
    notifier: Box<dyn Notifier>,
}

impl Session {
    /// Fresh timer at the start of a work phase.
    pub fn new(store: Store, notifier: Box<dyn Notifier>) -> Self {
        let engine = TimerEngine::new(store.settings());
        Self {
            engine,
            store,
            notifier,
        }
    }

    /// Continue with a previously saved engine.
    ///
    /// Settings changed since the engine was saved are applied under the
    /// usual rules, and a selected task that no longer exists is dropped.
    pub fn resume(mut engine: TimerEngine, store: Store, notifier: Box<dyn Notifier>) -> Self {
        if *engine.settings() != store.settings() {
            engine.apply_settings(store.settings());
        }
        if let Some(id) = engine.task_id() {
            if store.task(id).is_none() {
                tracing::warn!(task_id = %id, "selected task no longer exists");
                engine.select_task(None);
            }
        }
        Self {
            engine,
            store,
            notifier,
        }
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Direct store access for task and subtask edits. Settings go through
    /// [`Session::update_settings`] so the timer sees them.
    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn into_parts(self) -> (TimerEngine, Store) {
        (self.engine, self.store)
    }

    pub fn start(&mut self) -> Option<Event> {
        self.engine.start()
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.engine.pause()
    }

    pub fn reset(&mut self) -> Event {
        self.engine.reset()
    }

    pub fn snapshot(&self) -> Event {
        self.engine.snapshot()
    }

    /// Choose the task future work phases are credited to.
    ///
    /// # Errors
    /// `NotFound` for an unknown id, `Validation` for a completed task.
    pub fn select_task(&mut self, task_id: Option<Uuid>) -> Result<(), StoreError> {
        if let Some(id) = task_id {
            let task = self.store.task(id).ok_or_else(|| StoreError::task_not_found(id))?;
            if task.completed {
                return Err(StoreError::invalid("task", "cannot select a completed task"));
            }
        }
        self.engine.select_task(task_id);
        Ok(())
    }

    pub fn update_settings(&mut self, patch: SettingsPatch) -> Result<Settings, StoreError> {
        let settings = self.store.update_settings(patch)?;
        self.engine.apply_settings(settings);
        Ok(settings)
    }

    fn on_phase_completed(&mut self, phase: Phase, task_id: Option<Uuid>, message: &str) -> Option<Event> {
        self.notifier.notify(NOTIFICATION_TITLE, message);

        // A phase can run for a long time; other writers may have changed the
        // document meanwhile.
        self.store.reload();
        if *self.engine.settings() != self.store.settings() {
            self.engine.apply_settings(self.store.settings());
        }

        let task_id = task_id.filter(|_| phase == Phase::Work)?;
        match self.store.add_pomodoro(task_id) {
            Ok(entry) => {
                let pomodoros_completed = self
                    .store
                    .task(task_id)
                    .map(|t| t.pomodoros_completed)
                    .unwrap_or_default();
                Some(Event::PomodoroRecorded {
                    task_id,
                    date: crate::storage::local_day(entry.timestamp),
                    pomodoros_completed,
                    at: entry.timestamp,
                })
            }
            Err(e) => {
                tracing::warn!(task_id = %task_id, error = %e, "pomodoro not recorded");
                self.engine.select_task(None);
                None
            }
        }
    }
}

impl Tick for Session {
    fn tick(&mut self) -> Vec<Event> {
        let Some(event) = self.engine.tick() else {
            return Vec::new();
        };
        let completed = match &event {
            Event::PhaseCompleted {
                phase,
                task_id,
                message,
                ..
            } => Some((*phase, *task_id, message.clone())),
            _ => None,
        };
        let mut events = vec![event];
        if let Some((phase, task_id, message)) = completed {
            events.extend(self.on_phase_completed(phase, task_id, &message));
        }
        events
    }

    fn is_active(&self) -> bool {
        self.engine.is_active()
    }
}
