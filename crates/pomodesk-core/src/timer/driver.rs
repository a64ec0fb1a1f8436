//! The one periodic tick.
//!
//! A [`TimerDriver`] owns a tokio task that calls [`Tick::tick`] once per
//! second on a shared target. The task ends on its own once the target
//! reports it is no longer active (a phase completed or it was paused), and
//! is aborted by [`TimerDriver::stop`] or on drop.
//!
//! The cancellation flag is flipped while holding the target's lock, and the
//! tick task checks it under the same lock, so no tick can land after
//! `stop()` returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::events::Event;

/// Interval between ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Something that advances by one second per tick.
pub trait Tick {
    /// Advance by one second, returning any events produced.
    fn tick(&mut self) -> Vec<Event>;

    /// Whether further ticks are wanted.
    fn is_active(&self) -> bool;
}

impl Tick for super::TimerEngine {
    fn tick(&mut self) -> Vec<Event> {
        super::TimerEngine::tick(self).into_iter().collect()
    }

    fn is_active(&self) -> bool {
        super::TimerEngine::is_active(self)
    }
}

/// Handle to the running tick task.
pub struct TimerDriver<T: Tick + Send + 'static> {
    target: Arc<Mutex<T>>,
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl<T: Tick + Send + 'static> TimerDriver<T> {
    /// Spawn the tick task on the current tokio runtime.
    ///
    /// Events produced by ticks are forwarded to `events`. The first tick
    /// lands one full period after spawning.
    pub fn spawn(target: Arc<Mutex<T>>, events: UnboundedSender<Event>) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let task_target = Arc::clone(&target);
        let task_cancelled = Arc::clone(&cancelled);

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + TICK_PERIOD;
            let mut interval = tokio::time::interval_at(start, TICK_PERIOD);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let (produced, still_active) = {
                    let mut guard = task_target.lock().unwrap_or_else(PoisonError::into_inner);
                    if task_cancelled.load(Ordering::SeqCst) {
                        return;
                    }
                    let produced = guard.tick();
                    (produced, guard.is_active())
                };
                for event in produced {
                    if events.send(event).is_err() {
                        tracing::debug!("event receiver dropped, stopping timer driver");
                        return;
                    }
                }
                if !still_active {
                    tracing::debug!("timer inactive, driver finished");
                    return;
                }
            }
        });

        Self {
            target,
            cancelled,
            handle: Some(handle),
        }
    }

    /// True once the tick task has ended, whether by completion or `stop()`.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel the tick task. No tick is applied after this returns.
    pub fn stop(&mut self) {
        {
            let _guard = self.target.lock().unwrap_or_else(PoisonError::into_inner);
            self.cancelled.store(true, Ordering::SeqCst);
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl<T: Tick + Send + 'static> Drop for TimerDriver<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Settings;
    use crate::timer::{Phase, TimerEngine};
    use tokio::sync::mpsc;

    fn one_minute() -> Settings {
        Settings {
            work_time: 1,
            break_time: 1,
            long_break_time: 1,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_phase_to_completion_then_finishes() {
        let mut engine = TimerEngine::new(one_minute());
        engine.start();
        let engine = Arc::new(Mutex::new(engine));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let driver = TimerDriver::spawn(Arc::clone(&engine), tx);
        let event = rx.recv().await.expect("completion event");
        match event {
            Event::PhaseCompleted { phase, next_phase, .. } => {
                assert_eq!(phase, Phase::Work);
                assert_eq!(next_phase, Phase::Break);
            }
            other => panic!("Expected PhaseCompleted, got {other:?}"),
        }

        // Task exits after completion and drops the sender.
        assert!(rx.recv().await.is_none());
        assert!(driver.is_finished());
        assert!(!engine.lock().unwrap().is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_after_stop() {
        let mut engine = TimerEngine::new(Settings::default());
        engine.start();
        let engine = Arc::new(Mutex::new(engine));
        let (tx, _rx) = mpsc::unbounded_channel();

        let mut driver = TimerDriver::spawn(Arc::clone(&engine), tx);
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        driver.stop();
        let remaining = engine.lock().unwrap().remaining_secs();
        assert_eq!(remaining, 25 * 60 - 3);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(engine.lock().unwrap().remaining_secs(), remaining);
        assert!(driver.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_after_drop() {
        let mut engine = TimerEngine::new(Settings::default());
        engine.start();
        let engine = Arc::new(Mutex::new(engine));
        let (tx, _rx) = mpsc::unbounded_channel();

        let driver = TimerDriver::spawn(Arc::clone(&engine), tx);
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        drop(driver);
        let remaining = engine.lock().unwrap().remaining_secs();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(engine.lock().unwrap().remaining_secs(), remaining);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_ends_driver() {
        let mut engine = TimerEngine::new(Settings::default());
        engine.start();
        let engine = Arc::new(Mutex::new(engine));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let driver = TimerDriver::spawn(Arc::clone(&engine), tx);
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        engine.lock().unwrap().pause();

        assert!(rx.recv().await.is_none());
        assert!(driver.is_finished());
        assert_eq!(engine.lock().unwrap().remaining_secs(), 25 * 60 - 1);
    }
}
