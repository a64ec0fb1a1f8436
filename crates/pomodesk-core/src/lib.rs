//! # Pomodesk Core Library
//!
//! This library provides the core logic for the Pomodesk work timer: a
//! Pomodoro countdown, task bookkeeping, and time-tracking reports. The
//! `pomodesk` CLI is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a one-second-resolution state machine cycling through
//!   work, break and long-break phases; the caller ticks it
//! - **Timer Driver**: the single periodic tick task, cancellable at any time
//! - **Store**: one JSON document (tasks, settings, reports) rewritten whole
//!   on every mutation
//! - **Reports**: daily, weekly and monthly views computed from the store
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`Session`]: Timer wired to the store and the notifier
//! - [`Store`]: Document ownership and persistence
//! - [`ReportView`]: Read-side aggregation
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod notify;
pub mod session;
pub mod stats;
pub mod storage;
pub mod timer;

pub use error::{CoreError, ConfigError, RecordKind, StoreError};
pub use events::Event;
pub use notify::{LogNotifier, Notifier, SilentNotifier};
pub use session::Session;
pub use stats::{DailyReport, MonthlyReport, ReportView, TaskRef, WeeklyReport};
pub use storage::{
    Config, Document, PersistPolicy, Repeat, Settings, SettingsPatch, Store, Task, TaskDraft,
    TaskPatch,
};
pub use timer::{Phase, TimerDriver, TimerEngine};
