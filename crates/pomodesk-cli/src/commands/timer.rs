//! Timer commands for CLI.
//!
//! The engine is saved between invocations next to the data document, so
//! `status`, `select` and `reset` see whatever the last `start` left behind.
//! Only `start` runs the clock, in the foreground, until the phase ends or
//! Ctrl-C pauses it.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Subcommand;
use pomodesk_core::{
    Config, Event, LogNotifier, Notifier, Session, Store, TimerDriver, TimerEngine,
};
use tokio::sync::mpsc;

use super::{format_clock, open_store, parse_uuid, report_persist_health, CmdResult};

const ENGINE_FILE_NAME: &str = "timer.json";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the current phase in the foreground (Ctrl-C pauses)
    Start {
        /// Task to credit the work phase to
        #[arg(long)]
        task: Option<String>,
    },
    /// Print current timer state as JSON
    Status,
    /// Stop and rewind the current phase
    Reset,
    /// Choose the task future work phases are credited to
    Select {
        /// Task ID
        #[arg(required_unless_present = "clear")]
        task_id: Option<String>,
        /// Clear the selection
        #[arg(long, conflicts_with = "task_id")]
        clear: bool,
    },
}

/// Terminal notifications on stderr.
struct TerminalNotifier {
    bell: bool,
}

impl Notifier for TerminalNotifier {
    fn notify(&self, title: &str, body: &str) {
        let bell = if self.bell { "\x07" } else { "" };
        eprintln!("\r{bell}{title}: {body}");
    }
}

fn notifier(config: &Config) -> Box<dyn Notifier> {
    if config.notifications.enabled {
        Box::new(TerminalNotifier {
            bell: config.notifications.bell,
        })
    } else {
        Box::new(LogNotifier)
    }
}

fn engine_path(config: &Config) -> Result<PathBuf, Box<dyn std::error::Error>> {
    Ok(config.data_file()?.with_file_name(ENGINE_FILE_NAME))
}

fn load_engine(path: &Path, store: &Store) -> TimerEngine {
    match std::fs::read_to_string(path) {
        Ok(json) => match serde_json::from_str::<TimerEngine>(&json) {
            Ok(engine) => return engine,
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "discarding saved timer"),
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "cannot read saved timer"),
    }
    TimerEngine::new(store.settings())
}

fn save_engine(path: &Path, engine: &TimerEngine) -> CmdResult {
    let json = serde_json::to_string_pretty(engine)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn print_event(event: &Event) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}

/// Print from inside the running loop, where a failed print must not skip
/// saving the timer.
fn emit(event: &Event) {
    if let Err(e) = print_event(event) {
        tracing::warn!(error = %e, "failed to print timer event");
    }
}

/// Tick the session until the phase completes or Ctrl-C arrives.
fn run_foreground(session: Arc<Mutex<Session>>) -> CmdResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut driver = TimerDriver::spawn(Arc::clone(&session), tx);

        let mut display = tokio::time::interval(Duration::from_millis(500));
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(event) => {
                        eprintln!();
                        emit(&event);
                    }
                    // The driver exits once the session is no longer active.
                    None => break,
                },
                _ = &mut ctrl_c => {
                    driver.stop();
                    let paused = session
                        .lock()
                        .map_err(|_| "timer state lock poisoned")?
                        .pause();
                    eprintln!();
                    if let Some(event) = paused {
                        emit(&event);
                    }
                    break;
                }
                _ = display.tick() => {
                    let guard = session.lock().map_err(|_| "timer state lock poisoned")?;
                    let engine = guard.engine();
                    eprint!("\r{}  {}", engine.phase().label(), format_clock(engine.remaining_secs()));
                    let _ = std::io::stderr().flush();
                }
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

fn finish(path: &Path, session: &Session) -> CmdResult {
    save_engine(path, session.engine())?;
    report_persist_health(session.store());
    Ok(())
}

/// Save the timer whatever the foreground loop returned, then report it.
fn conclude(path: &Path, shared: &Mutex<Session>, outcome: CmdResult) -> CmdResult {
    let session = shared.lock().map_err(|_| "timer state lock poisoned")?;
    finish(path, &session)?;
    outcome?;
    let snapshot = session.snapshot();
    print_event(&snapshot)
}

pub fn run(action: TimerAction, config: &Config) -> CmdResult {
    let store = open_store(config)?;
    let path = engine_path(config)?;
    let mut engine = load_engine(&path, &store);
    // Nothing ticks between invocations; a timer left running by a killed
    // process resumes paused.
    engine.pause();
    let mut session = Session::resume(engine, store, notifier(config));

    match action {
        TimerAction::Start { task } => {
            if let Some(task) = task {
                session.select_task(Some(parse_uuid(&task)?))?;
            }
            if let Some(started) = session.start() {
                print_event(&started)?;
            }

            let shared = Arc::new(Mutex::new(session));
            let outcome = run_foreground(Arc::clone(&shared));
            return conclude(&path, &shared, outcome);
        }
        TimerAction::Status => {
            print_event(&session.snapshot())?;
        }
        TimerAction::Reset => {
            print_event(&session.reset())?;
        }
        TimerAction::Select { task_id, clear } => {
            let task_id = match (task_id, clear) {
                (_, true) | (None, false) => None,
                (Some(raw), false) => Some(parse_uuid(&raw)?),
            };
            session.select_task(task_id)?;
            print_event(&session.snapshot())?;
        }
    }

    finish(&path, &session)
}
