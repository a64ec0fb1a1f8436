//! Task management commands for CLI.

use clap::Subcommand;
use pomodesk_core::{Config, Repeat, Task, TaskDraft, TaskPatch};

use super::{open_store, parse_uuid, parse_when, report_persist_health, CmdResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task title
        title: String,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Due date (YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC 3339)
        #[arg(long)]
        due: Option<String>,
        /// Reminder time
        #[arg(long)]
        reminder: Option<String>,
        /// Repeat: none, daily, weekly or monthly
        #[arg(long)]
        repeat: Option<String>,
        /// Initial notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List tasks
    List {
        /// Include completed tasks
        #[arg(long)]
        all: bool,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Get task details
    Show {
        /// Task ID
        id: String,
    },
    /// Update a task
    Update {
        /// Task ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New due date
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
        /// New reminder time
        #[arg(long, conflicts_with = "clear_reminder")]
        reminder: Option<String>,
        /// Remove the reminder
        #[arg(long)]
        clear_reminder: bool,
        /// New repeat: none, daily, weekly or monthly
        #[arg(long, conflicts_with = "clear_repeat")]
        repeat: Option<String>,
        /// Remove the repeat setting
        #[arg(long)]
        clear_repeat: bool,
        /// Set completed status
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Flip a task between open and completed
    Toggle {
        /// Task ID
        id: String,
    },
    /// Delete a task (its pomodoros stay in the reports)
    Delete {
        /// Task ID
        id: String,
    },
    /// Append a note to a task
    Note {
        /// Task ID
        id: String,
        /// Note text
        text: String,
    },
    /// Subtask management
    Subtask {
        #[command(subcommand)]
        action: SubtaskAction,
    },
}

#[derive(Subcommand)]
pub enum SubtaskAction {
    /// Add a subtask
    Add {
        /// Parent task ID
        task_id: String,
        /// Subtask title
        title: String,
    },
    /// Flip a subtask between open and completed
    Toggle {
        /// Parent task ID
        task_id: String,
        /// Subtask ID
        subtask_id: String,
    },
    /// Remove a subtask
    Remove {
        /// Parent task ID
        task_id: String,
        /// Subtask ID
        subtask_id: String,
    },
}

fn summary_line(task: &Task) -> String {
    let mark = if task.completed { "x" } else { " " };
    let mut line = format!(
        "[{mark}] {}  {}  ({} pomodoros)",
        task.id, task.title, task.pomodoros_completed
    );
    if let Some(due) = task.due_date {
        line.push_str(&format!("  due {}", due.with_timezone(&chrono::Local).format("%Y-%m-%d")));
    }
    line
}

pub fn run(action: TaskAction, config: &Config) -> CmdResult {
    let mut store = open_store(config)?;

    match action {
        TaskAction::Add {
            title,
            description,
            due,
            reminder,
            repeat,
            notes,
        } => {
            let draft = TaskDraft {
                title,
                description,
                due_date: due.as_deref().map(parse_when).transpose()?,
                reminder: reminder.as_deref().map(parse_when).transpose()?,
                subtasks: Vec::new(),
                repeat: repeat.as_deref().map(str::parse::<Repeat>).transpose()?,
                notes,
            };
            let id = store.add_task(draft)?;
            println!("Task created: {id}");
            if let Some(task) = store.task(id) {
                println!("{}", serde_json::to_string_pretty(task)?);
            }
        }
        TaskAction::List { all, json } => {
            let tasks: Vec<&Task> = store
                .tasks()
                .iter()
                .filter(|task| all || !task.completed)
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks");
            } else {
                for task in tasks {
                    println!("{}", summary_line(task));
                }
            }
        }
        TaskAction::Show { id } => {
            let id = parse_uuid(&id)?;
            let task = store.task(id).ok_or(format!("Task not found: {id}"))?;
            println!("{}", serde_json::to_string_pretty(task)?);
        }
        TaskAction::Update {
            id,
            title,
            description,
            due,
            clear_due,
            reminder,
            clear_reminder,
            repeat,
            clear_repeat,
            completed,
        } => {
            let id = parse_uuid(&id)?;
            let patch = TaskPatch {
                title,
                description,
                completed,
                due_date: if clear_due {
                    Some(None)
                } else {
                    due.as_deref().map(parse_when).transpose()?.map(Some)
                },
                reminder: if clear_reminder {
                    Some(None)
                } else {
                    reminder.as_deref().map(parse_when).transpose()?.map(Some)
                },
                repeat: if clear_repeat {
                    Some(None)
                } else {
                    repeat.as_deref().map(str::parse::<Repeat>).transpose()?.map(Some)
                },
                ..TaskPatch::default()
            };
            if patch.is_empty() {
                return Err("nothing to update".into());
            }
            store.update_task(id, patch)?;
            println!("Task updated:");
            if let Some(task) = store.task(id) {
                println!("{}", serde_json::to_string_pretty(task)?);
            }
        }
        TaskAction::Toggle { id } => {
            let id = parse_uuid(&id)?;
            let completed = store.toggle_task(id)?;
            println!(
                "Task {id} marked {}",
                if completed { "completed" } else { "open" }
            );
        }
        TaskAction::Delete { id } => {
            let id = parse_uuid(&id)?;
            let task = store.delete_task(id)?;
            println!("Task deleted: {} ({})", task.id, task.title);
        }
        TaskAction::Note { id, text } => {
            let id = parse_uuid(&id)?;
            store.add_note(id, &text)?;
            println!("Note added to {id}");
        }
        TaskAction::Subtask { action } => match action {
            SubtaskAction::Add { task_id, title } => {
                let task_id = parse_uuid(&task_id)?;
                let subtask_id = store.add_subtask(task_id, &title)?;
                println!("Subtask created: {subtask_id}");
            }
            SubtaskAction::Toggle {
                task_id,
                subtask_id,
            } => {
                let done = store.toggle_subtask(parse_uuid(&task_id)?, parse_uuid(&subtask_id)?)?;
                println!(
                    "Subtask {subtask_id} marked {}",
                    if done { "completed" } else { "open" }
                );
            }
            SubtaskAction::Remove {
                task_id,
                subtask_id,
            } => {
                let removed = store.remove_subtask(parse_uuid(&task_id)?, parse_uuid(&subtask_id)?)?;
                println!("Subtask removed: {} ({})", removed.id, removed.title);
            }
        },
    }

    report_persist_health(&store);
    Ok(())
}
