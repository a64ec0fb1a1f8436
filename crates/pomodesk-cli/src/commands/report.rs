//! Report commands for CLI.

use chrono::Local;
use clap::Subcommand;
use pomodesk_core::{Config, DailyReport, MonthlyReport, ReportView, WeeklyReport};

use super::{open_store, parse_date, today, CmdResult};

#[derive(Subcommand)]
pub enum ReportAction {
    /// Pomodoros for one day, grouped by task
    Daily {
        /// Day to report (YYYY-MM-DD), default today
        #[arg(long)]
        date: Option<String>,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Monday-to-Sunday week containing the date
    Weekly {
        /// Any day in the week (YYYY-MM-DD), default today
        #[arg(long)]
        date: Option<String>,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Calendar month containing the date
    Monthly {
        /// Any day in the month (YYYY-MM-DD), default today
        #[arg(long)]
        date: Option<String>,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "pomodoro"
    } else {
        "pomodoros"
    }
}

fn render_daily(report: &DailyReport) -> String {
    let mut out = format!(
        "{}: {} {}\n",
        report.date.format("%A, %B %-d, %Y"),
        report.total,
        plural(report.total)
    );
    if report.tasks.is_empty() {
        out.push_str("  No pomodoros completed\n");
    }
    for entry in &report.tasks {
        let times: Vec<String> = entry
            .timestamps
            .iter()
            .map(|ts| ts.with_timezone(&Local).format("%-I:%M %p").to_string())
            .collect();
        out.push_str(&format!(
            "  {} ({})  {}\n",
            entry.task.title,
            entry.count,
            times.join(", ")
        ));
    }
    out
}

fn render_weekly(report: &WeeklyReport) -> String {
    let mut out = format!(
        "Week {} to {}: {} {}\n",
        report.week_start,
        report.week_end,
        report.total,
        plural(report.total)
    );
    for day in &report.days {
        out.push_str(&format!("  {:<12} {:>3}\n", day.date.format("%a, %b %-d"), day.count));
        for task in &day.tasks {
            out.push_str(&format!("      {} ({})\n", task.task.title, task.count));
        }
    }
    out
}

fn render_monthly(report: &MonthlyReport) -> String {
    let mut out = format!(
        "{}: {} {} across {} tasks\n",
        report.month_start.format("%B %Y"),
        report.total,
        plural(report.total),
        report.active_tasks
    );
    for task in &report.tasks {
        out.push_str(&format!("  {:>3}  {}\n", task.count, task.task.title));
    }
    out
}

pub fn run(action: ReportAction, config: &Config) -> CmdResult {
    let store = open_store(config)?;
    let view = ReportView::new(store.document());

    let day = |date: Option<String>| -> Result<_, String> {
        date.as_deref().map(parse_date).transpose().map(|d| d.unwrap_or_else(today))
    };

    match action {
        ReportAction::Daily { date, json } => {
            let report = view.daily(day(date)?);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_daily(&report));
            }
        }
        ReportAction::Weekly { date, json } => {
            let report = view.weekly(day(date)?);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_weekly(&report));
            }
        }
        ReportAction::Monthly { date, json } => {
            let report = view.monthly(day(date)?);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_monthly(&report));
            }
        }
    }
    Ok(())
}
