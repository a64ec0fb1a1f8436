use clap::Subcommand;
use pomodesk_core::{Config, SettingsPatch};

use super::{open_store, report_persist_health, CmdResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print phase durations as JSON
    Show,
    /// Change phase durations (minutes)
    Set {
        /// Work phase length
        #[arg(long)]
        work: Option<u32>,
        /// Short break length
        #[arg(long = "break")]
        break_time: Option<u32>,
        /// Long break length
        #[arg(long)]
        long_break: Option<u32>,
    },
}

pub fn run(action: SettingsAction, config: &Config) -> CmdResult {
    let mut store = open_store(config)?;

    match action {
        SettingsAction::Show => {
            println!("{}", serde_json::to_string_pretty(&store.settings())?);
        }
        SettingsAction::Set {
            work,
            break_time,
            long_break,
        } => {
            let patch = SettingsPatch {
                work_time: work,
                break_time,
                long_break_time: long_break,
            };
            if patch == SettingsPatch::default() {
                return Err("nothing to update (use --work, --break or --long-break)".into());
            }
            // A saved timer picks these up the next time it is loaded.
            let settings = store.update_settings(patch)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
            report_persist_health(&store);
        }
    }
    Ok(())
}
