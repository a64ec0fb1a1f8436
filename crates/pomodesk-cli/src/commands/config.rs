//! Configuration commands for CLI.
//!
//! Keys are dotted paths into `config.toml`, e.g. `notifications.bell`.

use clap::Subcommand;
use pomodesk_core::{Config, ConfigError};
use serde_json::Value;

use super::CmdResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value
    Get {
        /// Dotted key (e.g. "log_level", "persistence.retry_attempts")
        key: String,
    },
    /// Change one value and save
    Set {
        /// Dotted key
        key: String,
        /// New value
        value: String,
    },
    /// Print every key with its value
    List {
        /// Print JSON instead of `key = value` lines
        #[arg(long)]
        json: bool,
    },
    /// Restore defaults and save
    Reset,
    /// Print the config file location
    Path,
}

/// Flatten the config into `(dotted key, value)` pairs, in field order.
fn entries(config: &Config) -> Result<Vec<(String, String)>, serde_json::Error> {
    fn walk(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}.{key}")
                    };
                    walk(&path, child, out);
                }
            }
            Value::String(s) => out.push((prefix.to_string(), s.clone())),
            other => out.push((prefix.to_string(), other.to_string())),
        }
    }

    let mut out = Vec::new();
    walk("", &serde_json::to_value(config)?, &mut out);
    Ok(out)
}

fn print_entries(config: &Config) -> CmdResult {
    for (key, value) in entries(config)? {
        println!("{key} = {value}");
    }
    Ok(())
}

pub fn run(action: ConfigAction) -> CmdResult {
    match action {
        ConfigAction::Get { key } => {
            let value = Config::load()?
                .get(&key)
                .ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            let stored = config.get(&key).unwrap_or(value);
            println!("{key} = {stored}");
        }
        ConfigAction::List { json } => {
            let config = Config::load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print_entries(&config)?;
            }
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("# restored defaults in {}", Config::path()?.display());
            print_entries(&config)?;
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_use_dotted_keys() {
        let pairs = entries(&Config::default()).unwrap();
        let lookup = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(lookup("log_level"), Some("warn"));
        assert_eq!(lookup("notifications.bell"), Some("true"));
        assert_eq!(lookup("persistence.retry_base_ms"), Some("50"));
        // Unset optional keys are omitted.
        assert_eq!(lookup("data_file"), None);
    }

    #[test]
    fn every_listed_key_can_be_read_back() {
        let config = Config::default();
        for (key, value) in entries(&config).unwrap() {
            assert_eq!(config.get(&key).as_deref(), Some(value.as_str()), "{key}");
        }
    }
}
