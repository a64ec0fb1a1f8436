//! Command handlers plus the helpers they share.

pub mod config;
pub mod report;
pub mod settings;
pub mod task;
pub mod timer;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use pomodesk_core::{Config, Store};
use uuid::Uuid;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Open the document store described by the configuration.
pub fn open_store(config: &Config) -> Result<Store, Box<dyn std::error::Error>> {
    Ok(Store::open(config.data_file()?, config.persist_policy()))
}

/// Tell the user when saving has been failing.
pub fn report_persist_health(store: &Store) {
    if let Some(warning) = store.persist_warning() {
        eprintln!("warning: {warning}");
    }
}

pub fn parse_uuid(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|e| format!("invalid id '{raw}': {e}"))
}

/// A calendar day, `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{raw}' (expected YYYY-MM-DD): {e}"))
}

/// An instant: RFC 3339, local `YYYY-MM-DDTHH:MM`, or a local `YYYY-MM-DD`
/// (taken as midnight).
pub fn parse_when(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| parse_date(raw).map(|d| d.and_time(chrono::NaiveTime::MIN)))
        .map_err(|_| format!("invalid time '{raw}' (expected YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC 3339)"))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
        .ok_or_else(|| format!("'{raw}' does not exist in the local time zone"))
}

/// Today in the local time zone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `mm:ss`
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_format_pads() {
        assert_eq!(format_clock(25 * 60), "25:00");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(0), "00:00");
    }

    #[test]
    fn parse_when_accepts_rfc3339_and_local_forms() {
        let utc = parse_when("2024-03-05T12:00:00Z").unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-03-05T12:00:00+00:00");
        assert!(parse_when("2024-03-05T09:30").is_ok());
        assert!(parse_when("2024-03-05").is_ok());
        assert!(parse_when("tomorrow").is_err());
    }

    #[test]
    fn parse_uuid_reports_input() {
        let err = parse_uuid("abc").unwrap_err();
        assert!(err.contains("abc"));
    }
}
