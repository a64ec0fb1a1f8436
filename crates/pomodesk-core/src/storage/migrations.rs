//! Document schema migrations.
//!
//! Migrations run on the raw JSON value before it is deserialized into a
//! [`Document`](super::Document). The `version` field tracks the schema; a
//! document without one is version 0, the unversioned layout written by
//! earlier desktop builds.

use chrono::{DateTime, Local, NaiveDate};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::document::CURRENT_VERSION;
use crate::error::StoreError;

/// Apply all pending migrations to bring the document to the current version.
///
/// # Errors
/// Returns an error if the document is not an object or was written by a
/// newer release.
pub fn migrate(mut doc: Value) -> Result<Value, StoreError> {
    let current_version = schema_version(&doc)?;
    if current_version > CURRENT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: current_version,
            supported: CURRENT_VERSION,
        });
    }

    if current_version < 1 {
        migrate_v1(&mut doc)?;
        tracing::info!("migrated document from version 0 to 1");
    }

    Ok(doc)
}

fn schema_version(doc: &Value) -> Result<u32, StoreError> {
    let obj = doc.as_object().ok_or_else(not_an_object)?;
    Ok(obj
        .get("version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0))
}

/// Version 1:
/// - report dates become plain local calendar dates (`YYYY-MM-DD`), merging
///   reports that fall on the same day
/// - an empty-string `repeat` on a task becomes `null`
/// - settings that are not positive whole minutes (an emptied form field was
///   saved as `null`) are dropped so their defaults apply
fn migrate_v1(doc: &mut Value) -> Result<(), StoreError> {
    let obj = doc.as_object_mut().ok_or_else(not_an_object)?;

    match obj.get_mut("settings") {
        Some(Value::Object(settings)) => {
            settings.retain(|key, value| {
                let valid = is_positive_minutes(value);
                if !valid {
                    tracing::warn!(key = %key, %value, "dropping unusable setting");
                }
                valid
            });
        }
        Some(_) => {
            obj.remove("settings");
        }
        None => {}
    }

    if let Some(Value::Array(reports)) = obj.get_mut("reports") {
        let taken = std::mem::take(reports);
        *reports = merge_reports_by_day(taken);
    }

    if let Some(Value::Array(tasks)) = obj.get_mut("tasks") {
        for task in tasks.iter_mut().filter_map(Value::as_object_mut) {
            if matches!(task.get("repeat"), Some(Value::String(s)) if s.is_empty()) {
                task.insert("repeat".into(), Value::Null);
            }
        }
    }

    obj.insert("version".into(), Value::from(1u32));
    Ok(())
}

fn merge_reports_by_day(reports: Vec<Value>) -> Vec<Value> {
    let mut by_day: IndexMap<String, Vec<Value>> = IndexMap::new();
    for report in reports {
        let Some(day) = report.get("date").and_then(Value::as_str).and_then(calendar_day) else {
            tracing::warn!(?report, "dropping report with unreadable date");
            continue;
        };
        let pomodoros = match report.get("pomodoros") {
            Some(Value::Array(entries)) => entries.clone(),
            _ => Vec::new(),
        };
        by_day
            .entry(day.format("%Y-%m-%d").to_string())
            .or_default()
            .extend(pomodoros);
    }

    by_day
        .into_iter()
        .map(|(date, pomodoros)| {
            let mut report = Map::new();
            report.insert("date".into(), Value::String(date));
            report.insert("pomodoros".into(), Value::Array(pomodoros));
            Value::Object(report)
        })
        .collect()
}

fn is_positive_minutes(value: &Value) -> bool {
    value
        .as_u64()
        .is_some_and(|v| v > 0 && u32::try_from(v).is_ok())
}

/// Local calendar day of either an RFC 3339 timestamp or a plain date.
fn calendar_day(raw: &str) -> Option<NaiveDate> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Local).date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn not_an_object() -> StoreError {
    StoreError::invalid("document", "expected a JSON object at the top level")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_report_dates_become_calendar_days() {
        let ts = "2024-03-05T12:00:00.000Z";
        let expected = DateTime::parse_from_rfc3339(ts)
            .unwrap()
            .with_timezone(&Local)
            .date_naive()
            .format("%Y-%m-%d")
            .to_string();

        let doc = json!({
            "tasks": [],
            "settings": {"workTime": 25, "breakTime": 5, "longBreakTime": 15},
            "reports": [{"date": ts, "pomodoros": []}]
        });
        let migrated = migrate(doc).unwrap();
        assert_eq!(migrated["version"], 1);
        assert_eq!(migrated["reports"][0]["date"], expected);
    }

    #[test]
    fn same_day_reports_are_merged_in_order() {
        let doc = json!({
            "reports": [
                {"date": "2024-03-05", "pomodoros": [{"n": 1}]},
                {"date": "2024-03-06", "pomodoros": [{"n": 2}]},
                {"date": "2024-03-05", "pomodoros": [{"n": 3}]}
            ]
        });
        let migrated = migrate(doc).unwrap();
        let reports = migrated["reports"].as_array().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0]["pomodoros"], json!([{"n": 1}, {"n": 3}]));
        assert_eq!(reports[1]["date"], "2024-03-06");
    }

    #[test]
    fn empty_repeat_becomes_null() {
        let doc = json!({"tasks": [{"repeat": ""}, {"repeat": "daily"}]});
        let migrated = migrate(doc).unwrap();
        assert!(migrated["tasks"][0]["repeat"].is_null());
        assert_eq!(migrated["tasks"][1]["repeat"], "daily");
    }

    #[test]
    fn unusable_settings_fall_back_to_defaults() {
        let doc = json!({
            "tasks": [{"title": "kept"}],
            "settings": {"workTime": null, "breakTime": 0, "longBreakTime": 20}
        });
        let migrated = migrate(doc).unwrap();
        assert_eq!(migrated["settings"], json!({"longBreakTime": 20}));
        assert_eq!(migrated["tasks"][0]["title"], "kept");

        let doc = json!({"settings": null});
        assert!(migrate(doc).unwrap().get("settings").is_none());
    }

    #[test]
    fn current_version_is_untouched() {
        let doc = json!({"version": 1, "reports": [{"date": "2024-03-05", "pomodoros": []}]});
        assert_eq!(migrate(doc.clone()).unwrap(), doc);
    }

    #[test]
    fn newer_version_is_rejected() {
        let doc = json!({"version": CURRENT_VERSION + 1});
        assert!(matches!(
            migrate(doc),
            Err(StoreError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(migrate(json!([1, 2, 3])).is_err());
    }
}
