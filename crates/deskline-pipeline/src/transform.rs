// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch shaping applied between fetch and load.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use deskline_config::validation::parse_utc_offset;
use deskline_core::{Batch, DesklineError};
use serde_json::Value;
use tracing::debug;

/// Upstream timestamp layout, always UTC.
pub const UPSTREAM_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Ticket columns shifted into the configured offset.
pub const TICKET_TIME_COLUMNS: [&str; 5] = [
    "date_created",
    "date_changed",
    "date_resolved",
    "last_activity",
    "last_activity_public",
];

/// Message row columns shifted into the configured offset.
pub const MESSAGE_TIME_COLUMNS: [&str; 2] = ["datecreated", "ticket_date_created"];

/// Extraction stamp added to ticket batches.
pub const EXTRACTED_COLUMN: &str = "datetime_extracted";

/// Extraction stamp added to user batches.
pub const USER_EXTRACTED_COLUMN: &str = "date_extracted";

/// Shifts upstream UTC timestamps to a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Localizer {
    offset: FixedOffset,
}

impl Localizer {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Parses an offset such as `+08:00`.
    pub fn from_offset_str(raw: &str) -> Result<Self, DesklineError> {
        parse_utc_offset(raw)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
            .ok_or_else(|| DesklineError::Config(format!("invalid UTC offset: {raw}")))
    }

    /// Converts one upstream value. Anything that is not a parseable
    /// timestamp becomes null.
    pub fn localize(&self, value: &Value) -> Value {
        let Some(raw) = value.as_str() else {
            return Value::Null;
        };
        match parse_upstream(raw) {
            Some(utc) => Value::String(
                utc.with_timezone(&self.offset)
                    .naive_local()
                    .format(UPSTREAM_TIME_FORMAT)
                    .to_string(),
            ),
            None => Value::Null,
        }
    }

    /// Localizes every present column in `columns` and flags it as datetime.
    pub fn normalize(&self, batch: &mut Batch, columns: &[&str]) {
        for column in columns {
            if !batch.has_column(column) {
                continue;
            }
            batch.map_column(column, |v| self.localize(&v));
            batch.mark_datetime(column);
        }
    }
}

fn parse_upstream(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, UPSTREAM_TIME_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Adds `column` holding `at` to every row and flags it as datetime.
pub fn stamp_extracted(batch: &mut Batch, column: &str, at: NaiveDateTime) {
    batch.set_column(column, Value::String(at.format(UPSTREAM_TIME_FORMAT).to_string()));
    batch.mark_datetime(column);
}

/// Unwraps a singleton list of one mapping. Any other shape becomes null.
pub fn normalize_custom_fields(batch: &mut Batch) {
    batch.map_column("custom_fields", |value| match value {
        Value::Array(mut items) if items.len() == 1 && items[0].is_object() => items.remove(0),
        _ => Value::Null,
    });
}

/// Drops `names` from the batch, ignoring absent columns.
pub fn prune_columns<S: AsRef<str>>(batch: &mut Batch, names: &[S]) {
    let dropped = batch.drop_columns(names);
    if !dropped.is_empty() {
        debug!(columns = ?dropped, "pruned columns");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manila() -> Localizer {
        Localizer::from_offset_str("+08:00").unwrap()
    }

    fn batch(rows: Vec<Value>) -> Batch {
        rows.into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn utc_is_shifted_to_offset() {
        let l = manila();
        assert_eq!(l.localize(&json!("2025-04-01 20:30:00")), json!("2025-04-02 04:30:00"));
        assert_eq!(l.localize(&json!("2025-04-01T20:30:00Z")), json!("2025-04-02 04:30:00"));
    }

    #[test]
    fn unparsable_values_become_null() {
        let l = manila();
        assert_eq!(l.localize(&json!("not a date")), Value::Null);
        assert_eq!(l.localize(&json!("")), Value::Null);
        assert_eq!(l.localize(&json!(12)), Value::Null);
        assert_eq!(l.localize(&Value::Null), Value::Null);
    }

    #[test]
    fn negative_offsets_are_supported() {
        let l = Localizer::from_offset_str("-05:30").unwrap();
        assert_eq!(l.localize(&json!("2025-04-01 03:00:00")), json!("2025-03-31 21:30:00"));
    }

    #[test]
    fn bad_offset_is_config_error() {
        assert!(matches!(
            Localizer::from_offset_str("Asia/Manila"),
            Err(DesklineError::Config(_))
        ));
    }

    #[test]
    fn normalize_marks_only_present_columns() {
        let mut b = batch(vec![json!({"date_created": "2025-04-01 00:00:00", "subject": "s"})]);
        manila().normalize(&mut b, &TICKET_TIME_COLUMNS);

        assert!(b.is_datetime("date_created"));
        assert!(!b.is_datetime("date_changed"));
        assert!(!b.has_column("date_changed"));
        assert_eq!(b.rows()[0]["date_created"], json!("2025-04-01 08:00:00"));
    }

    #[test]
    fn extraction_stamp_is_added_to_every_row() {
        let mut b = batch(vec![json!({"id": "1"}), json!({"id": "2"})]);
        let at = NaiveDateTime::parse_from_str("2025-04-01 09:15:00", UPSTREAM_TIME_FORMAT).unwrap();
        stamp_extracted(&mut b, EXTRACTED_COLUMN, at);

        assert!(b.is_datetime(EXTRACTED_COLUMN));
        for row in b.rows() {
            assert_eq!(row[EXTRACTED_COLUMN], json!("2025-04-01 09:15:00"));
        }
    }

    #[test]
    fn custom_fields_singleton_is_unwrapped() {
        let mut b = batch(vec![
            json!({"custom_fields": [{"priority": "high"}]}),
            json!({"custom_fields": []}),
            json!({"custom_fields": [{"a": 1}, {"b": 2}]}),
            json!({"custom_fields": "text"}),
        ]);
        normalize_custom_fields(&mut b);
        let values: Vec<&Value> = b.column_values("custom_fields").collect();
        assert_eq!(
            values,
            vec![&json!({"priority": "high"}), &Value::Null, &Value::Null, &Value::Null]
        );
    }

    #[test]
    fn pruning_tolerates_absent_columns() {
        let mut b = batch(vec![json!({"message_id": "m1", "message": "hi"})]);
        prune_columns(&mut b, &["message_id", "type", "agentid"]);
        assert_eq!(b.columns(), ["message".to_string()]);
    }
}
