// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema inference from a row batch.
//!
//! The first row is the representative sample for every column. Per column,
//! in priority order:
//!
//! 1. a mapping (or a list whose first element is a mapping) becomes a
//!    `RECORD` whose children are inferred recursively from the sampled
//!    mapping(s);
//! 2. a column flagged as date-time in the batch becomes `DATETIME`;
//! 3. otherwise the JSON kind decides: integer, numeric (unsigned beyond
//!    `i64`), float, boolean, and `STRING` for strings, nulls, and anything
//!    else.
//!
//! A multi-element list sample makes the column `REPEATED`; a singleton list
//! is unwrapped and stays `NULLABLE`.

use deskline_core::{Batch, FieldMode, FieldType, Row, SchemaField, TableSchema};
use serde_json::Value;
use tracing::debug;

/// Derives a table schema from `batch`, or `None` when there is no row to
/// sample (the load then falls back to autodetection).
pub fn infer_schema(batch: &Batch) -> Option<TableSchema> {
    if batch.is_empty() {
        return None;
    }

    let fields: Vec<SchemaField> = batch
        .columns()
        .iter()
        .map(|column| infer_column(batch, column))
        .collect();

    debug!(
        columns = fields.len(),
        records = fields.iter().filter(|f| f.field_type == FieldType::Record).count(),
        "schema inferred"
    );
    Some(TableSchema::new(fields))
}

fn infer_column(batch: &Batch, column: &str) -> SchemaField {
    let sample = batch.first_value(column).unwrap_or(&Value::Null);
    let (element, mode) = sample_shape(sample);

    if matches!(element, Value::Object(_)) {
        let nested = Batch::from_rows(sample_mappings(sample));
        return match infer_schema(&nested) {
            Some(schema) if !schema.is_empty() => {
                SchemaField::record(column, schema.fields).with_mode(mode)
            }
            // An empty mapping has no children to declare.
            _ => SchemaField::new(column, FieldType::String).with_mode(mode),
        };
    }

    if batch.is_datetime(column) {
        return SchemaField::new(column, FieldType::Datetime).with_mode(mode);
    }

    SchemaField::new(column, primitive_type(element)).with_mode(mode)
}

/// The value that decides the type, and the column mode.
fn sample_shape(sample: &Value) -> (&Value, FieldMode) {
    match sample {
        Value::Array(items) if items.len() > 1 => (&items[0], FieldMode::Repeated),
        Value::Array(items) => (items.first().unwrap_or(&Value::Null), FieldMode::Nullable),
        other => (other, FieldMode::Nullable),
    }
}

/// The mapping(s) held by a sampled value, normalized into rows.
fn sample_mappings(sample: &Value) -> Vec<Row> {
    match sample {
        Value::Object(map) => vec![map.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect(),
        _ => Vec::new(),
    }
}

fn primitive_type(value: &Value) -> FieldType {
    match value {
        Value::Bool(_) => FieldType::Boolean,
        Value::Number(n) if n.is_i64() => FieldType::Integer,
        Value::Number(n) if n.is_u64() => FieldType::Numeric,
        Value::Number(_) => FieldType::Float,
        _ => FieldType::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batch(rows: Vec<Value>) -> Batch {
        rows.into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn singleton_list_of_mapping_is_nullable_record() {
        let b = batch(vec![
            json!({"id": "t1", "custom_fields": [{"priority": "high"}]}),
            json!({"id": "t2", "custom_fields": [{"priority": "low"}]}),
        ]);
        let schema = infer_schema(&b).unwrap();
        let field = schema.field("custom_fields").unwrap();

        assert_eq!(field.field_type, FieldType::Record);
        assert_eq!(field.mode, FieldMode::Nullable);
        assert_eq!(field.fields, vec![SchemaField::new("priority", FieldType::String)]);
    }

    #[test]
    fn multi_element_list_is_repeated() {
        let b = batch(vec![json!({
            "scores": [1, 2, 3],
            "items": [{"sku": "a", "qty": 1}, {"sku": "b", "note": "x"}],
            "solo": ["only"]
        })]);
        let schema = infer_schema(&b).unwrap();

        let scores = schema.field("scores").unwrap();
        assert_eq!((scores.field_type, scores.mode), (FieldType::Integer, FieldMode::Repeated));

        let items = schema.field("items").unwrap();
        assert_eq!(items.field_type, FieldType::Record);
        assert!(items.is_repeated());
        let names: Vec<&str> = items.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["sku", "qty", "note"]);

        let solo = schema.field("solo").unwrap();
        assert_eq!((solo.field_type, solo.mode), (FieldType::String, FieldMode::Nullable));
    }

    #[test]
    fn primitive_kinds_map_to_warehouse_types() {
        let b = batch(vec![json!({
            "count": 3,
            "big": u64::MAX,
            "ratio": 0.5,
            "open": true,
            "name": "x",
            "missing": null
        })]);
        let schema = infer_schema(&b).unwrap();
        let types: Vec<FieldType> = schema.fields.iter().map(|f| f.field_type).collect();
        assert_eq!(
            types,
            vec![
                FieldType::Integer,
                FieldType::Numeric,
                FieldType::Float,
                FieldType::Boolean,
                FieldType::String,
                FieldType::String,
            ]
        );
        assert!(schema.fields.iter().all(|f| f.mode == FieldMode::Nullable));
    }

    #[test]
    fn flagged_columns_are_datetime() {
        let mut b = batch(vec![json!({"date_created": "2025-04-01 08:00:00", "subject": "s"})]);
        b.mark_datetime("date_created");
        let schema = infer_schema(&b).unwrap();
        assert_eq!(schema.field("date_created").unwrap().field_type, FieldType::Datetime);
        assert_eq!(schema.field("subject").unwrap().field_type, FieldType::String);
    }

    #[test]
    fn record_takes_priority_over_datetime_flag() {
        let mut b = batch(vec![json!({"when": {"at": "2025-04-01 08:00:00"}})]);
        b.mark_datetime("when");
        let schema = infer_schema(&b).unwrap();
        assert_eq!(schema.field("when").unwrap().field_type, FieldType::Record);
    }

    #[test]
    fn nested_records_recurse() {
        let b = batch(vec![json!({"meta": {"owner": {"id": 7, "name": "Bob"}, "ok": false}})]);
        let schema = infer_schema(&b).unwrap();
        let meta = schema.field("meta").unwrap();
        let owner = meta.field("owner").unwrap();
        assert_eq!(owner.field_type, FieldType::Record);
        assert_eq!(owner.field("id").unwrap().field_type, FieldType::Integer);
        assert_eq!(meta.field("ok").unwrap().field_type, FieldType::Boolean);
    }

    #[test]
    fn first_row_is_the_sample() {
        let b = batch(vec![json!({"v": null}), json!({"v": 5})]);
        let schema = infer_schema(&b).unwrap();
        assert_eq!(schema.field("v").unwrap().field_type, FieldType::String);
    }

    #[test]
    fn empty_mapping_and_empty_list_fall_back_to_string() {
        let b = batch(vec![json!({"cf": {}, "tags": []})]);
        let schema = infer_schema(&b).unwrap();
        assert_eq!(schema.field("cf").unwrap().field_type, FieldType::String);
        let tags = schema.field("tags").unwrap();
        assert_eq!((tags.field_type, tags.mode), (FieldType::String, FieldMode::Nullable));
    }

    #[test]
    fn empty_batch_has_no_schema() {
        assert!(infer_schema(&Batch::new()).is_none());
    }
}
