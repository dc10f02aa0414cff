// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local CSV export of extracted records.

use std::path::Path;

use deskline_core::{Batch, DesklineError, Row};
use serde_json::Value;

/// Writes `rows` to `path` with a header line. Nested values are written as
/// JSON text and nulls as empty cells. Returns the number of data rows.
pub fn write_csv(path: &Path, rows: &[Row]) -> Result<usize, DesklineError> {
    let batch = Batch::from_rows(rows.iter().cloned());
    let io_err = |e: csv::Error| DesklineError::Internal(format!("writing {}: {e}", path.display()));

    let mut writer = csv::Writer::from_path(path).map_err(io_err)?;
    writer.write_record(batch.columns()).map_err(io_err)?;
    for row in batch.rows() {
        writer
            .write_record(batch.columns().iter().map(|c| cell(row.get(c))))
            .map_err(io_err)?;
    }
    writer
        .flush()
        .map_err(|e| DesklineError::Internal(format!("writing {}: {e}", path.display())))?;
    Ok(batch.len())
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_values_are_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let rows: Vec<Row> = vec![
            json!({"id": "t1", "custom_fields": {"priority": "high"}, "open": true}),
            json!({"id": "t2", "custom_fields": null, "open": false}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();

        assert_eq!(write_csv(&path, &rows).unwrap(), 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, ["id", "custom_fields", "open"]);
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(&records[0][1], r#"{"priority":"high"}"#);
        assert_eq!(&records[1][1], "");
        assert_eq!(&records[1][2], "false");
    }
}
