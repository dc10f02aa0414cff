// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Uniform-column row batches.
//!
//! A [`Batch`] is the in-memory table produced by one fetcher invocation. It is
//! an ordered sequence of [`Row`]s that all carry the same column set: when a
//! row introduces a new column every other row receives an explicit JSON
//! `null` for it, and a row missing a known column is filled the same way.
//! Schema inference and loading can therefore rely on rectangular input.

use std::collections::BTreeSet;

use serde_json::Value;

/// One record: column name to value, in column order.
pub type Row = serde_json::Map<String, Value>;

/// An ordered, rectangular collection of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    columns: Vec<String>,
    rows: Vec<Row>,
    datetime_columns: BTreeSet<String>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a batch from arbitrary rows, taking the union of their columns
    /// in first-seen order.
    pub fn from_rows(rows: impl IntoIterator<Item = Row>) -> Self {
        let mut batch = Self::new();
        for row in rows {
            batch.push(row);
        }
        batch
    }

    /// Appends a row, widening the batch if the row brings new columns.
    pub fn push(&mut self, mut row: Row) {
        let mut widened = false;
        for key in row.keys() {
            if !self.columns.iter().any(|c| c == key) {
                self.columns.push(key.clone());
                widened = true;
            }
        }
        if widened {
            for existing in &mut self.rows {
                for column in &self.columns {
                    if !existing.contains_key(column) {
                        existing.insert(column.clone(), Value::Null);
                    }
                }
            }
        }

        let mut ordered = Row::with_capacity(self.columns.len());
        for column in &self.columns {
            let value = row.remove(column).unwrap_or(Value::Null);
            ordered.insert(column.clone(), value);
        }
        self.rows.push(ordered);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in the first row, the sample used for schema inference.
    pub fn first_value(&self, column: &str) -> Option<&Value> {
        self.rows.first().and_then(|row| row.get(column))
    }

    /// All values of one column, top to bottom.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().filter_map(move |row| row.get(column))
    }

    /// Rewrites every value of `column` in place. Unknown columns are ignored.
    pub fn map_column(&mut self, column: &str, mut f: impl FnMut(Value) -> Value) {
        if !self.has_column(column) {
            return;
        }
        for row in &mut self.rows {
            if let Some(slot) = row.get_mut(column) {
                let value = std::mem::take(slot);
                *slot = f(value);
            }
        }
    }

    /// Adds (or overwrites) a column holding the same value on every row.
    pub fn set_column(&mut self, column: &str, value: Value) {
        if !self.has_column(column) {
            self.columns.push(column.to_string());
        }
        for row in &mut self.rows {
            row.insert(column.to_string(), value.clone());
        }
    }

    /// Removes the named columns, skipping any that are absent. Returns the
    /// names that were actually dropped.
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        let mut dropped = Vec::new();
        for name in names {
            let name = name.as_ref();
            if let Some(pos) = self.columns.iter().position(|c| c == name) {
                self.columns.remove(pos);
                for row in &mut self.rows {
                    row.shift_remove(name);
                }
                self.datetime_columns.remove(name);
                dropped.push(name.to_string());
            }
        }
        dropped
    }

    /// Flags a column as holding date-time values.
    pub fn mark_datetime(&mut self, column: &str) {
        if self.has_column(column) {
            self.datetime_columns.insert(column.to_string());
        }
    }

    pub fn is_datetime(&self, column: &str) -> bool {
        self.datetime_columns.contains(column)
    }
}

impl FromIterator<Row> for Batch {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Batch::from_rows(iter)
    }
}
