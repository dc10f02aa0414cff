// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the fetchers, the loader, and warehouse adapters.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::schema::TableSchema;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Upstream,
    Warehouse,
}

/// Load-time policy for a table's existing contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteDisposition {
    /// Replace the entire table contents with the batch.
    #[serde(alias = "WRITE_TRUNCATE")]
    Replace,
    /// Append the batch to whatever the table already holds.
    #[serde(alias = "WRITE_APPEND")]
    Append,
}

impl WriteDisposition {
    /// The load-job spelling of this disposition.
    pub fn as_job_str(&self) -> &'static str {
        match self {
            WriteDisposition::Replace => "WRITE_TRUNCATE",
            WriteDisposition::Append => "WRITE_APPEND",
        }
    }
}

impl fmt::Display for WriteDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_job_str())
    }
}

/// Fully qualified destination table: `project.dataset.table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    pub fn new(
        project: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            dataset: dataset.into(),
            table: table.into(),
        }
    }

    /// The `project.dataset` identifier of the enclosing dataset.
    pub fn dataset_id(&self) -> String {
        format!("{}.{}", self.project, self.dataset)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// Metadata of a warehouse dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub project: String,
    pub dataset: String,
    /// Region the dataset lives in.
    pub location: String,
}

/// Metadata of a warehouse table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub table: TableRef,
    /// Declared schema, if the table was created with one or a load fixed it.
    pub schema: Option<TableSchema>,
    /// When the warehouse will garbage-collect the table, if ever.
    pub expires: Option<DateTime<Utc>>,
    pub num_rows: u64,
}

/// Settings of a single bulk load job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadJobConfig {
    pub schema: Option<TableSchema>,
    pub write_disposition: WriteDisposition,
    /// Let the warehouse derive the schema itself (set when no schema is supplied).
    pub autodetect: bool,
}

impl LoadJobConfig {
    pub fn new(write_disposition: WriteDisposition, schema: Option<TableSchema>) -> Self {
        Self {
            autodetect: schema.is_none(),
            schema,
            write_disposition,
        }
    }
}

/// Outcome of a completed load job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadJobStats {
    pub rows_loaded: u64,
}
