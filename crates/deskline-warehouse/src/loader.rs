// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idempotent warehouse loading.
//!
//! [`WarehouseLoader::load`] makes sure the destination dataset and table
//! exist, runs one bulk load under the requested write disposition, then
//! clears the table's expiration. Ensure steps treat "already exists" as
//! success and propagate any other error. Failures of the load job itself
//! are logged and returned as [`LoadOutcome::Failed`].

use std::fmt;
use std::sync::Arc;

use deskline_core::{
    Batch, DatasetInfo, DesklineError, LoadJobConfig, TableRef, TableSchema, WarehouseAdapter,
    WriteDisposition,
};
use tracing::{debug, error, info};

/// Result of one load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { table: TableRef, rows: u64 },
    Failed { table: TableRef, message: String },
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }

    /// Converts a failed outcome into [`DesklineError::Load`].
    pub fn into_result(self) -> Result<u64, DesklineError> {
        match self {
            LoadOutcome::Loaded { rows, .. } => Ok(rows),
            LoadOutcome::Failed { table, message } => Err(DesklineError::Load {
                table: table.to_string(),
                message,
            }),
        }
    }
}

impl fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadOutcome::Loaded { table, rows } => write!(f, "Loaded {rows} rows into {table}"),
            LoadOutcome::Failed { table, message } => {
                write!(f, "Failed to load data into {table}: {message}")
            }
        }
    }
}

/// Loads batches into a warehouse through a [`WarehouseAdapter`].
#[derive(Clone)]
pub struct WarehouseLoader {
    warehouse: Arc<dyn WarehouseAdapter>,
    location: String,
}

impl fmt::Debug for WarehouseLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarehouseLoader")
            .field("warehouse", &self.warehouse.name())
            .field("location", &self.location)
            .finish()
    }
}

impl WarehouseLoader {
    /// `location` is the region used when a dataset has to be created.
    pub fn new(warehouse: Arc<dyn WarehouseAdapter>, location: impl Into<String>) -> Self {
        Self {
            warehouse,
            location: location.into(),
        }
    }

    /// Creates the dataset if it is missing.
    pub async fn ensure_dataset(&self, project: &str, dataset: &str) -> Result<(), DesklineError> {
        match self.warehouse.get_dataset(project, dataset).await {
            Ok(_) => return Ok(()),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let info = DatasetInfo {
            project: project.to_string(),
            dataset: dataset.to_string(),
            location: self.location.clone(),
        };
        match self.warehouse.create_dataset(&info).await {
            Ok(()) => {
                info!(dataset = %format!("{project}.{dataset}"), location = %self.location, "created dataset");
                Ok(())
            }
            Err(e) if e.is_already_exists() => {
                debug!(dataset = %format!("{project}.{dataset}"), "dataset created concurrently");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Creates the table, with `schema` when given, if it is missing.
    pub async fn ensure_table(
        &self,
        table: &TableRef,
        schema: Option<&TableSchema>,
    ) -> Result<(), DesklineError> {
        match self.warehouse.get_table(table).await {
            Ok(_) => {
                debug!(table = %table, "table already exists");
                return Ok(());
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        match self.warehouse.create_table(table, schema).await {
            Ok(()) => {
                info!(table = %table, with_schema = schema.is_some(), "created table");
                Ok(())
            }
            Err(e) if e.is_already_exists() => {
                debug!(table = %table, "table created concurrently");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Ensures the destination exists, loads `batch`, and clears expiration.
    pub async fn load(
        &self,
        batch: &Batch,
        table: &TableRef,
        disposition: WriteDisposition,
        schema: Option<TableSchema>,
    ) -> Result<LoadOutcome, DesklineError> {
        self.ensure_dataset(&table.project, &table.dataset).await?;
        self.ensure_table(table, schema.as_ref()).await?;

        let config = LoadJobConfig::new(disposition, schema);
        debug!(
            table = %table,
            rows = batch.len(),
            disposition = %disposition,
            autodetect = config.autodetect,
            "starting load job"
        );

        let result = async {
            let stats = self.warehouse.load_rows(table, batch.rows(), &config).await?;
            self.warehouse.set_table_expiration(table, None).await?;
            Ok::<_, DesklineError>(stats)
        }
        .await;

        match result {
            Ok(stats) => {
                info!(table = %table, rows = stats.rows_loaded, "load complete");
                Ok(LoadOutcome::Loaded {
                    table: table.clone(),
                    rows: stats.rows_loaded,
                })
            }
            Err(e) => {
                error!(table = %table, error = %e, "load job failed");
                Ok(LoadOutcome::Failed {
                    table: table.clone(),
                    message: e.to_string(),
                })
            }
        }
    }
}
