// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Warehouse adapter trait for analytics destinations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::batch::Row;
use crate::error::DesklineError;
use crate::schema::TableSchema;
use crate::traits::adapter::PluginAdapter;
use crate::types::{DatasetInfo, LoadJobConfig, LoadJobStats, TableInfo, TableRef};

/// Minimal warehouse client surface consumed by the loader.
///
/// Lookups of missing objects must answer [`DesklineError::NotFound`] and
/// creates of existing objects [`DesklineError::AlreadyExists`]; the loader
/// builds its idempotent ensure-semantics on those two variants.
#[async_trait]
pub trait WarehouseAdapter: PluginAdapter {
    /// Fetches dataset metadata.
    async fn get_dataset(&self, project: &str, dataset: &str)
        -> Result<DatasetInfo, DesklineError>;

    /// Creates a dataset in the given location.
    async fn create_dataset(&self, dataset: &DatasetInfo) -> Result<(), DesklineError>;

    /// Fetches table metadata.
    async fn get_table(&self, table: &TableRef) -> Result<TableInfo, DesklineError>;

    /// Creates an empty table, optionally with a declared schema.
    async fn create_table(
        &self,
        table: &TableRef,
        schema: Option<&TableSchema>,
    ) -> Result<(), DesklineError>;

    /// Runs a bulk load job and waits for it to finish.
    async fn load_rows(
        &self,
        table: &TableRef,
        rows: &[Row],
        config: &LoadJobConfig,
    ) -> Result<LoadJobStats, DesklineError>;

    /// Sets or clears (`None`) the table's expiration time.
    async fn set_table_expiration(
        &self,
        table: &TableRef,
        expires: Option<DateTime<Utc>>,
    ) -> Result<(), DesklineError>;
}
