// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory warehouse adapter for deterministic testing.
//!
//! `MemoryWarehouse` implements `WarehouseAdapter` with the same semantics as
//! the filesystem warehouse, records every call, and can be told to reject
//! load jobs or to pretend that objects are missing when they exist.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use deskline_core::{
    AdapterType, DatasetInfo, DesklineError, HealthStatus, LoadJobConfig, LoadJobStats,
    PluginAdapter, Row, TableInfo, TableRef, TableSchema, WarehouseAdapter, WriteDisposition,
};

/// One call made against the warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarehouseCall {
    GetDataset(String),
    CreateDataset(String),
    GetTable(String),
    CreateTable { table: String, with_schema: bool },
    LoadRows { table: String, rows: usize, disposition: WriteDisposition },
    SetExpiration { table: String, cleared: bool },
}

#[derive(Debug, Default)]
struct StoredTable {
    schema: Option<TableSchema>,
    expires: Option<DateTime<Utc>>,
    rows: Vec<Row>,
}

#[derive(Debug, Default)]
struct State {
    datasets: HashMap<String, DatasetInfo>,
    tables: HashMap<TableRef, StoredTable>,
    calls: Vec<WarehouseCall>,
    load_failure: Option<String>,
    stale_lookups: bool,
}

/// A warehouse that lives entirely in memory.
///
/// Clones share state, so a test can keep one handle for assertions while the
/// loader owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryWarehouse {
    state: Arc<Mutex<State>>,
    default_table_expiration: Option<chrono::Duration>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp new tables with an expiration, like a dataset default would.
    pub fn with_default_table_expiration(mut self, after: chrono::Duration) -> Self {
        self.default_table_expiration = Some(after);
        self
    }

    /// Make lookups answer `NotFound` for objects that exist, so the loader
    /// sees a create race and gets `AlreadyExists` back.
    pub async fn simulate_create_race(&self) {
        self.state.lock().await.stale_lookups = true;
    }

    /// Reject every load job with `message` until cleared with `None`.
    pub async fn fail_loads(&self, message: Option<&str>) {
        self.state.lock().await.load_failure = message.map(str::to_string);
    }

    /// Create a table up front, bypassing call recording.
    pub async fn seed_table(&self, table: &TableRef, schema: Option<TableSchema>, rows: Vec<Row>) {
        let mut state = self.state.lock().await;
        state.datasets.insert(
            table.dataset_id(),
            DatasetInfo {
                project: table.project.clone(),
                dataset: table.dataset.clone(),
                location: "memory".to_string(),
            },
        );
        state.tables.insert(
            table.clone(),
            StoredTable {
                schema,
                expires: None,
                rows,
            },
        );
    }

    pub async fn rows(&self, table: &TableRef) -> Vec<Row> {
        self.state
            .lock()
            .await
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    pub async fn schema(&self, table: &TableRef) -> Option<TableSchema> {
        self.state
            .lock()
            .await
            .tables
            .get(table)
            .and_then(|t| t.schema.clone())
    }

    pub async fn expiration(&self, table: &TableRef) -> Option<DateTime<Utc>> {
        self.state.lock().await.tables.get(table).and_then(|t| t.expires)
    }

    pub async fn has_table(&self, table: &TableRef) -> bool {
        self.state.lock().await.tables.contains_key(table)
    }

    pub async fn calls(&self) -> Vec<WarehouseCall> {
        self.state.lock().await.calls.clone()
    }

    /// Number of load jobs that reached the warehouse.
    pub async fn load_count(&self) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| matches!(c, WarehouseCall::LoadRows { .. }))
            .count()
    }
}

fn missing_table(table: &TableRef) -> DesklineError {
    DesklineError::NotFound {
        kind: "table",
        name: table.to_string(),
    }
}

#[async_trait]
impl PluginAdapter for MemoryWarehouse {
    fn name(&self) -> &str {
        "memory-warehouse"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Warehouse
    }

    async fn health_check(&self) -> Result<HealthStatus, DesklineError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl WarehouseAdapter for MemoryWarehouse {
    async fn get_dataset(&self, project: &str, dataset: &str) -> Result<DatasetInfo, DesklineError> {
        let id = format!("{project}.{dataset}");
        let mut state = self.state.lock().await;
        state.calls.push(WarehouseCall::GetDataset(id.clone()));
        match state.datasets.get(&id) {
            Some(info) if !state.stale_lookups => Ok(info.clone()),
            _ => Err(DesklineError::NotFound {
                kind: "dataset",
                name: id,
            }),
        }
    }

    async fn create_dataset(&self, dataset: &DatasetInfo) -> Result<(), DesklineError> {
        let id = format!("{}.{}", dataset.project, dataset.dataset);
        let mut state = self.state.lock().await;
        state.calls.push(WarehouseCall::CreateDataset(id.clone()));
        if state.datasets.contains_key(&id) {
            return Err(DesklineError::AlreadyExists {
                kind: "dataset",
                name: id,
            });
        }
        state.datasets.insert(id, dataset.clone());
        Ok(())
    }

    async fn get_table(&self, table: &TableRef) -> Result<TableInfo, DesklineError> {
        let mut state = self.state.lock().await;
        state.calls.push(WarehouseCall::GetTable(table.to_string()));
        if state.stale_lookups {
            return Err(missing_table(table));
        }
        let stored = state.tables.get(table).ok_or_else(|| missing_table(table))?;
        Ok(TableInfo {
            table: table.clone(),
            schema: stored.schema.clone(),
            expires: stored.expires,
            num_rows: stored.rows.len() as u64,
        })
    }

    async fn create_table(
        &self,
        table: &TableRef,
        schema: Option<&TableSchema>,
    ) -> Result<(), DesklineError> {
        let mut state = self.state.lock().await;
        state.calls.push(WarehouseCall::CreateTable {
            table: table.to_string(),
            with_schema: schema.is_some(),
        });
        if !state.datasets.contains_key(&table.dataset_id()) {
            return Err(DesklineError::NotFound {
                kind: "dataset",
                name: table.dataset_id(),
            });
        }
        if state.tables.contains_key(table) {
            return Err(DesklineError::AlreadyExists {
                kind: "table",
                name: table.to_string(),
            });
        }
        state.tables.insert(
            table.clone(),
            StoredTable {
                schema: schema.cloned(),
                expires: self.default_table_expiration.map(|d| Utc::now() + d),
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    async fn load_rows(
        &self,
        table: &TableRef,
        rows: &[Row],
        config: &LoadJobConfig,
    ) -> Result<LoadJobStats, DesklineError> {
        let mut state = self.state.lock().await;
        state.calls.push(WarehouseCall::LoadRows {
            table: table.to_string(),
            rows: rows.len(),
            disposition: config.write_disposition,
        });
        if let Some(message) = &state.load_failure {
            return Err(DesklineError::Load {
                table: table.to_string(),
                message: message.clone(),
            });
        }

        let stored = state.tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        let effective = match config.write_disposition {
            WriteDisposition::Replace => config.schema.clone().or_else(|| stored.schema.clone()),
            WriteDisposition::Append => stored.schema.clone().or_else(|| config.schema.clone()),
        };
        if let Some(schema) = &effective
            && let Some(unknown) = rows
                .iter()
                .flat_map(|row| row.keys())
                .find(|k| schema.field(k).is_none())
        {
            return Err(DesklineError::Load {
                table: table.to_string(),
                message: format!("column `{unknown}` is not in the table schema"),
            });
        }

        match config.write_disposition {
            WriteDisposition::Replace => stored.rows = rows.to_vec(),
            WriteDisposition::Append => stored.rows.extend_from_slice(rows),
        }
        stored.schema = effective;

        Ok(LoadJobStats {
            rows_loaded: rows.len() as u64,
        })
    }

    async fn set_table_expiration(
        &self,
        table: &TableRef,
        expires: Option<DateTime<Utc>>,
    ) -> Result<(), DesklineError> {
        let mut state = self.state.lock().await;
        state.calls.push(WarehouseCall::SetExpiration {
            table: table.to_string(),
            cleared: expires.is_none(),
        });
        let stored = state.tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        stored.expires = expires;
        Ok(())
    }
}
