// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem implementation of the WarehouseAdapter trait.
//!
//! Layout under the root directory:
//!
//! ```text
//! {root}/{project}/{dataset}/dataset.json        dataset metadata
//! {root}/{project}/{dataset}/{table}.table.json  schema and expiration
//! {root}/{project}/{dataset}/{table}.ndjson      one JSON row per line
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use deskline_config::model::WarehouseConfig;
use deskline_core::{
    AdapterType, DatasetInfo, DesklineError, HealthStatus, LoadJobConfig, LoadJobStats,
    PluginAdapter, Row, TableInfo, TableRef, TableSchema, WarehouseAdapter, WriteDisposition,
};

/// Table metadata persisted next to the row file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TableMeta {
    schema: Option<TableSchema>,
    expires: Option<DateTime<Utc>>,
}

/// Directory-backed warehouse.
///
/// New tables get an expiration of `default_table_expiration_days` when set,
/// mimicking a dataset-level default that loads must clear.
#[derive(Debug, Clone)]
pub struct LocalWarehouse {
    root: PathBuf,
    default_table_expiration: Option<Duration>,
}

impl LocalWarehouse {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            default_table_expiration: None,
        }
    }

    pub fn from_config(config: &WarehouseConfig) -> Self {
        let mut warehouse = Self::new(&config.root);
        warehouse.default_table_expiration = config
            .default_table_expiration_days
            .map(|days| Duration::days(i64::from(days)));
        warehouse
    }

    pub fn with_default_table_expiration(mut self, expiration: Duration) -> Self {
        self.default_table_expiration = Some(expiration);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dataset_dir(&self, project: &str, dataset: &str) -> PathBuf {
        self.root.join(project).join(dataset)
    }

    fn meta_path(&self, table: &TableRef) -> PathBuf {
        self.dataset_dir(&table.project, &table.dataset)
            .join(format!("{}.table.json", table.table))
    }

    fn rows_path(&self, table: &TableRef) -> PathBuf {
        self.dataset_dir(&table.project, &table.dataset)
            .join(format!("{}.ndjson", table.table))
    }

    async fn read_meta(&self, table: &TableRef) -> Result<TableMeta, DesklineError> {
        match tokio::fs::read(self.meta_path(table)).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| DesklineError::Warehouse {
                message: format!("corrupt metadata for {table}: {e}"),
                source: Some(Box::new(e)),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DesklineError::NotFound {
                kind: "table",
                name: table.to_string(),
            }),
            Err(e) => Err(io_error(&format!("reading metadata of {table}"), e)),
        }
    }

    async fn write_meta(&self, table: &TableRef, meta: &TableMeta) -> Result<(), DesklineError> {
        let bytes = serde_json::to_vec_pretty(meta)
            .map_err(|e| DesklineError::Internal(format!("serializing table metadata: {e}")))?;
        tokio::fs::write(self.meta_path(table), bytes)
            .await
            .map_err(|e| io_error(&format!("writing metadata of {table}"), e))
    }

    /// Reads back every row stored in `table`.
    pub async fn read_rows(&self, table: &TableRef) -> Result<Vec<Row>, DesklineError> {
        self.read_meta(table).await?;
        let content = match tokio::fs::read_to_string(self.rows_path(table)).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&format!("reading rows of {table}"), e)),
        };
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str::<Row>(line).map_err(|e| DesklineError::Warehouse {
                    message: format!("corrupt row in {table}: {e}"),
                    source: Some(Box::new(e)),
                })
            })
            .collect()
    }
}

fn io_error(context: &str, e: std::io::Error) -> DesklineError {
    DesklineError::Warehouse {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl PluginAdapter for LocalWarehouse {
    fn name(&self) -> &str {
        "local"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Warehouse
    }

    async fn health_check(&self) -> Result<HealthStatus, DesklineError> {
        match tokio::fs::create_dir_all(&self.root).await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "warehouse root {} unusable: {e}",
                self.root.display()
            ))),
        }
    }
}

#[async_trait]
impl WarehouseAdapter for LocalWarehouse {
    async fn get_dataset(&self, project: &str, dataset: &str) -> Result<DatasetInfo, DesklineError> {
        let path = self.dataset_dir(project, dataset).join("dataset.json");
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| DesklineError::Warehouse {
                message: format!("corrupt dataset metadata at {}: {e}", path.display()),
                source: Some(Box::new(e)),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DesklineError::NotFound {
                kind: "dataset",
                name: format!("{project}.{dataset}"),
            }),
            Err(e) => Err(io_error("reading dataset metadata", e)),
        }
    }

    async fn create_dataset(&self, dataset: &DatasetInfo) -> Result<(), DesklineError> {
        let dir = self.dataset_dir(&dataset.project, &dataset.dataset);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error("creating dataset directory", e))?;

        let bytes = serde_json::to_vec_pretty(dataset)
            .map_err(|e| DesklineError::Internal(format!("serializing dataset metadata: {e}")))?;
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join("dataset.json"))
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(DesklineError::AlreadyExists {
                    kind: "dataset",
                    name: format!("{}.{}", dataset.project, dataset.dataset),
                });
            }
            Err(e) => return Err(io_error("creating dataset metadata", e)),
        };
        file.write_all(&bytes)
            .await
            .map_err(|e| io_error("writing dataset metadata", e))?;
        debug!(dir = %dir.display(), "dataset directory created");
        Ok(())
    }

    async fn get_table(&self, table: &TableRef) -> Result<TableInfo, DesklineError> {
        let meta = self.read_meta(table).await?;
        let num_rows = self.read_rows(table).await?.len() as u64;
        Ok(TableInfo {
            table: table.clone(),
            schema: meta.schema,
            expires: meta.expires,
            num_rows,
        })
    }

    async fn create_table(
        &self,
        table: &TableRef,
        schema: Option<&TableSchema>,
    ) -> Result<(), DesklineError> {
        self.get_dataset(&table.project, &table.dataset).await?;

        let meta = TableMeta {
            schema: schema.cloned(),
            expires: self.default_table_expiration.map(|d| Utc::now() + d),
        };
        let bytes = serde_json::to_vec_pretty(&meta)
            .map_err(|e| DesklineError::Internal(format!("serializing table metadata: {e}")))?;

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.meta_path(table))
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(DesklineError::AlreadyExists {
                    kind: "table",
                    name: table.to_string(),
                });
            }
            Err(e) => return Err(io_error(&format!("creating {table}"), e)),
        };
        file.write_all(&bytes)
            .await
            .map_err(|e| io_error(&format!("writing metadata of {table}"), e))?;
        tokio::fs::write(self.rows_path(table), b"")
            .await
            .map_err(|e| io_error(&format!("creating row file of {table}"), e))?;
        Ok(())
    }

    async fn load_rows(
        &self,
        table: &TableRef,
        rows: &[Row],
        config: &LoadJobConfig,
    ) -> Result<LoadJobStats, DesklineError> {
        let mut meta = self.read_meta(table).await?;

        let effective = match config.write_disposition {
            WriteDisposition::Replace => config.schema.clone().or_else(|| meta.schema.clone()),
            WriteDisposition::Append => meta.schema.clone().or_else(|| config.schema.clone()),
        };
        if let Some(schema) = &effective {
            for row in rows {
                if let Some(unknown) = row.keys().find(|k| schema.field(k).is_none()) {
                    return Err(DesklineError::Load {
                        table: table.to_string(),
                        message: format!("column `{unknown}` is not in the table schema"),
                    });
                }
            }
        }

        let mut buf = Vec::new();
        for row in rows {
            serde_json::to_writer(&mut buf, row)
                .map_err(|e| DesklineError::Internal(format!("serializing row: {e}")))?;
            buf.push(b'\n');
        }

        let path = self.rows_path(table);
        match config.write_disposition {
            WriteDisposition::Replace => tokio::fs::write(&path, &buf)
                .await
                .map_err(|e| io_error(&format!("replacing rows of {table}"), e))?,
            WriteDisposition::Append => {
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .await
                    .map_err(|e| io_error(&format!("opening rows of {table}"), e))?;
                file.write_all(&buf)
                    .await
                    .map_err(|e| io_error(&format!("appending rows to {table}"), e))?;
                file.flush()
                    .await
                    .map_err(|e| io_error(&format!("appending rows to {table}"), e))?;
            }
        }

        if effective != meta.schema {
            meta.schema = effective;
            self.write_meta(table, &meta).await?;
        }

        debug!(table = %table, rows = rows.len(), disposition = %config.write_disposition, "rows written");
        Ok(LoadJobStats {
            rows_loaded: rows.len() as u64,
        })
    }

    async fn set_table_expiration(
        &self,
        table: &TableRef,
        expires: Option<DateTime<Utc>>,
    ) -> Result<(), DesklineError> {
        let mut meta = self.read_meta(table).await?;
        meta.expires = expires;
        self.write_meta(table, &meta).await
    }
}
