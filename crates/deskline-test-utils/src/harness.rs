// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end pipeline testing.
//!
//! `TestHarness` wires a [`Pipeline`] to a [`MockLiveAgent`] and a shared
//! [`MemoryWarehouse`], so tests can drive whole operations and then inspect
//! what landed in each table.

use std::sync::Arc;

use deskline_config::model::DesklineConfig;
use deskline_config::MessageFailurePolicy;
use deskline_core::{DesklineError, Row, TableRef};
use deskline_pipeline::Pipeline;

use crate::memory_warehouse::MemoryWarehouse;
use crate::mock_upstream::MockLiveAgent;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: DesklineConfig,
    warehouse: MemoryWarehouse,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = DesklineConfig::default();
        config.warehouse.project_id = "test-project".to_string();
        config.warehouse.dataset = "support".to_string();
        Self {
            config,
            warehouse: MemoryWarehouse::new(),
        }
    }

    pub fn with_failure_policy(mut self, policy: MessageFailurePolicy) -> Self {
        self.config.pipeline.message_failure_policy = policy;
        self
    }

    /// Use a pre-configured warehouse (seeded tables, expirations).
    pub fn with_warehouse(mut self, warehouse: MemoryWarehouse) -> Self {
        self.warehouse = warehouse;
        self
    }

    /// Arbitrary configuration tweaks.
    pub fn with_config(mut self, edit: impl FnOnce(&mut DesklineConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    /// Build the harness against `upstream`.
    pub fn build(self, upstream: &MockLiveAgent) -> Result<TestHarness, DesklineError> {
        let pipeline = Pipeline::new(
            upstream.upstream()?,
            Arc::new(self.warehouse.clone()),
            &self.config,
        )?;
        Ok(TestHarness {
            pipeline,
            warehouse: self.warehouse,
            config: self.config,
        })
    }
}

/// A pipeline over mock collaborators.
pub struct TestHarness {
    pub pipeline: Pipeline,
    /// Shares state with the warehouse the pipeline loads into.
    pub warehouse: MemoryWarehouse,
    pub config: DesklineConfig,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Qualifies a table name with the harness project and dataset.
    pub fn table(&self, name: &str) -> TableRef {
        self.config.warehouse.table_ref(name)
    }

    /// Rows currently stored in table `name`.
    pub async fn rows(&self, name: &str) -> Vec<Row> {
        self.warehouse.rows(&self.table(name)).await
    }
}
