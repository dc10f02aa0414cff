// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for deskline integration tests.
//!
//! Provides mock collaborators and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MemoryWarehouse`] - In-memory warehouse with call recording and fault injection
//! - [`MockLiveAgent`] - Wiremock-backed upstream with fixture builders
//! - [`TestHarness`] - Pipeline wired to both

pub mod harness;
pub mod memory_warehouse;
pub mod mock_upstream;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use memory_warehouse::{MemoryWarehouse, WarehouseCall};
pub use mock_upstream::{MOCK_API_KEY, MockLiveAgent};
