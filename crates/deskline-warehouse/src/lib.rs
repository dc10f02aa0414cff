// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Warehouse side of deskline.
//!
//! Derives column schemas from row batches, loads batches idempotently
//! through any [`WarehouseAdapter`](deskline_core::WarehouseAdapter), and
//! ships a filesystem-backed adapter.

pub mod inference;
pub mod loader;
pub mod local;

pub use inference::infer_schema;
pub use loader::{LoadOutcome, WarehouseLoader};
pub use local::LocalWarehouse;
