// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for deskline.
//!
//! Holds the error type, the uniform-column [`Batch`] model, warehouse schema
//! types, and the adapter traits implemented by warehouse backends.

pub mod batch;
pub mod error;
pub mod schema;
pub mod traits;
pub mod types;

pub use batch::{Batch, Row};
pub use error::DesklineError;
pub use schema::{FieldMode, FieldType, SchemaField, TableSchema};
pub use traits::{PluginAdapter, WarehouseAdapter};
pub use types::{
    AdapterType, DatasetInfo, HealthStatus, LoadJobConfig, LoadJobStats, TableInfo, TableRef,
    WriteDisposition,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deskline_error_helpers() {
        let missing = DesklineError::NotFound {
            kind: "table",
            name: "p.d.t".into(),
        };
        let exists = DesklineError::AlreadyExists {
            kind: "dataset",
            name: "p.d".into(),
        };
        assert!(missing.is_not_found());
        assert!(!missing.is_already_exists());
        assert!(exists.is_already_exists());
        assert_eq!(missing.to_string(), "table not found: p.d.t");
    }

    #[test]
    fn write_disposition_spellings() {
        assert_eq!(WriteDisposition::Replace.to_string(), "WRITE_TRUNCATE");
        assert_eq!(WriteDisposition::Append.as_job_str(), "WRITE_APPEND");

        let parsed: WriteDisposition = serde_json::from_str("\"append\"").unwrap();
        assert_eq!(parsed, WriteDisposition::Append);
        let aliased: WriteDisposition = serde_json::from_str("\"WRITE_TRUNCATE\"").unwrap();
        assert_eq!(aliased, WriteDisposition::Replace);
    }

    #[test]
    fn table_ref_formats_fully_qualified() {
        let t = TableRef::new("proj", "liveagent", "tickets");
        assert_eq!(t.to_string(), "proj.liveagent.tickets");
        assert_eq!(t.dataset_id(), "proj.liveagent");
    }

    #[test]
    fn load_job_config_autodetects_without_schema() {
        let cfg = LoadJobConfig::new(WriteDisposition::Append, None);
        assert!(cfg.autodetect);
        let cfg = LoadJobConfig::new(WriteDisposition::Append, Some(TableSchema::default()));
        assert!(!cfg.autodetect);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_warehouse_adapter<T: WarehouseAdapter>() {}
    }
}
