// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON result of one operation, as handed to the caller.

use deskline_core::{DesklineError, Row};
use serde::Serialize;

/// Serializes to the list of records, or to `{"error": ..., "status": "error"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperationResult {
    Records(Vec<Row>),
    Failed(ErrorEnvelope),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub status: ErrorStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStatus {
    Error,
}

impl OperationResult {
    pub fn failed(error: impl Into<String>) -> Self {
        OperationResult::Failed(ErrorEnvelope {
            error: error.into(),
            status: ErrorStatus::Error,
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, OperationResult::Failed(_))
    }

    pub fn records(&self) -> Option<&[Row]> {
        match self {
            OperationResult::Records(rows) => Some(rows),
            OperationResult::Failed(_) => None,
        }
    }
}

impl From<Result<Vec<Row>, DesklineError>> for OperationResult {
    fn from(result: Result<Vec<Row>, DesklineError>) -> Self {
        match result {
            Ok(rows) => OperationResult::Records(rows),
            Err(e) => OperationResult::failed(e.to_string()),
        }
    }
}
