// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the deskline extraction pipeline.

use thiserror::Error;

/// The primary error type used across all deskline crates.
#[derive(Debug, Error)]
pub enum DesklineError {
    /// Configuration errors (missing API key, invalid header values, bad offsets).
    #[error("configuration error: {0}")]
    Config(String),

    /// The upstream help-desk API could not be reached (ping failure, transport error).
    #[error("upstream unreachable: {message}")]
    Connectivity {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The upstream API answered with a non-success status.
    #[error("upstream returned {status} for {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    /// A response body was not valid JSON.
    #[error("failed to decode upstream response: {message}")]
    Decode {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A warehouse dataset or table does not exist.
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// A warehouse dataset or table already exists.
    #[error("{kind} already exists: {name}")]
    AlreadyExists { kind: &'static str, name: String },

    /// Warehouse backend errors (I/O, metadata corruption).
    #[error("warehouse error: {message}")]
    Warehouse {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A bulk load job was rejected.
    #[error("load into {table} failed: {message}")]
    Load { table: String, message: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DesklineError {
    /// True for "does not exist" answers from a warehouse lookup.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DesklineError::NotFound { .. })
    }

    /// True when a create call lost a race against an existing object.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, DesklineError::AlreadyExists { .. })
    }
}
