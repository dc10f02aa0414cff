// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Immutable list-request parameters.
//!
//! A [`PageQuery`] is built once per fetch and asked for the parameters of
//! each page, so concurrent fetches never share a mutable page counter.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Timestamp layout the upstream expects in filter values.
pub const FILTER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One `[field, operator, value]` filter triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Filter(pub String, pub String, pub String);

impl Filter {
    pub fn new(field: impl Into<String>, op: impl Into<String>, value: impl Into<String>) -> Self {
        Self(field.into(), op.into(), value.into())
    }
}

/// Page size plus optional filters for a list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    per_page: u32,
    filters: Vec<Filter>,
}

impl PageQuery {
    pub fn new(per_page: u32) -> Self {
        Self {
            per_page,
            filters: Vec::new(),
        }
    }

    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }

    /// Query-string parameters for the 1-based `page`.
    pub fn params(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("_page", page.to_string()),
            ("_perPage", self.per_page.to_string()),
        ];
        if !self.filters.is_empty() {
            // Serializing a Vec of string tuples cannot fail.
            let encoded = serde_json::to_string(&self.filters).unwrap_or_default();
            params.push(("_filters", encoded));
        }
        params
    }
}

/// Which tickets a ticket extraction covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketWindow {
    /// Tickets created between two dates, both days inclusive.
    Created { start: NaiveDate, end: NaiveDate },
    /// Tickets changed at or after a point in time.
    ChangedSince(NaiveDateTime),
}

impl TicketWindow {
    pub fn filters(&self) -> Vec<Filter> {
        match self {
            TicketWindow::Created { start, end } => vec![
                Filter::new("date_created", "D>=", format!("{} 00:00:00", start.format("%Y-%m-%d"))),
                Filter::new("date_created", "D<=", format!("{} 23:59:59", end.format("%Y-%m-%d"))),
            ],
            TicketWindow::ChangedSince(since) => vec![Filter::new(
                "date_changed",
                "D>=",
                since.format(FILTER_TIME_FORMAT).to_string(),
            )],
        }
    }
}
