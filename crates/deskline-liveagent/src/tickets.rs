// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket listing.

use deskline_core::{Batch, DesklineError, Row};
use serde_json::Value;
use tracing::info;

use crate::client::LiveAgentClient;
use crate::paginator::{into_rows, paginate};
use crate::query::{PageQuery, TicketWindow};

/// Fetches every ticket in `window`, one row per ticket.
///
/// All upstream fields are kept as delivered, `custom_fields` included. The
/// `tags` list is replaced by its comma-joined form.
pub async fn fetch_tickets(
    client: &LiveAgentClient,
    window: &TicketWindow,
    per_page: u32,
    max_pages: u32,
) -> Result<Batch, DesklineError> {
    let query = PageQuery::new(per_page).with_filters(window.filters());
    let records = paginate(client, "tickets", &query, max_pages).await?;

    let batch: Batch = into_rows(records, "tickets")
        .into_iter()
        .map(|mut row| {
            flatten_tags(&mut row);
            row
        })
        .collect();

    info!(rows = batch.len(), ?window, "tickets fetched");
    Ok(batch)
}

/// Replaces the row's `tags` with a comma-joined string, `""` when there are none.
pub fn flatten_tags(row: &mut Row) {
    let joined = join_tags(row.get("tags"));
    row.insert("tags".to_string(), Value::String(joined));
}

fn join_tags(tags: Option<&Value>) -> String {
    match tags {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
