// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-ticket message threads.

use deskline_core::DesklineError;
use tracing::debug;

use crate::client::LiveAgentClient;
use crate::paginator::paginate;
use crate::query::PageQuery;
use crate::types::MessageGroup;

/// Fetches all message groups of one ticket via `tickets/{id}/messages`.
pub async fn fetch_message_groups(
    client: &LiveAgentClient,
    ticket_id: &str,
    per_page: u32,
    max_pages: u32,
) -> Result<Vec<MessageGroup>, DesklineError> {
    let path = format!("tickets/{ticket_id}/messages");
    let records = paginate(client, &path, &PageQuery::new(per_page), max_pages).await?;

    let groups = records
        .into_iter()
        .map(serde_json::from_value::<MessageGroup>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DesklineError::Decode {
            message: format!("message groups of ticket {ticket_id}: {e}"),
            source: Some(Box::new(e)),
        })?;

    debug!(
        ticket_id,
        groups = groups.len(),
        messages = groups.iter().map(|g| g.messages.len()).sum::<usize>(),
        "ticket messages fetched"
    );
    Ok(groups)
}
