// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extract-and-load operations.
//!
//! Every operation is strictly sequential: ping, fetch, shape, infer, load.
//! Independent operations may run concurrently on one [`Pipeline`]; they all
//! share the upstream's rate gate. Per-ticket fetches inside an operation fan
//! out concurrently and are only combined once every one of them has settled.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::Local;
use deskline_config::model::{PipelineConfig, WarehouseConfig};
use deskline_config::{DesklineConfig, MessageFailurePolicy};
use deskline_core::{Batch, DesklineError, Row, WarehouseAdapter, WriteDisposition};
use deskline_liveagent::directory::agents_batch;
use deskline_liveagent::{AgentLookup, LiveAgent, MessageGroup, RateGate, TicketWindow};
use deskline_warehouse::{LocalWarehouse, WarehouseLoader, infer_schema};
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, error, info, warn};

use crate::crossref::{TicketContext, message_rows};
use crate::envelope::OperationResult;
use crate::transform::{
    EXTRACTED_COLUMN, Localizer, MESSAGE_TIME_COLUMNS, TICKET_TIME_COLUMNS,
    USER_EXTRACTED_COLUMN, normalize_custom_fields, prune_columns, stamp_extracted,
};

/// One extract-and-load run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Tags,
    Agents,
    Tickets(TicketWindow),
    Messages(TicketWindow),
    Users(TicketWindow),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Tags => "tags",
            Operation::Agents => "agents",
            Operation::Tickets(_) => "tickets",
            Operation::Messages(_) => "messages",
            Operation::Users(_) => "users",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Composes the upstream, the batch transforms, and the warehouse loader.
#[derive(Debug, Clone)]
pub struct Pipeline {
    upstream: LiveAgent,
    loader: WarehouseLoader,
    warehouse: WarehouseConfig,
    settings: PipelineConfig,
    localizer: Localizer,
}

impl Pipeline {
    pub fn new(
        upstream: LiveAgent,
        warehouse: Arc<dyn WarehouseAdapter>,
        config: &DesklineConfig,
    ) -> Result<Self, DesklineError> {
        let localizer = Localizer::from_offset_str(&config.pipeline.timezone_offset)?;
        Ok(Self {
            upstream,
            loader: WarehouseLoader::new(warehouse, config.warehouse.location.clone()),
            warehouse: config.warehouse.clone(),
            settings: config.pipeline.clone(),
            localizer,
        })
    }

    /// Builds the process-wide rate gate, the upstream client, and the local
    /// warehouse from configuration.
    pub fn from_config(config: &DesklineConfig) -> Result<Self, DesklineError> {
        let gate = Arc::new(RateGate::from_config(&config.rate_limit));
        let upstream = LiveAgent::new(&config.liveagent, gate)?;
        let warehouse = LocalWarehouse::from_config(&config.warehouse);
        info!(root = %config.warehouse.root, "local warehouse initialized");
        Self::new(upstream, Arc::new(warehouse), config)
    }

    /// Overrides the page bound of ticket and message listings.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.upstream = self.upstream.with_max_pages(max_pages);
        self
    }

    /// Runs `operation` and wraps the outcome for the caller.
    pub async fn run(&self, operation: &Operation) -> OperationResult {
        info!(operation = %operation, "operation started");
        let result = match operation {
            Operation::Tags => self.update_tags().await,
            Operation::Agents => self.update_agents().await,
            Operation::Tickets(window) => self.update_tickets(window).await,
            Operation::Messages(window) => self.update_ticket_messages(window).await,
            Operation::Users(window) => self.update_users(window).await,
        };
        match &result {
            Ok(rows) => info!(operation = %operation, rows = rows.len(), "operation finished"),
            Err(e) => error!(operation = %operation, error = %e, "operation failed"),
        }
        result.into()
    }

    /// Replaces the tag catalog.
    pub async fn update_tags(&self) -> Result<Vec<Row>, DesklineError> {
        self.upstream.ping().await?;
        let batch = self.upstream.tags().await?;
        self.load(batch, &self.warehouse.tags_table, self.settings.tags_disposition)
            .await
    }

    /// Replaces the agent directory.
    pub async fn update_agents(&self) -> Result<Vec<Row>, DesklineError> {
        self.upstream.ping().await?;
        let agents = self.upstream.agents().await?;
        let batch = agents_batch(&agents);
        self.load(batch, &self.warehouse.agents_table, self.settings.agents_disposition)
            .await
    }

    /// Loads a snapshot of the tickets in `window`.
    pub async fn update_tickets(&self, window: &TicketWindow) -> Result<Vec<Row>, DesklineError> {
        self.upstream.ping().await?;
        let mut batch = self.upstream.tickets(window).await?;

        normalize_custom_fields(&mut batch);
        self.localizer.normalize(&mut batch, &TICKET_TIME_COLUMNS);
        stamp_extracted(&mut batch, EXTRACTED_COLUMN, Local::now().naive_local());

        self.load(batch, &self.warehouse.tickets_table, self.settings.tickets_disposition)
            .await
    }

    /// Loads one row per message of every ticket in `window`, with sender and
    /// receiver resolved against the agent directory.
    pub async fn update_ticket_messages(
        &self,
        window: &TicketWindow,
    ) -> Result<Vec<Row>, DesklineError> {
        self.upstream.ping().await?;
        let agents = AgentLookup::from_agents(&self.upstream.agents().await?);
        let tickets = self.ticket_contexts(window).await?;
        debug!(tickets = tickets.len(), agents = agents.len(), "fetching message threads");

        let threads = self.fetch_threads(&tickets).await?;
        let mut batch = Batch::new();
        for (idx, groups) in threads {
            for row in message_rows(&tickets[idx], &groups, &agents) {
                batch.push(row);
            }
        }

        self.localizer.normalize(&mut batch, &MESSAGE_TIME_COLUMNS);
        prune_columns(&mut batch, &self.settings.message_drop_columns);

        self.load(batch, &self.warehouse.messages_table, self.settings.messages_disposition)
            .await
    }

    /// Loads the profiles of every user who started a message group on a
    /// ticket in `window`.
    pub async fn update_users(&self, window: &TicketWindow) -> Result<Vec<Row>, DesklineError> {
        self.upstream.ping().await?;
        let tickets = self.ticket_contexts(window).await?;
        let threads = self.fetch_threads(&tickets).await?;

        let user_ids: Vec<String> = threads
            .iter()
            .flat_map(|(_, groups)| groups.iter().filter_map(|g| g.userid.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        debug!(users = user_ids.len(), "fetching user profiles");

        let mut tasks: FuturesUnordered<_> = user_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| async move { (idx, self.upstream.user(id).await) })
            .collect();
        let mut results = Vec::with_capacity(user_ids.len());
        while let Some(result) = tasks.next().await {
            results.push(result);
        }

        let profiles = self.settle("user", &user_ids, results)?;
        let mut batch = Batch::from_rows(profiles.into_iter().map(|(_, row)| row));
        stamp_extracted(&mut batch, USER_EXTRACTED_COLUMN, Local::now().naive_local());

        self.load(batch, &self.warehouse.users_table, self.settings.users_disposition)
            .await
    }

    async fn ticket_contexts(
        &self,
        window: &TicketWindow,
    ) -> Result<Vec<TicketContext>, DesklineError> {
        let batch = self.upstream.tickets(window).await?;
        let mut contexts = Vec::with_capacity(batch.len());
        for row in batch.rows() {
            match TicketContext::from_row(row) {
                Some(ctx) => contexts.push(ctx),
                None => warn!("skipping ticket without id"),
            }
        }
        Ok(contexts)
    }

    /// Fetches every ticket's message thread concurrently. Results come back
    /// in completion order, keyed by the ticket's index in `tickets`.
    async fn fetch_threads(
        &self,
        tickets: &[TicketContext],
    ) -> Result<Vec<(usize, Vec<MessageGroup>)>, DesklineError> {
        let mut tasks: FuturesUnordered<_> = tickets
            .iter()
            .enumerate()
            .map(|(idx, ticket)| async move {
                (idx, self.upstream.message_groups(&ticket.ticket_id).await)
            })
            .collect();

        let mut results = Vec::with_capacity(tickets.len());
        while let Some(result) = tasks.next().await {
            results.push(result);
        }

        let ids: Vec<String> = tickets.iter().map(|t| t.ticket_id.clone()).collect();
        self.settle("ticket", &ids, results)
    }

    /// Applies the failure policy once all fan-out tasks have settled.
    fn settle<T>(
        &self,
        resource: &'static str,
        ids: &[String],
        results: Vec<(usize, Result<T, DesklineError>)>,
    ) -> Result<Vec<(usize, T)>, DesklineError> {
        let mut settled = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (idx, result) in results {
            match result {
                Ok(value) => settled.push((idx, value)),
                Err(e) => failures.push((idx, e)),
            }
        }

        let id_of = |idx: usize| ids.get(idx).map(String::as_str).unwrap_or("?");
        match self.settings.message_failure_policy {
            MessageFailurePolicy::Abort => {
                for (idx, e) in &failures {
                    error!(resource, id = id_of(*idx), error = %e, "fetch failed");
                }
                match failures.into_iter().next() {
                    Some((_, first)) => Err(first),
                    None => Ok(settled),
                }
            }
            MessageFailurePolicy::Skip => {
                for (idx, e) in &failures {
                    warn!(resource, id = id_of(*idx), error = %e, "skipping after failed fetch");
                }
                Ok(settled)
            }
        }
    }

    /// Infers a schema, loads `batch` into `table`, and hands back its rows.
    /// An empty batch is still loaded: a replace leaves the table empty and an
    /// append adds nothing.
    async fn load(
        &self,
        batch: Batch,
        table: &str,
        disposition: WriteDisposition,
    ) -> Result<Vec<Row>, DesklineError> {
        let table = self.warehouse.table_ref(table);
        if batch.is_empty() {
            info!(table = %table, disposition = %disposition, "nothing extracted, loading empty batch");
        }

        // None for an empty batch; the load job then autodetects.
        let schema = infer_schema(&batch);
        self.loader
            .load(&batch, &table, disposition, schema)
            .await?
            .into_result()?;
        Ok(batch.into_rows())
    }
}
