// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LiveAgent help-desk adapter for deskline.
//!
//! This crate wraps the LiveAgent v3 REST API: a process-wide [`RateGate`],
//! a sequential [`paginate`] walker, and one fetcher per resource (tickets,
//! per-ticket message threads, agents, tags, users). [`LiveAgent`] bundles
//! them with the configured page bounds.

pub mod client;
pub mod directory;
pub mod gate;
pub mod messages;
pub mod paginator;
pub mod query;
pub mod tickets;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deskline_config::model::LiveAgentConfig;
use deskline_core::error::DesklineError;
use deskline_core::traits::PluginAdapter;
use deskline_core::types::{AdapterType, HealthStatus};
use deskline_core::{Batch, Row};
use tracing::info;

pub use client::LiveAgentClient;
pub use gate::{RateGate, RatePermit};
pub use paginator::paginate;
pub use query::{Filter, PageQuery, TicketWindow};
pub use types::{Agent, AgentLookup, Message, MessageGroup};

/// Environment variable consulted when no key is configured.
pub const API_KEY_ENV: &str = "LIVEAGENT_API_KEY";

/// Page size and page-count bounds for each kind of listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub per_page: u32,
    pub max_pages: u32,
    pub agents_per_page: u32,
    pub agents_max_pages: u32,
}

impl From<&LiveAgentConfig> for PageLimits {
    fn from(config: &LiveAgentConfig) -> Self {
        Self {
            per_page: config.per_page,
            max_pages: config.max_pages,
            agents_per_page: config.agents_per_page,
            agents_max_pages: config.agents_max_pages,
        }
    }
}

/// LiveAgent upstream: the client plus page bounds.
///
/// API key resolution order: config -> `LIVEAGENT_API_KEY` env var -> error.
#[derive(Debug, Clone)]
pub struct LiveAgent {
    client: LiveAgentClient,
    limits: PageLimits,
}

impl LiveAgent {
    /// Builds the upstream from configuration, sharing `gate` with every
    /// other caller in the process.
    pub fn new(config: &LiveAgentConfig, gate: Arc<RateGate>) -> Result<Self, DesklineError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = LiveAgentClient::new(
            &api_key,
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
            gate,
        )?;

        info!(base_url = %config.base_url, "LiveAgent upstream initialized");

        Ok(Self::from_client(client, PageLimits::from(config)))
    }

    pub fn from_client(client: LiveAgentClient, limits: PageLimits) -> Self {
        Self { client, limits }
    }

    /// Overrides the page bound of ticket and message listings.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.limits.max_pages = max_pages.max(1);
        self
    }

    pub fn client(&self) -> &LiveAgentClient {
        &self.client
    }

    pub fn limits(&self) -> PageLimits {
        self.limits
    }

    pub async fn ping(&self) -> Result<(), DesklineError> {
        self.client.ping().await
    }

    pub async fn tickets(&self, window: &TicketWindow) -> Result<Batch, DesklineError> {
        tickets::fetch_tickets(
            &self.client,
            window,
            self.limits.per_page,
            self.limits.max_pages,
        )
        .await
    }

    pub async fn message_groups(&self, ticket_id: &str) -> Result<Vec<MessageGroup>, DesklineError> {
        messages::fetch_message_groups(
            &self.client,
            ticket_id,
            self.limits.per_page,
            self.limits.max_pages,
        )
        .await
    }

    pub async fn agents(&self) -> Result<Vec<Agent>, DesklineError> {
        directory::fetch_agents(
            &self.client,
            self.limits.agents_per_page,
            self.limits.agents_max_pages,
        )
        .await
    }

    pub async fn tags(&self) -> Result<Batch, DesklineError> {
        directory::fetch_tags(&self.client, self.limits.per_page, self.limits.max_pages).await
    }

    pub async fn user(&self, user_id: &str) -> Result<Row, DesklineError> {
        directory::fetch_user(&self.client, user_id).await
    }
}

#[async_trait]
impl PluginAdapter for LiveAgent {
    fn name(&self) -> &str {
        "liveagent"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Upstream
    }

    async fn health_check(&self) -> Result<HealthStatus, DesklineError> {
        Ok(match self.ping().await {
            Ok(()) => HealthStatus::Healthy,
            // Reachable, but this key is over its request budget.
            Err(DesklineError::Http { status: 429, .. }) => {
                HealthStatus::Degraded("upstream is rate limiting this API key (429)".to_string())
            }
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }
}

/// Resolves the API key from config, falling back to [`API_KEY_ENV`].
fn resolve_api_key(config_key: &Option<String>) -> Result<String, DesklineError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            DesklineError::Config(format!(
                "LiveAgent API key not found. Set liveagent.api_key in config or {API_KEY_ENV} environment variable."
            ))
        })
}
