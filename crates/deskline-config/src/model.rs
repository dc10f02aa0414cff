// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for deskline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use deskline_core::{TableRef, WriteDisposition};
use serde::{Deserialize, Serialize};

/// Top-level deskline configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DesklineConfig {
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Upstream help-desk API settings.
    #[serde(default)]
    pub liveagent: LiveAgentConfig,

    /// Shared request-rate discipline.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Destination warehouse settings.
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    /// Batch shaping and per-operation load policy.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Upstream help-desk API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LiveAgentConfig {
    /// API root, e.g. `https://acme.ladesk.com/api/v3`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key. `None` requires the `LIVEAGENT_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Page size for ticket and message listings.
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Safety bound on pages fetched per listing.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Page size for the agent directory.
    #[serde(default = "default_agents_per_page")]
    pub agents_per_page: u32,

    /// Page bound for the agent directory.
    #[serde(default = "default_agents_max_pages")]
    pub agents_max_pages: u32,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for LiveAgentConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            per_page: default_per_page(),
            max_pages: default_max_pages(),
            agents_per_page: default_agents_per_page(),
            agents_max_pages: default_agents_max_pages(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://example.ladesk.com/api/v3".to_string()
}

fn default_per_page() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    100
}

fn default_agents_per_page() -> u32 {
    5
}

fn default_agents_max_pages() -> u32 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Request-rate discipline shared by every upstream call in the process.
///
/// The defaults keep a single API key under the documented ceiling of
/// 180 requests per minute.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Maximum simultaneously in-flight requests.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Delay before each permitted request, in milliseconds.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            throttle_ms: default_throttle_ms(),
        }
    }
}

fn default_max_in_flight() -> usize {
    2
}

fn default_throttle_ms() -> u64 {
    400
}

/// Destination warehouse configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WarehouseConfig {
    #[serde(default = "default_project_id")]
    pub project_id: String,

    #[serde(default = "default_dataset")]
    pub dataset: String,

    /// Region used when the dataset has to be created.
    #[serde(default = "default_location")]
    pub location: String,

    /// Root directory of the local warehouse.
    #[serde(default = "default_warehouse_root")]
    pub root: String,

    /// Expiration stamped on newly created tables, mimicking a dataset
    /// default. The loader clears it after every successful load.
    #[serde(default)]
    pub default_table_expiration_days: Option<u32>,

    #[serde(default = "default_tags_table")]
    pub tags_table: String,

    #[serde(default = "default_tickets_table")]
    pub tickets_table: String,

    #[serde(default = "default_messages_table")]
    pub messages_table: String,

    #[serde(default = "default_agents_table")]
    pub agents_table: String,

    #[serde(default = "default_users_table")]
    pub users_table: String,
}

impl WarehouseConfig {
    /// Qualifies a table name with this warehouse's project and dataset.
    pub fn table_ref(&self, table: &str) -> TableRef {
        TableRef::new(&self.project_id, &self.dataset, table)
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            project_id: default_project_id(),
            dataset: default_dataset(),
            location: default_location(),
            root: default_warehouse_root(),
            default_table_expiration_days: None,
            tags_table: default_tags_table(),
            tickets_table: default_tickets_table(),
            messages_table: default_messages_table(),
            agents_table: default_agents_table(),
            users_table: default_users_table(),
        }
    }
}

fn default_project_id() -> String {
    "deskline".to_string()
}

fn default_dataset() -> String {
    "liveagent".to_string()
}

fn default_location() -> String {
    "asia-southeast1".to_string()
}

fn default_warehouse_root() -> String {
    dirs::data_dir()
        .map(|p| p.join("deskline").join("warehouse"))
        .unwrap_or_else(|| std::path::PathBuf::from("./warehouse"))
        .display()
        .to_string()
}

fn default_tags_table() -> String {
    "tags".to_string()
}

fn default_tickets_table() -> String {
    "tickets".to_string()
}

fn default_messages_table() -> String {
    "messages".to_string()
}

fn default_agents_table() -> String {
    "agents".to_string()
}

fn default_users_table() -> String {
    "users".to_string()
}

/// What to do when one ticket's message thread cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageFailurePolicy {
    /// Fail the whole operation; nothing is loaded.
    #[default]
    Abort,
    /// Log the ticket and continue without its messages.
    Skip,
}

/// Batch shaping and load policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// UTC offset upstream timestamps are shifted to, e.g. `+08:00`.
    #[serde(default = "default_timezone_offset")]
    pub timezone_offset: String,

    #[serde(default)]
    pub message_failure_policy: MessageFailurePolicy,

    /// Columns removed from message rows before loading.
    #[serde(default = "default_message_drop_columns")]
    pub message_drop_columns: Vec<String>,

    #[serde(default = "default_replace")]
    pub tags_disposition: WriteDisposition,

    #[serde(default = "default_replace")]
    pub agents_disposition: WriteDisposition,

    #[serde(default = "default_replace")]
    pub tickets_disposition: WriteDisposition,

    #[serde(default = "default_append")]
    pub messages_disposition: WriteDisposition,

    #[serde(default = "default_append")]
    pub users_disposition: WriteDisposition,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timezone_offset: default_timezone_offset(),
            message_failure_policy: MessageFailurePolicy::default(),
            message_drop_columns: default_message_drop_columns(),
            tags_disposition: default_replace(),
            agents_disposition: default_replace(),
            tickets_disposition: default_replace(),
            messages_disposition: default_append(),
            users_disposition: default_append(),
        }
    }
}

fn default_timezone_offset() -> String {
    "+08:00".to_string()
}

fn default_message_drop_columns() -> Vec<String> {
    vec![
        "message_id".to_string(),
        "type".to_string(),
        "agentid".to_string(),
    ]
}

fn default_replace() -> WriteDisposition {
    WriteDisposition::Replace
}

fn default_append() -> WriteDisposition {
    WriteDisposition::Append
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_rate_ceiling() {
        let config = DesklineConfig::default();
        assert_eq!(config.rate_limit.max_in_flight, 2);
        assert_eq!(config.rate_limit.throttle_ms, 400);
        assert_eq!(config.liveagent.per_page, 100);
        assert_eq!(config.warehouse.location, "asia-southeast1");
    }

    #[test]
    fn table_ref_uses_project_and_dataset() {
        let config = WarehouseConfig::default();
        let t = config.table_ref(&config.tickets_table);
        assert_eq!(t.to_string(), "deskline.liveagent.tickets");
    }

    #[test]
    fn failure_policy_parses_snake_case() {
        let config: PipelineConfig =
            toml::from_str("message_failure_policy = \"skip\"").unwrap();
        assert_eq!(config.message_failure_policy, MessageFailurePolicy::Skip);
        assert_eq!(config.messages_disposition, WriteDisposition::Append);
        assert_eq!(config.tickets_disposition, WriteDisposition::Replace);
    }
}
