// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `deskline doctor` command implementation.
//!
//! Runs diagnostic checks against the configured upstream and warehouse.

use std::sync::Arc;
use std::time::{Duration, Instant};

use deskline_config::DesklineConfig;
use deskline_core::{DesklineError, HealthStatus, PluginAdapter};
use deskline_liveagent::{LiveAgent, RateGate};
use deskline_warehouse::LocalWarehouse;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

/// Run the `deskline doctor` command. Returns `Ok(false)` if any check failed.
pub async fn run_doctor(config: &DesklineConfig) -> Result<bool, DesklineError> {
    let results = vec![
        check_upstream(config).await,
        check_warehouse(config).await,
    ];

    println!();
    println!("  deskline doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    for result in &results {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => {
                fail_count += 1;
                "[FAIL]"
            }
        };
        println!(
            "    {tag} {:<12} {} ({}ms)",
            result.name,
            result.message,
            result.duration.as_millis()
        );
    }
    println!();

    Ok(fail_count == 0)
}

fn from_health(name: &str, health: Result<HealthStatus, DesklineError>, started: Instant) -> CheckResult {
    let (status, message) = match health {
        Ok(HealthStatus::Healthy) => (CheckStatus::Pass, "healthy".to_string()),
        Ok(HealthStatus::Degraded(msg)) => (CheckStatus::Warn, msg),
        Ok(HealthStatus::Unhealthy(msg)) => (CheckStatus::Fail, msg),
        Err(e) => (CheckStatus::Fail, e.to_string()),
    };
    CheckResult {
        name: name.to_string(),
        status,
        message,
        duration: started.elapsed(),
    }
}

async fn check_upstream(config: &DesklineConfig) -> CheckResult {
    let started = Instant::now();
    let gate = Arc::new(RateGate::from_config(&config.rate_limit));
    let health = match LiveAgent::new(&config.liveagent, gate) {
        Ok(upstream) => upstream.health_check().await,
        Err(e) => Err(e),
    };
    from_health("upstream", health, started)
}

async fn check_warehouse(config: &DesklineConfig) -> CheckResult {
    let started = Instant::now();
    let warehouse = LocalWarehouse::from_config(&config.warehouse);
    from_health("warehouse", warehouse.health_check().await, started)
}
