// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide request gate for the upstream API.
//!
//! The upstream allows 180 requests per minute per API key. [`RateGate`]
//! enforces that with two mechanisms shared by every caller in the process:
//! a counting permit bounding simultaneously in-flight requests, and a
//! throttle delay taken after a permit is granted and before the request is
//! issued. Issue times are additionally spaced by at least one throttle
//! interval, so two permit holders never fire in the same instant.

use std::sync::Arc;
use std::time::Duration;

use deskline_config::model::RateLimitConfig;
use deskline_core::DesklineError;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::trace;

/// Shared concurrency and spacing discipline for upstream requests.
#[derive(Debug)]
pub struct RateGate {
    permits: Arc<Semaphore>,
    throttle: Duration,
    next_slot: Mutex<Option<Instant>>,
}

/// Proof that a request may be in flight. Dropping it frees the slot.
#[derive(Debug)]
pub struct RatePermit {
    _permit: OwnedSemaphorePermit,
}

impl RateGate {
    pub fn new(max_in_flight: usize, throttle: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
            throttle,
            next_slot: Mutex::new(None),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.max_in_flight,
            Duration::from_millis(config.throttle_ms),
        )
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Waits for a free permit, then for the throttle delay, and returns the
    /// permit to hold for the duration of the request.
    pub async fn acquire(&self) -> Result<RatePermit, DesklineError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| DesklineError::Internal("rate gate closed".to_string()))?;

        let issue_at = {
            let mut next_slot = self.next_slot.lock().await;
            let earliest = Instant::now() + self.throttle;
            let at = match *next_slot {
                Some(slot) if slot > earliest => slot,
                _ => earliest,
            };
            *next_slot = Some(at + self.throttle);
            at
        };

        let wait = issue_at.saturating_duration_since(Instant::now());
        trace!(wait_ms = wait.as_millis() as u64, "rate gate wait");
        tokio::time::sleep_until(issue_at).await;

        Ok(RatePermit { _permit: permit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn first_request_waits_for_throttle() {
        let gate = RateGate::new(2, Duration::from_millis(400));
        let start = Instant::now();
        let _permit = gate.acquire().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn at_most_two_in_flight_and_issues_are_spaced() {
        let gate = Arc::new(RateGate::new(2, Duration::from_millis(400)));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let issued = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let gate = Arc::clone(&gate);
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            let issued = Arc::clone(&issued);
            handles.push(tokio::spawn(async move {
                let _permit = gate.acquire().await.unwrap();
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                issued.lock().await.push(Instant::now());
                tokio::time::sleep(Duration::from_millis(1500)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        let mut issued = issued.lock().await.clone();
        issued.sort();
        assert_eq!(issued.len(), 8);
        for pair in issued.windows(2) {
            assert!(
                pair[1] - pair[0] >= Duration::from_millis(400),
                "requests issued {:?} apart",
                pair[1] - pair[0]
            );
        }
        assert_eq!(gate.available(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_caller_is_spaced_by_throttle() {
        let gate = RateGate::new(2, Duration::from_millis(400));
        let start = Instant::now();
        for _ in 0..3 {
            drop(gate.acquire().await.unwrap());
        }
        assert!(start.elapsed() >= Duration::from_millis(1200));
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let gate = RateGate::new(0, Duration::ZERO);
        assert_eq!(gate.available(), 1);
    }
}
