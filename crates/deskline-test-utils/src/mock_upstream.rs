// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LiveAgent upstream backed by a wiremock server.
//!
//! Every listing fixture answers page 1 with the given items and every later
//! page with an empty array, so the paginator terminates after two requests.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use deskline_core::DesklineError;
use deskline_liveagent::{LiveAgent, LiveAgentClient, PageLimits, RateGate};

/// API key the mock expects on every request.
pub const MOCK_API_KEY: &str = "mock-api-key";

/// Builder around a running [`MockServer`].
pub struct MockLiveAgent {
    server: MockServer,
}

impl MockLiveAgent {
    /// Starts an empty mock server. Nothing is mounted, not even `/ping`.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to configure the upstream with.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    pub async fn with_ping(self) -> Self {
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&self.server)
            .await;
        self
    }

    pub async fn with_unreachable_ping(self) -> Self {
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&self.server)
            .await;
        self
    }

    pub async fn with_tickets(self, tickets: Vec<Value>) -> Self {
        self.mount_listing("/tickets", tickets).await;
        self
    }

    pub async fn with_agents(self, agents: Vec<Value>) -> Self {
        self.mount_listing("/agents", agents).await;
        self
    }

    pub async fn with_tags(self, tags: Vec<Value>) -> Self {
        self.mount_listing("/tags", tags).await;
        self
    }

    /// Message groups of one ticket.
    pub async fn with_messages(self, ticket_id: &str, groups: Vec<Value>) -> Self {
        self.mount_listing(&format!("/tickets/{ticket_id}/messages"), groups)
            .await;
        self
    }

    /// Makes one ticket's message thread answer `status`.
    pub async fn with_failing_messages(self, ticket_id: &str, status: u16) -> Self {
        Mock::given(method("GET"))
            .and(path(format!("/tickets/{ticket_id}/messages")))
            .respond_with(ResponseTemplate::new(status).set_body_string("upstream failure"))
            .mount(&self.server)
            .await;
        self
    }

    pub async fn with_user(self, user_id: &str, user: Value) -> Self {
        Mock::given(method("GET"))
            .and(path(format!("/users/{user_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(user))
            .mount(&self.server)
            .await;
        self
    }

    /// An upstream pointed at this server with a fast rate gate.
    pub fn upstream(&self) -> Result<LiveAgent, DesklineError> {
        let gate = Arc::new(RateGate::new(2, Duration::from_millis(1)));
        let client =
            LiveAgentClient::new(MOCK_API_KEY, &self.uri(), Duration::from_secs(5), gate)?;
        Ok(LiveAgent::from_client(
            client,
            PageLimits {
                per_page: 100,
                max_pages: 10,
                agents_per_page: 5,
                agents_max_pages: 5,
            },
        ))
    }

    /// Requests received so far for `route`.
    pub async fn request_count(&self, route: &str) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.iter().filter(|r| r.url.path() == route).count())
            .unwrap_or(0)
    }

    async fn mount_listing(&self, route: &str, items: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path(route.to_string()))
            .and(query_param("_page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(items)))
            .with_priority(1)
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(route.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .with_priority(10)
            .mount(&self.server)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listings_terminate_after_one_page() {
        let mock = MockLiveAgent::start()
            .await
            .with_ping()
            .await
            .with_tags(vec![json!({"id": "t1", "name": "vip"})])
            .await;
        let upstream = mock.upstream().unwrap();

        upstream.ping().await.unwrap();
        let tags = upstream.tags().await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(mock.request_count("/tags").await, 2);
    }

    #[tokio::test]
    async fn unreachable_ping_is_connectivity_error() {
        let mock = MockLiveAgent::start().await.with_unreachable_ping().await;
        let err = mock.upstream().unwrap().ping().await.unwrap_err();
        assert!(matches!(err, DesklineError::Connectivity { .. }));
    }
}
