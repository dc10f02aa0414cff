// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agents, tags, and users.

use deskline_core::{Batch, DesklineError, Row};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::LiveAgentClient;
use crate::paginator::{into_rows, paginate};
use crate::query::PageQuery;
use crate::types::Agent;

/// Fetches the agent directory.
pub async fn fetch_agents(
    client: &LiveAgentClient,
    per_page: u32,
    max_pages: u32,
) -> Result<Vec<Agent>, DesklineError> {
    let records = paginate(client, "agents", &PageQuery::new(per_page), max_pages).await?;
    let agents = records
        .into_iter()
        .map(serde_json::from_value::<Agent>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DesklineError::Decode {
            message: format!("agents: {e}"),
            source: Some(Box::new(e)),
        })?;
    info!(agents = agents.len(), "agent directory fetched");
    Ok(agents)
}

/// id/name/email/status rows for loading the agent directory.
pub fn agents_batch(agents: &[Agent]) -> Batch {
    agents
        .iter()
        .map(|agent| {
            let mut row = Row::new();
            row.insert("id".into(), opt(&agent.id));
            row.insert("name".into(), opt(&agent.name));
            row.insert("email".into(), opt(&agent.email));
            row.insert("status".into(), opt(&agent.status));
            row
        })
        .collect()
}

fn opt(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

/// Fetches the whole tag catalog.
pub async fn fetch_tags(
    client: &LiveAgentClient,
    per_page: u32,
    max_pages: u32,
) -> Result<Batch, DesklineError> {
    let records = paginate(client, "tags", &PageQuery::new(per_page), max_pages).await?;
    let batch = Batch::from_rows(into_rows(records, "tags"));
    info!(rows = batch.len(), "tag catalog fetched");
    Ok(batch)
}

/// Fetches one user record via `users/{id}`.
pub async fn fetch_user(client: &LiveAgentClient, user_id: &str) -> Result<Row, DesklineError> {
    let body = client.get_json(&format!("users/{user_id}"), &[]).await?;
    let record = match body {
        Value::Object(mut map) if matches!(map.get("data"), Some(Value::Object(_))) => {
            map.remove("data").unwrap_or_default()
        }
        other => other,
    };
    match record {
        Value::Object(row) => {
            debug!(user_id, "user fetched");
            Ok(row)
        }
        other => Err(DesklineError::Decode {
            message: format!("users/{user_id}: expected an object, got {other}"),
            source: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::RateGate;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(uri: &str) -> LiveAgentClient {
        let gate = Arc::new(RateGate::new(2, Duration::from_millis(1)));
        LiveAgentClient::new("k", uri, Duration::from_secs(5), gate).unwrap()
    }

    #[tokio::test]
    async fn agents_respect_their_own_page_bound() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/agents"))
            .and(query_param("_perPage", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "A1", "name": "Alice", "email": "alice@example.com", "status": "A", "role": "O"}
            ])))
            .expect(2)
            .mount(&server)
            .await;

        let agents = fetch_agents(&client(&server.uri()), 5, 2).await.unwrap();
        assert_eq!(agents.len(), 2);

        let batch = agents_batch(&agents[..1]);
        assert_eq!(batch.columns(), ["id", "name", "email", "status"]);
        assert_eq!(batch.rows()[0]["name"], json!("Alice"));
    }

    #[tokio::test]
    async fn tags_are_fetched_wholesale() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tags"))
            .and(query_param("_page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "1", "name": "vip", "color": "ff0000"},
                {"id": "2", "name": "refund"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tags"))
            .and(query_param("_page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let batch = fetch_tags(&client(&server.uri()), 100, 10).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.rows()[1]["color"], Value::Null);
    }

    #[tokio::test]
    async fn user_is_fetched_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/U9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "U9", "name": "Bob"})))
            .expect(1)
            .mount(&server)
            .await;

        let user = fetch_user(&client(&server.uri()), "U9").await.unwrap();
        assert_eq!(user["name"], json!("Bob"));
    }

    #[tokio::test]
    async fn missing_user_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/nope"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetch_user(&client(&server.uri()), "nope").await.unwrap_err();
        assert!(matches!(err, DesklineError::Http { status: 404, .. }));
    }
}
