// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sequential page walker for list endpoints.

use deskline_core::{DesklineError, Row};
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::LiveAgentClient;
use crate::query::PageQuery;

/// Fetches pages 1..=`max_pages` of `path` in order and concatenates their
/// records.
///
/// Stops at the first empty page. Reaching `max_pages` is a normal stop, not
/// an error. Any failed request aborts the walk.
pub async fn paginate(
    client: &LiveAgentClient,
    path: &str,
    query: &PageQuery,
    max_pages: u32,
) -> Result<Vec<Value>, DesklineError> {
    let mut records = Vec::new();

    for page in 1..=max_pages {
        let body = client.get_json(path, &query.params(page)).await?;
        let items = page_items(body, path)?;
        if items.is_empty() {
            debug!(path, page, total = records.len(), "empty page, pagination done");
            return Ok(records);
        }
        debug!(path, page, count = items.len(), "page fetched");
        records.extend(items);
    }

    debug!(path, max_pages, total = records.len(), "page bound reached");
    Ok(records)
}

/// Unwraps a `{data: [...]}` envelope, or takes a bare array as the list.
fn page_items(body: Value, path: &str) -> Result<Vec<Value>, DesklineError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(DesklineError::Decode {
                message: format!("{path}: `data` is not an array: {other}"),
                source: None,
            }),
        },
        other => Err(DesklineError::Decode {
            message: format!("{path}: expected a list, got {other}"),
            source: None,
        }),
    }
}

/// Keeps object records, logging and dropping anything else.
pub(crate) fn into_rows(records: Vec<Value>, resource: &str) -> Vec<Row> {
    records
        .into_iter()
        .filter_map(|record| match record {
            Value::Object(row) => Some(row),
            other => {
                warn!(resource, record = %other, "skipping non-object record");
                None
            }
        })
        .collect()
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

    fn test_client(base_url: &str) -> LiveAgentClient {
        let gate = Arc::new(RateGate::new(2, Duration::from_millis(1)));
        LiveAgentClient::new("k", base_url, Duration::from_secs(5), gate).unwrap()
    }

    async fn mount_page(server: &MockServer, page: u32, body: Value, times: u64) {
        Mock::given(method("GET"))
            .and(path("/tickets"))
            .and(query_param("_page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn stops_after_first_empty_page() {
        let server = MockServer::start().await;
        mount_page(&server, 1, json!([{"id": 1}, {"id": 2}]), 1).await;
        mount_page(&server, 2, json!([{"id": 3}, {"id": 4}]), 1).await;
        mount_page(&server, 3, json!([{"id": 5}, {"id": 6}]), 1).await;
        mount_page(&server, 4, json!([]), 1).await;
        mount_page(&server, 5, json!([{"id": 99}]), 0).await;

        let client = test_client(&server.uri());
        let records = paginate(&client, "tickets", &PageQuery::new(2), 100)
            .await
            .unwrap();

        let ids: Vec<i64> = records.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn max_pages_bounds_an_endless_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tickets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "x"}])))
            .expect(3)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let records = paginate(&client, "tickets", &PageQuery::new(1), 3)
            .await
            .unwrap();
        assert_eq!(records.len(), 3);
    }

    #[tokio::test]
    async fn data_envelope_is_unwrapped() {
        let server = MockServer::start().await;
        mount_page(&server, 1, json!({"data": [{"id": "a"}]}), 1).await;
        mount_page(&server, 2, json!({"data": []}), 1).await;

        let client = test_client(&server.uri());
        let records = paginate(&client, "tickets", &PageQuery::new(1), 10)
            .await
            .unwrap();
        assert_eq!(records, vec![json!({"id": "a"})]);
    }

    #[tokio::test]
    async fn empty_first_page_is_not_an_error() {
        let server = MockServer::start().await;
        mount_page(&server, 1, json!([]), 1).await;

        let client = test_client(&server.uri());
        let records = paginate(&client, "tickets", &PageQuery::new(10), 10)
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn failed_page_aborts_the_walk() {
        let server = MockServer::start().await;
        mount_page(&server, 1, json!([{"id": 1}]), 1).await;
        Mock::given(method("GET"))
            .and(path("/tickets"))
            .and(query_param("_page", "2"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        mount_page(&server, 3, json!([{"id": 3}]), 0).await;

        let client = test_client(&server.uri());
        let err = paginate(&client, "tickets", &PageQuery::new(1), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, DesklineError::Http { status: 500, .. }), "got {err:?}");
    }

    #[test]
    fn page_items_rejects_scalars() {
        assert!(page_items(json!(42), "tags").is_err());
        assert!(page_items(json!({"data": "nope"}), "tags").is_err());
        assert!(page_items(json!({"message": "ok"}), "tags").unwrap().is_empty());
    }

    #[test]
    fn into_rows_drops_non_objects() {
        let rows = into_rows(vec![json!({"id": 1}), json!("junk")], "tags");
        assert_eq!(rows.len(), 1);
    }
}
