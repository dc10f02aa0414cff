// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the LiveAgent v3 REST API.
//!
//! Provides [`LiveAgentClient`] which handles URL construction, the API-key
//! header, and status/JSON checking. Every request goes through the shared
//! [`RateGate`]; there is no retry at this layer.

use std::sync::Arc;
use std::time::Duration;

use deskline_core::DesklineError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{StatusCode, Url};
use serde_json::Value;
use tracing::debug;

use crate::gate::RateGate;

/// HTTP client for LiveAgent API communication.
#[derive(Debug, Clone)]
pub struct LiveAgentClient {
    http: reqwest::Client,
    base_url: String,
    gate: Arc<RateGate>,
}

impl LiveAgentClient {
    /// Creates a new client.
    ///
    /// # Arguments
    /// * `api_key` - value of the `apikey` header sent on every request
    /// * `base_url` - API root, e.g. `https://acme.ladesk.com/api/v3`
    /// * `timeout` - per-request timeout
    /// * `gate` - process-wide rate gate shared with every other client
    pub fn new(
        api_key: &str,
        base_url: &str,
        timeout: Duration,
        gate: Arc<RateGate>,
    ) -> Result<Self, DesklineError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key).map_err(|e| {
                DesklineError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| DesklineError::Connectivity {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            gate,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Reachability check: `GET {base}/ping` must answer 2xx.
    pub async fn ping(&self) -> Result<(), DesklineError> {
        let url = self.endpoint("ping");
        let _permit = self.gate.acquire().await?;

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| DesklineError::Connectivity {
                message: format!("ping to {url} failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(%url, "ping ok");
            Ok(())
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            Err(DesklineError::Http {
                status: status.as_u16(),
                url,
                body: response.text().await.unwrap_or_default(),
            })
        } else {
            Err(DesklineError::Connectivity {
                message: format!("ping to {url} returned {status}"),
                source: None,
            })
        }
    }

    /// Issues a GET and decodes the JSON body.
    ///
    /// A non-success status becomes [`DesklineError::Http`] carrying the body.
    pub async fn get_json(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Value, DesklineError> {
        let url = Url::parse_with_params(&self.endpoint(path), params)
            .map_err(|e| DesklineError::Config(format!("invalid request URL for {path}: {e}")))?;

        let _permit = self.gate.acquire().await?;

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DesklineError::Connectivity {
                message: format!("GET {url} failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(%url, status = %status, "response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DesklineError::Http {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| DesklineError::Connectivity {
                message: format!("failed to read response body from {url}: {e}"),
                source: Some(Box::new(e)),
            })?;

        serde_json::from_str(&body).map_err(|e| DesklineError::Decode {
            message: format!("{url}: {e}"),
            source: Some(Box::new(e)),
        })
    }
}
