//! Live backend client
//!
//! Forwards requests routed to `live` mode to the real backend and maps
//! transport and HTTP failures onto `MockApiError::LiveRequestFailed`.

use crate::models::{EndpointConfig, HttpMethod};
use crate::{MockApiError, Result};

use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error};

/// One outgoing live call, fully resolved
#[derive(Debug, Clone, PartialEq)]
pub struct LiveRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub timeout: Duration,
}

impl LiveRequest {
    /// Build the call for `endpoint`.
    ///
    /// The endpoint's own `live_api_url` replaces `base_url` when set. The
    /// JSON content type is always sent; endpoint headers are layered on top.
    /// A body is attached only for verbs that carry one and a non-null payload.
    pub fn for_endpoint(
        base_url: &str,
        endpoint: &str,
        config: Option<&EndpointConfig>,
        method: Option<HttpMethod>,
        payload: Option<Value>,
        timeout: Duration,
    ) -> Self {
        let base = config
            .and_then(|c| c.live_api_url.as_deref())
            .unwrap_or(base_url);
        let url = format!(
            "{}/{}",
            base.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );

        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        if let Some(config) = config {
            for (name, value) in &config.headers {
                headers.insert(name.clone(), value.clone());
            }
        }

        let method = method.unwrap_or_default();
        let body = if method.carries_body() {
            payload.filter(|p| !p.is_null())
        } else {
            None
        };

        Self {
            url,
            method,
            headers,
            body,
            timeout,
        }
    }
}

/// HTTP client for live-mode requests
#[derive(Debug, Clone)]
pub struct LiveClient {
    client: Client,
}

impl LiveClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()
            .map_err(|e| MockApiError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Send the request and parse the JSON reply.
    ///
    /// An empty 2xx body yields `Value::Null`.
    pub async fn send(&self, request: LiveRequest) -> Result<Value> {
        debug!("Live {} {}", request.method, request.url);

        let mut builder = self
            .client
            .request(request.method.to_reqwest(), &request.url)
            .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            let message = if e.is_timeout() {
                format!("Request timed out after {}ms", request.timeout.as_millis())
            } else {
                e.to_string()
            };
            error!("Live request to {} failed: {}", request.url, message);
            MockApiError::LiveRequestFailed {
                status: None,
                message,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("Live request to {} returned {}", request.url, status);
            return Err(MockApiError::LiveRequestFailed {
                status: Some(status.as_u16()),
                message: format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown Status")
                ),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MockApiError::LiveRequestFailed {
                status: None,
                message: e.to_string(),
            })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| MockApiError::LiveRequestFailed {
            status: None,
            message: format!("Invalid JSON response: {}", e),
        })
    }
}
