//! Mock API Models
//!
//! Core data structures for the mock API service: routing modes, endpoint
//! metadata, simulated network characteristics and per-request options.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

/// Process-wide routing policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    /// Route every endpoint to the live backend
    Live,
    /// Resolve every endpoint from fixtures
    Mock,
    /// Resolve from the selected JSON dataset (routes like `Mock`)
    Json,
    /// Honour per-endpoint overrides and defaults
    Hybrid,
}

impl ApiMode {
    pub const ALL: [ApiMode; 4] = [ApiMode::Live, ApiMode::Mock, ApiMode::Json, ApiMode::Hybrid];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMode::Live => "live",
            ApiMode::Mock => "mock",
            ApiMode::Json => "json",
            ApiMode::Hybrid => "hybrid",
        }
    }

    /// Display name and description shown by the mode selector
    pub fn info(&self) -> ApiModeInfo {
        let (name, description) = match self {
            ApiMode::Live => ("Live API", "Connect to real backend services"),
            ApiMode::Mock => ("Mock API", "Use predefined mock responses"),
            ApiMode::Json => ("JSON Dataset", "Load responses from JSON datasets"),
            ApiMode::Hybrid => ("Hybrid Mode", "Mix of live and mock per endpoint"),
        };
        ApiModeInfo {
            id: *self,
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

impl Default for ApiMode {
    fn default() -> Self {
        ApiMode::Mock
    }
}

impl fmt::Display for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "live" => Ok(ApiMode::Live),
            "mock" => Ok(ApiMode::Mock),
            "json" | "json_dataset" => Ok(ApiMode::Json),
            "hybrid" => Ok(ApiMode::Hybrid),
            _ => Err(format!("Invalid API mode: {}", s)),
        }
    }
}

/// Effective routing for a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    Live,
    Mock,
}

impl RouteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteMode::Live => "live",
            RouteMode::Mock => "mock",
        }
    }
}

impl fmt::Display for RouteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "live" => Ok(RouteMode::Live),
            "mock" => Ok(RouteMode::Mock),
            _ => Err(format!("Invalid route mode: {}", s)),
        }
    }
}

/// HTTP verbs an endpoint accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// Whether a JSON payload is attached on live calls
    pub fn carries_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }

    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

impl Default for HttpMethod {
    fn default() -> Self {
        HttpMethod::Get
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Endpoint grouping used by the configuration screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointCategory {
    Auth,
    Campaigns,
    Users,
    Stores,
    Reports,
    Admin,
}

impl EndpointCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointCategory::Auth => "auth",
            EndpointCategory::Campaigns => "campaigns",
            EndpointCategory::Users => "users",
            EndpointCategory::Stores => "stores",
            EndpointCategory::Reports => "reports",
            EndpointCategory::Admin => "admin",
        }
    }
}

impl fmt::Display for EndpointCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auth" => Ok(EndpointCategory::Auth),
            "campaigns" => Ok(EndpointCategory::Campaigns),
            "users" => Ok(EndpointCategory::Users),
            "stores" => Ok(EndpointCategory::Stores),
            "reports" => Ok(EndpointCategory::Reports),
            "admin" => Ok(EndpointCategory::Admin),
            _ => Err(format!("Invalid endpoint category: {}", s)),
        }
    }
}

/// Simulated network characteristics applied to mock requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NetworkConfig {
    /// Lower bound of the sampled latency in milliseconds
    pub latency_min_ms: u64,

    /// Upper bound of the sampled latency in milliseconds
    pub latency_max_ms: u64,

    /// Timeout in milliseconds, applied to live calls
    pub timeout_ms: u64,

    /// Probability in `[0, 1]` that a mock request fails spontaneously
    #[validate(range(min = 0.0, max = 1.0))]
    pub failure_rate: f64,

    /// Floor applied to the delay of requests flagged as slow
    pub slow_response_threshold_ms: u64,
}

impl NetworkConfig {
    pub fn latency_range(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.latency_min_ms),
            Duration::from_millis(self.latency_max_ms),
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn slow_response_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_response_threshold_ms)
    }

    /// Merge the fields present in `update`, leaving the rest untouched
    pub fn merge(&mut self, update: &NetworkConfigUpdate) {
        if let Some(min) = update.latency_min_ms {
            self.latency_min_ms = min;
        }
        if let Some(max) = update.latency_max_ms {
            self.latency_max_ms = max;
        }
        if let Some(timeout) = update.timeout_ms {
            self.timeout_ms = timeout;
        }
        if let Some(rate) = update.failure_rate {
            self.failure_rate = rate;
        }
        if let Some(threshold) = update.slow_response_threshold_ms {
            self.slow_response_threshold_ms = threshold;
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            latency_min_ms: 200,
            latency_max_ms: 700,
            timeout_ms: 30_000,
            failure_rate: 0.01,
            slow_response_threshold_ms: 2_000,
        }
    }
}

/// Partial network configuration; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfigUpdate {
    #[serde(default)]
    pub latency_min_ms: Option<u64>,
    #[serde(default)]
    pub latency_max_ms: Option<u64>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub failure_rate: Option<f64>,
    #[serde(default)]
    pub slow_response_threshold_ms: Option<u64>,
}

/// Static metadata for one logical endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Logical endpoint id, e.g. `campaigns/list`
    pub endpoint: String,

    /// Display name
    pub name: String,

    pub description: String,

    /// Routing used in hybrid mode when no override is active
    pub default_mode: RouteMode,

    /// Fixture file consulted in mock mode
    pub fixture_file: Option<String>,

    /// Base URL replacing the global live base URL for this endpoint
    pub live_api_url: Option<String>,

    /// Extra headers sent on live calls
    pub headers: BTreeMap<String, String>,

    pub category: EndpointCategory,

    pub methods: Vec<HttpMethod>,

    pub requires_auth: bool,

    /// Permissions any of which grants access
    pub permissions: Vec<String>,
}

/// Endpoint entry as written in a registry file, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDefinition {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_mode: String,
    #[serde(default)]
    pub fixture_file: Option<String>,
    #[serde(default)]
    pub live_api_url: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub category: EndpointCategory,
    #[serde(default)]
    pub methods: Vec<HttpMethod>,
    #[serde(default)]
    pub requires_auth: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl From<&EndpointConfig> for EndpointDefinition {
    fn from(config: &EndpointConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            name: config.name.clone(),
            description: config.description.clone(),
            default_mode: config.default_mode.to_string(),
            fixture_file: config.fixture_file.clone(),
            live_api_url: config.live_api_url.clone(),
            headers: config.headers.clone(),
            category: config.category,
            methods: config.methods.clone(),
            requires_auth: config.requires_auth,
            permissions: config.permissions.clone(),
        }
    }
}

/// Runtime routing exception for a single endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointOverride {
    pub endpoint: String,
    pub mode: RouteMode,
    #[serde(default)]
    pub fixture_file: Option<String>,
}

/// Per-call options for `make_request`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// Fixed delay in milliseconds instead of a sampled one
    pub delay_ms: Option<u64>,

    /// Surface the fixture's `error` entry instead of its success payload
    pub should_fail: bool,

    /// Returned verbatim, bypassing fixture resolution
    pub custom_response: Option<Value>,

    /// Fail immediately with a timeout
    pub simulate_timeout: bool,

    /// Raise the delay to at least the slow-response threshold
    pub simulate_slow_response: bool,

    /// Verb for live calls, `GET` when absent
    pub method: Option<HttpMethod>,

    /// Routing for this call only
    pub force_mode: Option<RouteMode>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_force_mode(mut self, mode: RouteMode) -> Self {
        self.force_mode = Some(mode);
        self
    }

    pub fn with_custom_response(mut self, response: Value) -> Self {
        self.custom_response = Some(response);
        self
    }

    pub fn failing(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn timing_out(mut self) -> Self {
        self.simulate_timeout = true;
        self
    }

    pub fn slow(mut self) -> Self {
        self.simulate_slow_response = true;
        self
    }
}

/// Selectable JSON dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonDataset {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Mode catalogue entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiModeInfo {
    pub id: ApiMode,
    pub name: String,
    pub description: String,
}

/// Snapshot of the service state for diagnostics screens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugInfo {
    pub global_api_mode: ApiMode,
    pub selected_json_dataset: String,
    pub network_config: NetworkConfig,
    pub live_api_base_url: String,
    pub endpoint_overrides: BTreeMap<String, EndpointOverride>,
    pub inline_endpoints: Vec<String>,
    pub fixture_cache_size: usize,
    pub configured_endpoints: usize,
    pub api_identifier: String,
}
