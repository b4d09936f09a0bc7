//! BoostTrade Mock API Library
//!
//! Mock API and network-simulation core for the BoostTrade campaign dashboard.
//!
//! Every dashboard screen talks to the backend through one dispatcher,
//! [`MockApiService::make_request`], which decides per request whether to call
//! the live backend or to answer from fixtures with simulated latency and
//! failures.
//!
//! # Features
//!
//! - **Routing modes**: global `live`/`mock`/`json`/`hybrid` policy, per-endpoint
//!   overrides and per-call forcing
//! - **Network simulation**: latency ranges, failure rates and named presets
//! - **Fixtures**: read-through cache over an asset server or a local
//!   directory, with a built-in fallback table
//! - **Role-aware responses**: login fixtures keyed by role, other fixtures
//!   keyed by API identifier
//! - **Control surface**: an axum router exposing every setting over HTTP
//!
//! # Quick Start
//!
//! ```no_run
//! use mock_api::{MockApiService, RequestOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> mock_api::Result<()> {
//!     let service = MockApiService::builder().build().await?;
//!
//!     let session = service
//!         .make_request(
//!             "auth/login",
//!             Some(json!({ "email": "campaign@boosttrade.com", "password": "x" })),
//!             RequestOptions::new(),
//!         )
//!         .await?;
//!
//!     assert_eq!(session["user"]["role"], "campaign_manager");
//!     Ok(())
//! }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use boosttrade_shared::ErrorResponse;
use thiserror::Error;
use tracing::error;

pub mod config;
pub mod fixtures;
pub mod handlers;
pub mod live;
pub mod models;
pub mod navigation;
pub mod network;
pub mod registry;
pub mod resolver;
pub mod responses;
pub mod service;
pub mod storage;

// Re-export commonly used types
pub use config::{Args, MockApiConfig};
pub use fixtures::{DirectoryFixtureSource, FixtureLoader, FixtureSource, HttpFixtureSource};
pub use models::{
    ApiMode, ApiModeInfo, DebugInfo, EndpointCategory, EndpointConfig, EndpointDefinition,
    EndpointOverride, HttpMethod, JsonDataset, NetworkConfig, NetworkConfigUpdate, RequestOptions,
    RouteMode,
};
pub use network::{NetworkPreset, NetworkSimulator};
pub use registry::EndpointRegistry;
pub use service::{MockApiService, MockApiServiceBuilder};
pub use storage::{FileSettingsStore, MemorySettingsStore, SettingsStore};

/// Mock API library errors
#[derive(Error, Debug)]
pub enum MockApiError {
    #[error("{0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Live API request failed: {message}")]
    LiveRequestFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("Mock endpoint {0} not found")]
    EndpointNotFound(String),

    #[error("Fixture not found: {0}")]
    FixtureNotFound(String),

    #[error("Fixture fetch failed: {0}")]
    FixtureFetch(String),

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Error carried by the fixture itself, displayed verbatim
    #[error("{0}")]
    Rejected(String),

    #[error("Unknown network preset: {0}")]
    UnknownPreset(String),

    #[error("Unknown API identifier: {0}")]
    UnknownIdentifier(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MockApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            MockApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            MockApiError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
            MockApiError::LiveRequestFailed { .. } => StatusCode::BAD_GATEWAY,
            MockApiError::FixtureFetch(_) => StatusCode::BAD_GATEWAY,
            MockApiError::EndpointNotFound(_) => StatusCode::NOT_FOUND,
            MockApiError::FixtureNotFound(_) => StatusCode::NOT_FOUND,
            MockApiError::Validation(_) => StatusCode::BAD_REQUEST,
            MockApiError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            MockApiError::UnknownPreset(_) => StatusCode::BAD_REQUEST,
            MockApiError::UnknownIdentifier(_) => StatusCode::BAD_REQUEST,
            MockApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MockApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MockApiError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MockApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            MockApiError::Timeout(_) => "timeout_error",
            MockApiError::Network(_) => "network_error",
            MockApiError::LiveRequestFailed { .. } => "live_request_failed",
            MockApiError::EndpointNotFound(_) => "endpoint_not_found",
            MockApiError::FixtureNotFound(_) => "fixture_not_found",
            MockApiError::FixtureFetch(_) => "fixture_fetch_error",
            MockApiError::Validation(_) => "validation_error",
            MockApiError::Rejected(_) => "request_rejected",
            MockApiError::UnknownPreset(_) => "unknown_preset",
            MockApiError::UnknownIdentifier(_) => "unknown_identifier",
            MockApiError::Storage(_) => "storage_error",
            MockApiError::Config(_) => "configuration_error",
            MockApiError::Serialization(_) => "serialization_error",
            MockApiError::Io(_) => "io_error",
        }
    }

    /// Upstream status carried by live failures
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            MockApiError::LiveRequestFailed { status, .. } => *status,
            _ => None,
        }
    }
}

impl IntoResponse for MockApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            error!(
                error = %self,
                status_code = %status_code,
                error_type = self.error_type(),
                "Mock API error"
            );
        }

        let body = ErrorResponse {
            error: self.error_type().to_string(),
            message: self.to_string(),
            status: self.upstream_status(),
            timestamp: chrono::Utc::now(),
        };

        (status_code, Json(body)).into_response()
    }
}

/// Result type alias for the mock API library
pub type Result<T> = std::result::Result<T, MockApiError>;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User agent sent on live calls
pub const USER_AGENT: &str = concat!("boosttrade-mock-api/", env!("CARGO_PKG_VERSION"));

/// Default live backend
pub const DEFAULT_LIVE_API_BASE_URL: &str = "https://api.boosttrade.com";

/// JSON dataset selected at startup
pub const DEFAULT_JSON_DATASET: &str = "default";

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ApiMode, EndpointConfig, EndpointRegistry, MockApiError, MockApiService, NetworkConfig,
        NetworkPreset, RequestOptions, Result, RouteMode,
    };
    pub use boosttrade_shared::{LoginCredentials, Role, Session, User};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            MockApiError::Timeout("Request timeout".to_string()).to_string(),
            "Request timeout"
        );
        assert_eq!(
            MockApiError::Network("Connection lost".to_string()).to_string(),
            "Network error: Connection lost"
        );
        assert_eq!(
            MockApiError::Rejected("Invalid credentials".to_string()).to_string(),
            "Invalid credentials"
        );
        assert_eq!(
            MockApiError::Validation(vec!["a".to_string(), "b".to_string()]).to_string(),
            "Validation failed: a; b"
        );
    }

    #[test]
    fn test_live_failure_carries_status() {
        let error = MockApiError::LiveRequestFailed {
            status: Some(503),
            message: "HTTP 503: Service Unavailable".to_string(),
        };

        assert_eq!(error.upstream_status(), Some(503));
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(error.error_type(), "live_request_failed");
        assert_eq!(
            error.to_string(),
            "Live API request failed: HTTP 503: Service Unavailable"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            MockApiError::EndpointNotFound("x".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            MockApiError::Timeout("x".to_string()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            MockApiError::UnknownPreset("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
