//! API Handlers Module
//!
//! HTTP control surface for the mock API: the dispatcher, login, runtime
//! configuration, endpoint introspection, navigation checks and fixture serving.

use crate::config::MockApiConfig;
use crate::fixtures::{builtin_fixture, DirectoryFixtureSource, FixtureSource};
use crate::models::{
    ApiMode, ApiModeInfo, DebugInfo, EndpointCategory, EndpointConfig, EndpointOverride,
    JsonDataset, NetworkConfig, NetworkConfigUpdate, RequestOptions, RouteMode,
};
use crate::navigation::{self, NavSection};
use crate::network::NetworkPreset;
use crate::service::MockApiService;
use crate::{MockApiError, VERSION};

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use boosttrade_shared::{
    ApiResponse, HealthCheckResponse, HealthStatus, LoginCredentials, Session, User,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MockApiService>,
    pub config: Arc<MockApiConfig>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: Arc<MockApiService>, config: Arc<MockApiConfig>) -> Self {
        Self {
            service,
            config,
            started_at: Instant::now(),
        }
    }
}

type HandlerResult<T> = Result<Json<ApiResponse<T>>, MockApiError>;

/// Body of `POST /api/v1/requests`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub endpoint: String,
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub options: RequestOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeView {
    pub mode: ApiMode,
    pub available: Vec<ApiModeInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeUpdate {
    pub mode: ApiMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveUrlBody {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierView {
    pub identifier: String,
    pub available: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierUpdate {
    pub identifier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetView {
    pub dataset: String,
    pub available: Vec<JsonDataset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetUpdate {
    pub dataset: String,
}

/// Body of `PUT /api/v1/overrides/*endpoint`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideUpdate {
    pub mode: RouteMode,
    #[serde(default)]
    pub fixture_file: Option<String>,
}

/// Registry filters; all given filters must match
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointQuery {
    pub category: Option<EndpointCategory>,
    pub mode: Option<RouteMode>,
    pub permission: Option<String>,
}

/// Body of `POST /api/v1/navigation/access`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteAccessQuery {
    #[serde(default)]
    pub user: Option<User>,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteAccessView {
    pub path: String,
    pub allowed: bool,
}

/// Create the main router with all API routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Dispatcher
        .route("/api/v1/requests", post(dispatch_request))
        .route("/api/v1/auth/login", post(login))
        // Runtime configuration
        .route("/api/v1/config/mode", get(get_mode).put(set_mode))
        .route(
            "/api/v1/config/network",
            get(get_network_config).patch(update_network_config),
        )
        .route(
            "/api/v1/config/network/presets/:preset",
            post(apply_network_preset),
        )
        .route(
            "/api/v1/config/live-url",
            get(get_live_url).put(set_live_url),
        )
        .route(
            "/api/v1/config/identifier",
            get(get_identifier).put(set_identifier),
        )
        .route(
            "/api/v1/config/dataset",
            get(get_dataset).put(set_dataset),
        )
        // Endpoint registry and overrides
        .route("/api/v1/endpoints", get(list_endpoints))
        .route("/api/v1/endpoints/categories", get(list_categories))
        .route("/api/v1/overrides/*endpoint", put(set_endpoint_override))
        .route("/api/v1/overrides", delete(reset_overrides))
        // Navigation
        .route("/api/v1/navigation", post(navigation_for_user))
        .route("/api/v1/navigation/access", post(check_route_access))
        // Fixtures and diagnostics
        .route("/api/v1/fixtures/cache", delete(clear_fixture_cache))
        .route("/api/v1/debug", get(debug_info))
        .route("/mock/responses/:name", get(serve_fixture))
        // System routes
        .route("/health", get(health_check))
        .with_state(state)
}

/// Run the dispatcher and return its JSON verbatim
pub async fn dispatch_request(
    State(state): State<AppState>,
    Json(request): Json<DispatchRequest>,
) -> Result<Json<Value>, MockApiError> {
    debug!("Dispatching {} over HTTP", request.endpoint);

    let response = state
        .service
        .make_request(&request.endpoint, request.payload, request.options)
        .await?;
    Ok(Json(response))
}

pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<LoginCredentials>,
) -> HandlerResult<Session> {
    let session = state.service.login(&credentials).await?;
    Ok(Json(ApiResponse::success(session)))
}

pub async fn get_mode(State(state): State<AppState>) -> HandlerResult<ModeView> {
    Ok(Json(ApiResponse::success(ModeView {
        mode: state.service.global_api_mode(),
        available: state.service.available_api_modes(),
    })))
}

pub async fn set_mode(
    State(state): State<AppState>,
    Json(update): Json<ModeUpdate>,
) -> HandlerResult<ApiMode> {
    state.service.set_global_api_mode(update.mode);
    Ok(Json(ApiResponse::success(update.mode)))
}

pub async fn get_network_config(State(state): State<AppState>) -> HandlerResult<NetworkConfig> {
    Ok(Json(ApiResponse::success(state.service.network_config())))
}

pub async fn update_network_config(
    State(state): State<AppState>,
    Json(update): Json<NetworkConfigUpdate>,
) -> HandlerResult<NetworkConfig> {
    let config = state.service.set_network_config(update)?;
    Ok(Json(ApiResponse::success(config)))
}

pub async fn apply_network_preset(
    State(state): State<AppState>,
    Path(preset): Path<String>,
) -> HandlerResult<NetworkConfig> {
    let preset: NetworkPreset = preset.parse()?;
    Ok(Json(ApiResponse::success(state.service.apply_preset(preset))))
}

pub async fn get_live_url(State(state): State<AppState>) -> HandlerResult<LiveUrlBody> {
    Ok(Json(ApiResponse::success(LiveUrlBody {
        url: state.service.live_api_base_url(),
    })))
}

pub async fn set_live_url(
    State(state): State<AppState>,
    Json(body): Json<LiveUrlBody>,
) -> HandlerResult<LiveUrlBody> {
    state.service.set_live_api_base_url(&body.url)?;
    Ok(Json(ApiResponse::success(body)))
}

pub async fn get_identifier(State(state): State<AppState>) -> HandlerResult<IdentifierView> {
    Ok(Json(ApiResponse::success(IdentifierView {
        identifier: state.service.api_identifier(),
        available: state
            .service
            .available_identifiers()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })))
}

pub async fn set_identifier(
    State(state): State<AppState>,
    Json(update): Json<IdentifierUpdate>,
) -> HandlerResult<String> {
    state.service.set_api_identifier(&update.identifier).await?;
    Ok(Json(ApiResponse::success(update.identifier)))
}

pub async fn get_dataset(State(state): State<AppState>) -> HandlerResult<DatasetView> {
    Ok(Json(ApiResponse::success(DatasetView {
        dataset: state.service.selected_json_dataset(),
        available: state.service.available_json_datasets(),
    })))
}

pub async fn set_dataset(
    State(state): State<AppState>,
    Json(update): Json<DatasetUpdate>,
) -> HandlerResult<String> {
    state.service.set_json_dataset(&update.dataset)?;
    Ok(Json(ApiResponse::success(update.dataset)))
}

pub async fn list_endpoints(
    State(state): State<AppState>,
    Query(query): Query<EndpointQuery>,
) -> HandlerResult<Vec<EndpointConfig>> {
    let registry = state.service.registry();
    let endpoints = registry
        .all()
        .iter()
        .filter(|c| query.category.map_or(true, |category| c.category == category))
        .filter(|c| query.mode.map_or(true, |mode| c.default_mode == mode))
        .filter(|c| {
            query
                .permission
                .as_deref()
                .map_or(true, |permission| c.permissions.iter().any(|p| p == permission))
        })
        .cloned()
        .collect();

    Ok(Json(ApiResponse::success(endpoints)))
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> HandlerResult<Vec<EndpointCategory>> {
    Ok(Json(ApiResponse::success(
        state.service.registry().list_categories(),
    )))
}

pub async fn set_endpoint_override(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
    Json(update): Json<OverrideUpdate>,
) -> HandlerResult<EndpointOverride> {
    let endpoint = endpoint.trim_start_matches('/').to_string();
    state
        .service
        .set_endpoint_mode(&endpoint, update.mode, update.fixture_file.clone());

    Ok(Json(ApiResponse::success(EndpointOverride {
        endpoint,
        mode: update.mode,
        fixture_file: update.fixture_file,
    })))
}

pub async fn reset_overrides(
    State(state): State<AppState>,
) -> HandlerResult<BTreeMap<String, EndpointOverride>> {
    state.service.reset_endpoint_overrides();
    Ok(Json(ApiResponse::success(state.service.endpoint_overrides())))
}

/// Sidebar sections visible to the posted user
pub async fn navigation_for_user(Json(user): Json<User>) -> HandlerResult<Vec<NavSection>> {
    let sections = navigation::filter_navigation(
        user.role,
        &user.permissions,
        &navigation::default_navigation(),
    );
    Ok(Json(ApiResponse::success(sections)))
}

pub async fn check_route_access(
    Json(query): Json<RouteAccessQuery>,
) -> HandlerResult<RouteAccessView> {
    let allowed = navigation::can_access_route(query.user.as_ref(), &query.path);
    Ok(Json(ApiResponse::success(RouteAccessView {
        path: query.path,
        allowed,
    })))
}

pub async fn clear_fixture_cache(State(state): State<AppState>) -> HandlerResult<usize> {
    state.service.clear_cache();
    Ok(Json(ApiResponse::success(
        state.service.debug_info().fixture_cache_size,
    )))
}

pub async fn debug_info(State(state): State<AppState>) -> HandlerResult<DebugInfo> {
    Ok(Json(ApiResponse::success(state.service.debug_info())))
}

/// Serve a fixture file from the configured directory, else the built-in table
pub async fn serve_fixture(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, MockApiError> {
    if let Some(ref directory) = state.config.fixtures.directory {
        if let Some(fixture) = DirectoryFixtureSource::new(directory).fetch(&name).await? {
            return Ok(Json(fixture));
        }
    }

    builtin_fixture(&name)
        .map(Json)
        .ok_or(MockApiError::FixtureNotFound(name))
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: HealthStatus::Healthy,
        version: VERSION.to_string(),
        timestamp: chrono::Utc::now(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}
