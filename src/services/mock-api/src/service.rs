//! Mock API Service
//!
//! The dispatcher every dashboard screen calls, plus the runtime settings it
//! routes by: global mode, per-endpoint overrides, network simulation, live
//! base URL, JSON dataset and the persisted API identifier.

use crate::config::MockApiConfig;
use crate::fixtures::{DirectoryFixtureSource, FixtureLoader, FixtureSource, HttpFixtureSource};
use crate::live::{LiveClient, LiveRequest};
use crate::models::{
    ApiMode, ApiModeInfo, DebugInfo, EndpointConfig, EndpointOverride, HttpMethod, JsonDataset,
    NetworkConfig, NetworkConfigUpdate, RequestOptions, RouteMode,
};
use crate::network::{NetworkPreset, NetworkSimulator};
use crate::registry::EndpointRegistry;
use crate::resolver::resolve_mode;
use crate::responses;
use crate::storage::{
    self, FileSettingsStore, MemorySettingsStore, SettingsStore, API_IDENTIFIER_KEY,
    AVAILABLE_IDENTIFIERS, DEFAULT_IDENTIFIER,
};
use crate::{MockApiError, Result, DEFAULT_JSON_DATASET, DEFAULT_LIVE_API_BASE_URL};

use boosttrade_shared::{LoginCredentials, Session};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

/// Mutable runtime settings
#[derive(Debug, Clone)]
struct ServiceState {
    global_mode: ApiMode,
    network: NetworkConfig,
    live_base_url: String,
    json_dataset: String,
    api_identifier: String,
    overrides: BTreeMap<String, EndpointOverride>,
}

/// Settings a single request is dispatched with, captured before it suspends
#[derive(Debug, Clone)]
struct RequestSnapshot {
    global_mode: ApiMode,
    network: NetworkConfig,
    live_base_url: String,
    override_entry: Option<EndpointOverride>,
}

pub struct MockApiService {
    registry: EndpointRegistry,
    fixtures: FixtureLoader,
    simulator: NetworkSimulator,
    live: LiveClient,
    settings: Arc<dyn SettingsStore>,
    state: RwLock<ServiceState>,
}

/// Builder for [`MockApiService`]
#[derive(Default)]
pub struct MockApiServiceBuilder {
    registry: Option<EndpointRegistry>,
    fixture_source: Option<Arc<dyn FixtureSource>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    http_client: Option<reqwest::Client>,
    seed: Option<u64>,
    network_config: Option<NetworkConfig>,
    global_mode: Option<ApiMode>,
    live_base_url: Option<String>,
    json_dataset: Option<String>,
}

impl MockApiServiceBuilder {
    pub fn registry(mut self, registry: EndpointRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn fixture_source(mut self, source: Arc<dyn FixtureSource>) -> Self {
        self.fixture_source = Some(source);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// HTTP client used for live calls
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Seed the latency and failure sampler
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn network_config(mut self, config: NetworkConfig) -> Self {
        self.network_config = Some(config);
        self
    }

    pub fn global_mode(mut self, mode: ApiMode) -> Self {
        self.global_mode = Some(mode);
        self
    }

    pub fn live_base_url(mut self, url: impl Into<String>) -> Self {
        self.live_base_url = Some(url.into());
        self
    }

    pub fn json_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.json_dataset = Some(dataset.into());
        self
    }

    /// Build the service, reading the persisted API identifier once
    pub async fn build(self) -> Result<MockApiService> {
        let settings = self
            .settings_store
            .unwrap_or_else(|| Arc::new(MemorySettingsStore::new()));
        let api_identifier = load_identifier(settings.as_ref()).await;

        let live = match self.http_client {
            Some(client) => LiveClient::with_client(client),
            None => LiveClient::new()?,
        };

        let fixtures = match self.fixture_source {
            Some(source) => {
                info!("Loading fixtures from {}", source.describe());
                FixtureLoader::with_source(source)
            }
            None => FixtureLoader::builtin_only(),
        };

        let simulator = match self.seed {
            Some(seed) => NetworkSimulator::seeded(seed),
            None => NetworkSimulator::new(),
        };

        let state = ServiceState {
            global_mode: self.global_mode.unwrap_or_default(),
            network: self.network_config.unwrap_or_default(),
            live_base_url: self
                .live_base_url
                .unwrap_or_else(|| DEFAULT_LIVE_API_BASE_URL.to_string()),
            json_dataset: self
                .json_dataset
                .unwrap_or_else(|| DEFAULT_JSON_DATASET.to_string()),
            api_identifier,
            overrides: BTreeMap::new(),
        };

        Ok(MockApiService {
            registry: self.registry.unwrap_or_else(EndpointRegistry::builtin),
            fixtures,
            simulator,
            live,
            settings,
            state: RwLock::new(state),
        })
    }
}

async fn load_identifier(store: &dyn SettingsStore) -> String {
    match store.load(API_IDENTIFIER_KEY).await {
        Ok(Some(identifier)) if storage::is_known_identifier(&identifier) => identifier,
        Ok(Some(identifier)) => {
            warn!("Ignoring unknown persisted API identifier: {}", identifier);
            DEFAULT_IDENTIFIER.to_string()
        }
        Ok(None) => DEFAULT_IDENTIFIER.to_string(),
        Err(e) => {
            warn!("Failed to read persisted API identifier: {}", e);
            DEFAULT_IDENTIFIER.to_string()
        }
    }
}

impl MockApiService {
    pub fn builder() -> MockApiServiceBuilder {
        MockApiServiceBuilder::default()
    }

    /// Build a service from loaded configuration
    pub async fn from_config(config: &MockApiConfig) -> Result<Self> {
        let mut builder = Self::builder()
            .network_config(config.network.clone())
            .global_mode(config.api.global_mode)
            .live_base_url(config.api.live_base_url.clone())
            .json_dataset(config.api.json_dataset.clone());

        if let Some(ref path) = config.api.endpoints_file {
            let yaml = tokio::fs::read_to_string(path).await?;
            let registry = EndpointRegistry::from_yaml_str(&yaml)?;
            info!(
                "Loaded {} endpoints from {}",
                registry.len(),
                path.display()
            );
            builder = builder.registry(registry);
        }

        if let Some(ref directory) = config.fixtures.directory {
            builder = builder.fixture_source(Arc::new(DirectoryFixtureSource::new(directory)));
        } else if let Some(ref base_url) = config.fixtures.base_url {
            let client = reqwest::Client::builder()
                .user_agent(crate::USER_AGENT)
                .build()
                .map_err(|e| MockApiError::Config(format!("Failed to create HTTP client: {}", e)))?;
            builder = builder.fixture_source(Arc::new(HttpFixtureSource::with_client(
                client,
                base_url.clone(),
                config.fixtures.responses_path.clone(),
            )));
        }

        if let Some(ref path) = config.storage.settings_path {
            builder = builder.settings_store(Arc::new(FileSettingsStore::new(path)));
        }

        builder.build().await
    }

    // =========================================================================
    // Dispatcher
    // =========================================================================

    /// Dispatch one request to the live backend or to fixtures.
    ///
    /// Settings are captured before the first suspension point, so changes
    /// made while the request is in flight only affect later calls.
    pub async fn make_request(
        &self,
        endpoint: &str,
        payload: Option<Value>,
        options: RequestOptions,
    ) -> Result<Value> {
        if options.simulate_timeout {
            warn!(endpoint, "Simulated request timeout");
            return Err(MockApiError::Timeout("Request timeout".to_string()));
        }

        let config = self.registry.get(endpoint);
        let snapshot = self.snapshot(endpoint);
        let mode = snapshot.route(options.force_mode, config);

        debug!(
            endpoint,
            global_mode = %snapshot.global_mode,
            mode = %mode,
            "Dispatching request"
        );

        match mode {
            RouteMode::Live => {
                let request = LiveRequest::for_endpoint(
                    &snapshot.live_base_url,
                    endpoint,
                    config,
                    options.method,
                    payload,
                    snapshot.network.timeout(),
                );
                self.live.send(request).await
            }
            RouteMode::Mock => {
                self.mock_request(endpoint, config, snapshot, payload, options)
                    .await
            }
        }
    }

    async fn mock_request(
        &self,
        endpoint: &str,
        config: Option<&EndpointConfig>,
        snapshot: RequestSnapshot,
        payload: Option<Value>,
        options: RequestOptions,
    ) -> Result<Value> {
        let delay = self.simulator.request_delay(
            &snapshot.network,
            options.delay_ms,
            options.simulate_slow_response,
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if !options.should_fail && self.simulator.should_fail(&snapshot.network) {
            warn!(endpoint, "Simulated network failure");
            return Err(MockApiError::Network("Connection lost".to_string()));
        }

        if let Some(custom) = options.custom_response {
            return Ok(custom);
        }

        let data = self
            .resolve_mock_data(endpoint, config, snapshot.override_entry.as_ref())
            .await?;

        let data = match responses::criteria_for(endpoint, payload.as_ref()) {
            Some(criteria) => responses::select_variant(&data, &criteria),
            None => data,
        };

        responses::finalize_response(data, options.should_fail)
    }

    /// Fixture data for an endpoint: the override's fixture file, else the
    /// configured one, else the inline response table
    async fn resolve_mock_data(
        &self,
        endpoint: &str,
        config: Option<&EndpointConfig>,
        override_entry: Option<&EndpointOverride>,
    ) -> Result<Value> {
        let fixture_file = override_entry
            .and_then(|o| o.fixture_file.clone())
            .or_else(|| config.and_then(|c| c.fixture_file.clone()));

        if let Some(file) = fixture_file {
            match self.fixtures.load(&file).await {
                Ok(data) => return Ok(data.as_ref().clone()),
                Err(e) => warn!(
                    endpoint,
                    fixture = %file,
                    error = %e,
                    "Fixture unavailable, using inline response"
                ),
            }
        }

        responses::inline_response(endpoint)
            .ok_or_else(|| MockApiError::EndpointNotFound(endpoint.to_string()))
    }

    fn snapshot(&self, endpoint: &str) -> RequestSnapshot {
        let state = self.state.read();
        RequestSnapshot {
            global_mode: state.global_mode,
            network: state.network.clone(),
            live_base_url: state.live_base_url.clone(),
            override_entry: state.overrides.get(endpoint).cloned(),
        }
    }

    /// Routing a request to `endpoint` would take right now
    pub fn route_for(&self, endpoint: &str, forced: Option<RouteMode>) -> RouteMode {
        self.snapshot(endpoint)
            .route(forced, self.registry.get(endpoint))
    }

    /// Log in through `auth/login` and decode the session
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Session> {
        let payload = serde_json::to_value(credentials)?;
        let response = self
            .make_request(
                "auth/login",
                Some(payload),
                RequestOptions::new().with_method(HttpMethod::Post),
            )
            .await?;

        Ok(serde_json::from_value(response)?)
    }

    /// Request a password reset, returning the confirmation message
    pub async fn forgot_password(&self, email: &str) -> Result<String> {
        let response = self
            .make_request(
                "auth/forgot-password",
                Some(serde_json::json!({ "email": email })),
                RequestOptions::new().with_method(HttpMethod::Post),
            )
            .await?;

        Ok(response
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| response.to_string()))
    }

    // =========================================================================
    // Routing modes
    // =========================================================================

    pub fn set_global_api_mode(&self, mode: ApiMode) {
        self.state.write().global_mode = mode;
        info!("Global API mode changed to: {}", mode);
    }

    pub fn global_api_mode(&self) -> ApiMode {
        self.state.read().global_mode
    }

    pub fn available_api_modes(&self) -> Vec<ApiModeInfo> {
        ApiMode::ALL.iter().map(ApiMode::info).collect()
    }

    /// Pin an endpoint to `mode` (honoured in hybrid mode), optionally with
    /// its own fixture file
    pub fn set_endpoint_mode(&self, endpoint: &str, mode: RouteMode, fixture_file: Option<String>) {
        info!(
            endpoint,
            mode = %mode,
            fixture_file = fixture_file.as_deref().unwrap_or("-"),
            "Endpoint mode changed"
        );
        self.state.write().overrides.insert(
            endpoint.to_string(),
            EndpointOverride {
                endpoint: endpoint.to_string(),
                mode,
                fixture_file,
            },
        );
    }

    /// Drop every override so endpoints fall back to their configured defaults
    pub fn reset_endpoint_overrides(&self) {
        let cleared = {
            let mut state = self.state.write();
            let count = state.overrides.len();
            state.overrides.clear();
            count
        };
        info!("Reset {} endpoint overrides", cleared);
    }

    pub fn endpoint_overrides(&self) -> BTreeMap<String, EndpointOverride> {
        self.state.read().overrides.clone()
    }

    /// Per-endpoint mode: override, else configured default, else the
    /// global mode collapsed to live or mock
    pub fn endpoint_mode(&self, endpoint: &str) -> RouteMode {
        let state = self.state.read();
        if let Some(entry) = state.overrides.get(endpoint) {
            return entry.mode;
        }
        if let Some(config) = self.registry.get(endpoint) {
            return config.default_mode;
        }
        match state.global_mode {
            ApiMode::Live => RouteMode::Live,
            _ => RouteMode::Mock,
        }
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn endpoint_configuration(&self, endpoint: &str) -> Option<EndpointConfig> {
        self.registry.get(endpoint).cloned()
    }

    pub fn all_endpoint_configurations(&self) -> Vec<EndpointConfig> {
        self.registry.all().to_vec()
    }

    // =========================================================================
    // Network simulation
    // =========================================================================

    /// Merge `update` into the network configuration
    pub fn set_network_config(&self, update: NetworkConfigUpdate) -> Result<NetworkConfig> {
        let mut state = self.state.write();
        let mut merged = state.network.clone();
        merged.merge(&update);
        merged
            .validate()
            .map_err(|e| MockApiError::Validation(vec![e.to_string()]))?;
        if merged.latency_min_ms > merged.latency_max_ms {
            return Err(MockApiError::Validation(vec![format!(
                "Network latency minimum ({}ms) exceeds maximum ({}ms)",
                merged.latency_min_ms, merged.latency_max_ms
            )]));
        }

        state.network = merged.clone();
        debug!(?merged, "Network configuration updated");
        Ok(merged)
    }

    pub fn network_config(&self) -> NetworkConfig {
        self.state.read().network.clone()
    }

    /// Replace latency, timeout and failure rate with a preset in one step
    pub fn apply_preset(&self, preset: NetworkPreset) -> NetworkConfig {
        let applied = {
            let mut state = self.state.write();
            state.network = preset.apply_to(&state.network);
            state.network.clone()
        };
        info!("Applied network preset: {}", preset);
        applied
    }

    // =========================================================================
    // Live backend, datasets, identifier
    // =========================================================================

    pub fn set_live_api_base_url(&self, url: &str) -> Result<()> {
        url::Url::parse(url).map_err(|e| {
            MockApiError::Validation(vec![format!("Invalid live API base URL {}: {}", url, e)])
        })?;
        self.state.write().live_base_url = url.to_string();
        info!("Live API base URL changed to: {}", url);
        Ok(())
    }

    pub fn live_api_base_url(&self) -> String {
        self.state.read().live_base_url.clone()
    }

    pub fn set_json_dataset(&self, dataset: &str) -> Result<()> {
        if !self.available_json_datasets().iter().any(|d| d.id == dataset) {
            return Err(MockApiError::Validation(vec![format!(
                "Unknown JSON dataset: {}",
                dataset
            )]));
        }
        self.state.write().json_dataset = dataset.to_string();
        info!("JSON dataset changed to: {}", dataset);
        Ok(())
    }

    pub fn selected_json_dataset(&self) -> String {
        self.state.read().json_dataset.clone()
    }

    pub fn available_json_datasets(&self) -> Vec<JsonDataset> {
        [
            ("default", "Default Dataset", "Standard mock responses"),
            ("testing", "Testing Dataset", "Data for testing scenarios"),
            (
                "performance",
                "Performance Dataset",
                "High volume data for performance testing",
            ),
        ]
        .into_iter()
        .map(|(id, name, description)| JsonDataset {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        })
        .collect()
    }

    /// Select and persist the API identifier
    pub async fn set_api_identifier(&self, identifier: &str) -> Result<()> {
        if !storage::is_known_identifier(identifier) {
            return Err(MockApiError::UnknownIdentifier(identifier.to_string()));
        }

        self.settings.save(API_IDENTIFIER_KEY, identifier).await?;
        self.state.write().api_identifier = identifier.to_string();
        info!("API identifier changed to: {}", identifier);
        Ok(())
    }

    pub fn api_identifier(&self) -> String {
        self.state.read().api_identifier.clone()
    }

    pub fn available_identifiers(&self) -> Vec<&'static str> {
        AVAILABLE_IDENTIFIERS.to_vec()
    }

    // =========================================================================
    // Fixtures and diagnostics
    // =========================================================================

    pub async fn load_fixture(&self, name: &str) -> Result<Arc<Value>> {
        self.fixtures.load(name).await
    }

    pub fn clear_cache(&self) {
        self.fixtures.clear();
    }

    pub fn debug_info(&self) -> DebugInfo {
        let state = self.state.read();
        DebugInfo {
            global_api_mode: state.global_mode,
            selected_json_dataset: state.json_dataset.clone(),
            network_config: state.network.clone(),
            live_api_base_url: state.live_base_url.clone(),
            endpoint_overrides: state.overrides.clone(),
            inline_endpoints: responses::INLINE_ENDPOINTS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            fixture_cache_size: self.fixtures.len(),
            configured_endpoints: self.registry.len(),
            api_identifier: state.api_identifier.clone(),
        }
    }
}

impl RequestSnapshot {
    fn route(&self, forced: Option<RouteMode>, config: Option<&EndpointConfig>) -> RouteMode {
        resolve_mode(
            forced,
            self.global_mode,
            self.override_entry.as_ref().map(|o| o.mode),
            config.map(|c| c.default_mode),
        )
    }
}

impl std::fmt::Debug for MockApiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockApiService")
            .field("registry", &self.registry.len())
            .field("fixtures", &self.fixtures)
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boosttrade_shared::Role;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::{Duration, Instant};

    fn instant_network() -> NetworkConfig {
        NetworkConfig {
            latency_min_ms: 0,
            latency_max_ms: 0,
            failure_rate: 0.0,
            ..Default::default()
        }
    }

    async fn test_service() -> MockApiService {
        MockApiService::builder()
            .network_config(instant_network())
            .seed(7)
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_presets_replace_network_config() {
        let service = test_service().await;

        for preset in NetworkPreset::ALL {
            let applied = service.apply_preset(preset);
            assert_eq!(service.network_config(), applied);
            assert_eq!(applied, preset.apply_to(&instant_network()));
        }
    }

    #[tokio::test]
    async fn test_partial_network_update() {
        let service = test_service().await;
        let updated = service
            .set_network_config(NetworkConfigUpdate {
                timeout_ms: Some(1_234),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(updated.timeout_ms, 1_234);
        assert_eq!(updated.failure_rate, 0.0);

        let rejected = service.set_network_config(NetworkConfigUpdate {
            failure_rate: Some(1.5),
            ..Default::default()
        });
        assert!(matches!(rejected, Err(MockApiError::Validation(_))));
        assert_eq!(service.network_config().failure_rate, 0.0);
    }

    #[tokio::test]
    async fn test_inverted_latency_range_rejected() {
        let service = test_service().await;

        let rejected = service.set_network_config(NetworkConfigUpdate {
            latency_min_ms: Some(5_000),
            latency_max_ms: Some(10),
            ..Default::default()
        });
        match rejected {
            Err(MockApiError::Validation(errors)) => {
                assert!(errors[0].contains("exceeds maximum"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(service.network_config(), instant_network());

        // raising only the minimum past the current maximum is rejected too
        assert!(service
            .set_network_config(NetworkConfigUpdate {
                latency_min_ms: Some(1),
                ..Default::default()
            })
            .is_err());
    }

    #[tokio::test]
    async fn test_in_flight_request_keeps_captured_network() {
        let service = Arc::new(test_service().await);

        let pending = tokio::spawn({
            let service = Arc::clone(&service);
            async move {
                service
                    .make_request("campaigns/list", None, RequestOptions::new().with_delay(200))
                    .await
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        service.apply_preset(NetworkPreset::Offline);

        let response = pending.await.unwrap().unwrap();
        assert_eq!(response["campaigns"][0]["id"], "file_camp_001");

        // later requests see the new settings
        assert!(matches!(
            service
                .make_request("campaigns/list", None, RequestOptions::new())
                .await,
            Err(MockApiError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_in_flight_request_keeps_captured_mode() {
        let service = Arc::new(test_service().await);

        let pending = tokio::spawn({
            let service = Arc::clone(&service);
            async move {
                service
                    .make_request("campaigns/list", None, RequestOptions::new().with_delay(200))
                    .await
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        service.set_global_api_mode(ApiMode::Live);
        service
            .set_live_api_base_url("http://127.0.0.1:9")
            .unwrap();

        let response = pending.await.unwrap().unwrap();
        assert_eq!(response["campaigns"][1]["id"], "file_camp_002");
        assert_eq!(service.route_for("campaigns/list", None), RouteMode::Live);
    }

    #[tokio::test]
    async fn test_offline_preset_fails_every_mock_request() {
        let service = test_service().await;
        service.apply_preset(NetworkPreset::Offline);

        for endpoint in ["campaigns/list", "reports/dashboard", "auth/login"] {
            let error = service
                .make_request(endpoint, None, RequestOptions::new())
                .await
                .unwrap_err();
            assert_eq!(error.to_string(), "Network error: Connection lost");
        }
    }

    #[tokio::test]
    async fn test_hybrid_override_and_force_precedence() {
        let service = test_service().await;
        service.set_global_api_mode(ApiMode::Hybrid);

        assert_eq!(service.route_for("campaigns/list", None), RouteMode::Mock);

        service.set_endpoint_mode("campaigns/list", RouteMode::Live, None);
        assert_eq!(service.route_for("campaigns/list", None), RouteMode::Live);
        assert_eq!(
            service.route_for("campaigns/list", Some(RouteMode::Mock)),
            RouteMode::Mock
        );

        // forcing is per call; the override still stands
        let forced = service
            .make_request(
                "campaigns/list",
                None,
                RequestOptions::new().with_force_mode(RouteMode::Mock),
            )
            .await
            .unwrap();
        assert_eq!(forced["campaigns"][0]["id"], "file_camp_001");
        assert_eq!(service.route_for("campaigns/list", None), RouteMode::Live);
    }

    #[tokio::test]
    async fn test_global_modes_ignore_overrides() {
        let service = test_service().await;
        service.set_endpoint_mode("campaigns/list", RouteMode::Live, None);

        service.set_global_api_mode(ApiMode::Mock);
        assert_eq!(service.route_for("campaigns/list", None), RouteMode::Mock);

        service.set_global_api_mode(ApiMode::Live);
        assert_eq!(service.route_for("reports/dashboard", None), RouteMode::Live);
    }

    #[tokio::test]
    async fn test_reset_restores_default_modes() {
        let service = test_service().await;
        service.set_global_api_mode(ApiMode::Hybrid);

        for config in service.all_endpoint_configurations() {
            let flipped = match config.default_mode {
                RouteMode::Live => RouteMode::Mock,
                RouteMode::Mock => RouteMode::Live,
            };
            service.set_endpoint_mode(&config.endpoint, flipped, None);
        }

        service.reset_endpoint_overrides();
        assert!(service.endpoint_overrides().is_empty());
        for config in service.all_endpoint_configurations() {
            assert_eq!(service.endpoint_mode(&config.endpoint), config.default_mode);
            assert_eq!(service.route_for(&config.endpoint, None), config.default_mode);
        }
    }

    #[tokio::test]
    async fn test_endpoint_mode_fallbacks() {
        let service = test_service().await;
        assert_eq!(service.endpoint_mode("reports/export"), RouteMode::Live);
        assert_eq!(service.endpoint_mode("unknown/endpoint"), RouteMode::Mock);

        service.set_global_api_mode(ApiMode::Live);
        assert_eq!(service.endpoint_mode("unknown/endpoint"), RouteMode::Live);
    }

    #[tokio::test]
    async fn test_custom_response_bypasses_fixtures() {
        let service = test_service().await;
        let custom = json!({ "anything": [1, 2, 3] });

        let response = service
            .make_request(
                "does/not/exist",
                None,
                RequestOptions::new().with_custom_response(custom.clone()),
            )
            .await
            .unwrap();
        assert_eq!(response, custom);
    }

    #[tokio::test]
    async fn test_simulated_timeout_is_immediate() {
        let service = MockApiService::builder()
            .network_config(NetworkConfig {
                latency_min_ms: 5_000,
                latency_max_ms: 5_000,
                failure_rate: 0.0,
                ..Default::default()
            })
            .build()
            .await
            .unwrap();

        let started = Instant::now();
        let error = service
            .make_request(
                "campaigns/list",
                None,
                RequestOptions::new().timing_out().with_delay(5_000).slow(),
            )
            .await
            .unwrap_err();

        assert!(matches!(error, MockApiError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_campaign_email_selects_campaign_manager() {
        let service = test_service().await;

        let response = service
            .make_request(
                "auth/login",
                Some(json!({ "email": "campaign@x.com", "password": "secret" })),
                RequestOptions::new(),
            )
            .await
            .unwrap();

        assert_eq!(response["user"]["role"], "campaign_manager");
    }

    #[tokio::test]
    async fn test_typed_login() {
        let service = test_service().await;
        let session = service
            .login(&LoginCredentials {
                email: "analyst@boosttrade.com".to_string(),
                password: "secret".to_string(),
                role: None,
            })
            .await
            .unwrap();

        assert_eq!(session.user.role, Role::ReportsOnly);
        assert!(session.user.has_permission("reports.view_all"));
    }

    #[tokio::test]
    async fn test_should_fail_surfaces_fixture_error() {
        let service = test_service().await;

        let error = service
            .make_request(
                "auth/login",
                Some(json!({ "email": "admin@x.com" })),
                RequestOptions::new().failing(),
            )
            .await
            .unwrap_err();

        assert!(matches!(error, MockApiError::Rejected(_)));
        assert_eq!(error.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn test_should_fail_skips_failure_roll() {
        let service = test_service().await;
        service.apply_preset(NetworkPreset::Offline);

        // the fixture has no error entry, so the request succeeds
        let response = service
            .make_request("reports/dashboard", None, RequestOptions::new().failing())
            .await
            .unwrap();
        assert_eq!(response["metrics"]["campaigns"], 42);
    }

    #[tokio::test]
    async fn test_unknown_endpoint_names_the_endpoint() {
        let service = test_service().await;

        let error = service
            .make_request("reports/nowhere", None, RequestOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(error, MockApiError::EndpointNotFound(_)));
        assert!(error.to_string().contains("reports/nowhere"));
    }

    #[tokio::test]
    async fn test_missing_fixture_falls_back_to_inline_response() {
        let service = test_service().await;

        let message = service.forgot_password("someone@boosttrade.com").await.unwrap();
        assert_eq!(message, "Password reset email sent successfully");
    }

    #[tokio::test]
    async fn test_override_fixture_file() {
        let service = test_service().await;
        service.set_endpoint_mode(
            "reports/stores",
            RouteMode::Mock,
            Some("reports-dashboard.json".to_string()),
        );

        let response = service
            .make_request("reports/stores", None, RequestOptions::new())
            .await
            .unwrap();
        assert_eq!(response["metrics"]["stores"], 198);
    }

    #[tokio::test]
    async fn test_identifier_selects_fixture_variant() {
        struct KeyedSource;

        #[async_trait::async_trait]
        impl FixtureSource for KeyedSource {
            async fn fetch(&self, name: &str) -> Result<Option<Value>> {
                Ok((name == "stores-list.json").then(|| {
                    json!({
                        "success": {
                            "default": { "stores": ["Main Street"] },
                            "staging": { "stores": ["Staging Store"] }
                        }
                    })
                }))
            }

            fn describe(&self) -> String {
                "keyed".to_string()
            }
        }

        let service = MockApiService::builder()
            .network_config(instant_network())
            .fixture_source(Arc::new(KeyedSource))
            .build()
            .await
            .unwrap();

        let staging = service
            .make_request(
                "stores/list",
                Some(json!({ "identifier": "staging" })),
                RequestOptions::new(),
            )
            .await
            .unwrap();
        assert_eq!(staging, json!({ "stores": ["Staging Store"] }));

        let unkeyed = service
            .make_request("stores/list", None, RequestOptions::new())
            .await
            .unwrap();
        assert!(unkeyed.get("default").is_some());
    }

    #[tokio::test]
    async fn test_identifier_persists_through_store() {
        let store: Arc<dyn SettingsStore> = Arc::new(MemorySettingsStore::new());
        let service = MockApiService::builder()
            .settings_store(Arc::clone(&store))
            .build()
            .await
            .unwrap();

        assert_eq!(service.api_identifier(), "default");
        service.set_api_identifier("staging").await.unwrap();
        assert!(matches!(
            service.set_api_identifier("production").await,
            Err(MockApiError::UnknownIdentifier(_))
        ));

        let reopened = MockApiService::builder()
            .settings_store(store)
            .build()
            .await
            .unwrap();
        assert_eq!(reopened.api_identifier(), "staging");
    }

    #[tokio::test]
    async fn test_identifier_saved_over_corrupt_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"boosttrade.api_identifier": "stag"#).unwrap();

        let store = Arc::new(FileSettingsStore::new(&path));
        let service = MockApiService::builder()
            .settings_store(store.clone())
            .build()
            .await
            .unwrap();
        assert_eq!(service.api_identifier(), "default");

        service.set_api_identifier("staging").await.unwrap();
        assert_eq!(service.api_identifier(), "staging");

        let reopened = MockApiService::builder()
            .settings_store(store)
            .build()
            .await
            .unwrap();
        assert_eq!(reopened.api_identifier(), "staging");
    }

    #[tokio::test]
    async fn test_unknown_persisted_identifier_falls_back() {
        let store = Arc::new(MemorySettingsStore::new());
        store.save(API_IDENTIFIER_KEY, "production").await.unwrap();

        let service = MockApiService::builder()
            .settings_store(store)
            .build()
            .await
            .unwrap();
        assert_eq!(service.api_identifier(), "default");
    }

    #[tokio::test]
    async fn test_settings_validation() {
        let service = test_service().await;

        service.set_live_api_base_url("http://localhost:4000").unwrap();
        assert_eq!(service.live_api_base_url(), "http://localhost:4000");
        assert!(service.set_live_api_base_url("no scheme here").is_err());

        service.set_json_dataset("performance").unwrap();
        assert_eq!(service.selected_json_dataset(), "performance");
        assert!(service.set_json_dataset("huge").is_err());
    }

    #[tokio::test]
    async fn test_debug_info_snapshot() {
        let service = test_service().await;
        service.set_endpoint_mode("users/list", RouteMode::Live, None);
        service.load_fixture("campaigns-list.json").await.unwrap();

        let info = service.debug_info();
        assert_eq!(info.global_api_mode, ApiMode::Mock);
        assert_eq!(info.fixture_cache_size, 1);
        assert_eq!(info.configured_endpoints, 29);
        assert_eq!(info.endpoint_overrides.len(), 1);
        assert_eq!(info.inline_endpoints.len(), 3);
        assert_eq!(info.api_identifier, "default");

        service.clear_cache();
        assert_eq!(service.debug_info().fixture_cache_size, 0);
    }

    #[tokio::test]
    async fn test_catalogues() {
        let service = test_service().await;
        assert_eq!(service.available_api_modes().len(), 4);
        assert_eq!(service.available_json_datasets().len(), 3);
        assert_eq!(
            service.available_identifiers(),
            vec!["default", "staging", "development", "testing"]
        );
    }
}
