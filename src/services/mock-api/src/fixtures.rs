//! Fixture Loading Module
//!
//! Resolves fixture file names to parsed JSON. A configured source (static
//! asset server or local directory) is tried first, then the built-in fixture
//! table. Successful loads are cached for the lifetime of the loader until
//! explicitly cleared.

use crate::{MockApiError, Result};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default path fixtures are served under
pub const DEFAULT_RESPONSES_PATH: &str = "mock/responses";

/// Fixture names available without any external source
pub const BUILTIN_FIXTURES: [&str; 6] = [
    "auth-login.json",
    "campaigns-create.json",
    "campaigns-list.json",
    "users-create.json",
    "reports-dashboard.json",
    "reports-campaigns.json",
];

/// Where fixture files come from
#[async_trait]
pub trait FixtureSource: Send + Sync {
    /// Fetch and parse one fixture. `Ok(None)` means the source does not have it.
    async fn fetch(&self, name: &str) -> Result<Option<Value>>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// Fetches fixtures from a static asset server at `{base_url}/{responses_path}/{name}`
#[derive(Debug, Clone)]
pub struct HttpFixtureSource {
    client: reqwest::Client,
    base_url: String,
    responses_path: String,
}

impl HttpFixtureSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, DEFAULT_RESPONSES_PATH)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        responses_path: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            responses_path: responses_path.into(),
        }
    }

    pub fn fixture_url(&self, name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.responses_path.trim_matches('/'),
            name
        )
    }
}

#[async_trait]
impl FixtureSource for HttpFixtureSource {
    async fn fetch(&self, name: &str) -> Result<Option<Value>> {
        let url = self.fixture_url(name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MockApiError::FixtureFetch(format!("Failed to fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            debug!("Fixture {} returned HTTP {}", url, response.status());
            return Ok(None);
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| MockApiError::FixtureFetch(format!("Invalid JSON in {}: {}", url, e)))?;

        Ok(Some(value))
    }

    fn describe(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.responses_path.trim_matches('/')
        )
    }
}

/// Reads fixtures from a local directory
#[derive(Debug, Clone)]
pub struct DirectoryFixtureSource {
    directory: PathBuf,
}

impl DirectoryFixtureSource {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Path for a fixture name, refusing anything that escapes the directory
    pub fn fixture_path(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
            return None;
        }
        Some(self.directory.join(name))
    }
}

#[async_trait]
impl FixtureSource for DirectoryFixtureSource {
    async fn fetch(&self, name: &str) -> Result<Option<Value>> {
        let Some(path) = self.fixture_path(name) else {
            warn!("Rejected fixture name outside the fixture directory: {}", name);
            return Ok(None);
        };

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn describe(&self) -> String {
        self.directory.display().to_string()
    }
}

/// Read-through fixture cache
pub struct FixtureLoader {
    source: Option<Arc<dyn FixtureSource>>,
    cache: DashMap<String, Arc<Value>>,
}

impl FixtureLoader {
    /// Loader backed only by the built-in table
    pub fn builtin_only() -> Self {
        Self {
            source: None,
            cache: DashMap::new(),
        }
    }

    pub fn with_source(source: Arc<dyn FixtureSource>) -> Self {
        Self {
            source: Some(source),
            cache: DashMap::new(),
        }
    }

    /// Load a fixture, consulting the cache first.
    ///
    /// Cache hits return the same `Arc` that was stored on the first load.
    pub async fn load(&self, name: &str) -> Result<Arc<Value>> {
        if let Some(cached) = self.cache.get(name) {
            return Ok(Arc::clone(cached.value()));
        }

        let mut loaded = None;
        if let Some(source) = &self.source {
            match source.fetch(name).await {
                Ok(Some(value)) => loaded = Some(value),
                Ok(None) => debug!(
                    "Fixture {} not found in {}, using built-in table",
                    name,
                    source.describe()
                ),
                Err(e) => debug!("Fixture source failed for {}: {}, using built-in table", name, e),
            }
        }

        let value = loaded
            .or_else(|| builtin_fixture(name))
            .ok_or_else(|| MockApiError::FixtureNotFound(name.to_string()))?;

        // Concurrent first loads keep whichever entry landed first
        let entry = self
            .cache
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(value));
        Ok(Arc::clone(entry.value()))
    }

    /// Drop every cached fixture
    pub fn clear(&self) {
        let dropped = self.cache.len();
        self.cache.clear();
        info!("Fixture cache cleared ({} entries)", dropped);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }
}

impl Default for FixtureLoader {
    fn default() -> Self {
        Self::builtin_only()
    }
}

impl std::fmt::Debug for FixtureLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureLoader")
            .field("source", &self.source.as_ref().map(|s| s.describe()))
            .field("cached", &self.cache.len())
            .finish()
    }
}

/// Built-in fixture content keyed by file name
pub fn builtin_fixture(name: &str) -> Option<Value> {
    let stamp = chrono::Utc::now().timestamp_millis();

    let value = match name {
        "auth-login.json" => json!({
            "success": {
                "admin": {
                    "token": "file-admin-token",
                    "user": {
                        "id": 1,
                        "name": "File Admin",
                        "email": "admin@file.com",
                        "role": "admin",
                        "permissions": [
                            "admin.users.manage", "admin.roles.manage", "admin.placements.manage",
                            "admin.conditions.manage", "campaigns.create", "campaigns.edit",
                            "campaigns.delete", "campaigns.publish", "campaigns.preview",
                            "stores.manage", "stores.health", "reports.view_all", "reports.export"
                        ]
                    }
                },
                "campaign_manager": {
                    "token": "file-campaign-token",
                    "user": {
                        "id": 2,
                        "name": "File Campaign Manager",
                        "email": "campaign@file.com",
                        "role": "campaign_manager",
                        "permissions": [
                            "campaigns.create", "campaigns.edit", "campaigns.publish",
                            "campaigns.preview", "stores.view", "reports.view_campaigns"
                        ]
                    }
                },
                "reports_only": {
                    "token": "file-reports-token",
                    "user": {
                        "id": 3,
                        "name": "File Analyst",
                        "email": "analyst@file.com",
                        "role": "reports_only",
                        "permissions": ["reports.view_all", "reports.export", "dashboard.view"]
                    }
                },
                "pos_admin": {
                    "token": "file-pos-token",
                    "user": {
                        "id": 4,
                        "name": "File POS Admin",
                        "email": "pos@file.com",
                        "role": "pos_admin",
                        "permissions": [
                            "stores.view", "stores.manage", "stores.health",
                            "posstoresdevice", "addplacements", "devicehealth", "reports.view_all"
                        ]
                    }
                }
            },
            "error": { "message": "Invalid credentials" }
        }),
        "campaigns-create.json" => json!({
            "success": {
                "id": format!("camp_file_{}", stamp),
                "message": "Campaign created from file",
                "campaign": { "id": format!("camp_file_{}", stamp), "status": "draft" }
            }
        }),
        "campaigns-list.json" => json!({
            "success": {
                "campaigns": [
                    { "id": "file_camp_001", "name": "File Campaign 1", "status": "active" },
                    { "id": "file_camp_002", "name": "File Campaign 2", "status": "draft" }
                ]
            }
        }),
        "users-create.json" => json!({
            "success": {
                "id": format!("user_file_{}", stamp),
                "message": "User created from file"
            }
        }),
        "reports-dashboard.json" => json!({
            "success": {
                "metrics": {
                    "campaigns": 42,
                    "stores": 198,
                    "users": 1847,
                    "revenue": "$3.2M"
                }
            }
        }),
        "reports-campaigns.json" => json!({
            "success": {
                "overview": {
                    "totalRevenue": "$2,847,392",
                    "totalCampaigns": 24,
                    "activeUsers": 1247,
                    "conversionRate": 3.2
                },
                "chartData": {
                    "performance": [
                        { "month": "Jan", "impressions": 120000, "conversions": 1250, "revenue": 145000 },
                        { "month": "Feb", "impressions": 145000, "conversions": 1680, "revenue": 189000 },
                        { "month": "Mar", "impressions": 189000, "conversions": 2150, "revenue": 234000 },
                        { "month": "Apr", "impressions": 203000, "conversions": 2890, "revenue": 287000 },
                        { "month": "May", "impressions": 245000, "conversions": 3250, "revenue": 312000 },
                        { "month": "Jun", "impressions": 287000, "conversions": 3780, "revenue": 356000 }
                    ],
                    "categories": [
                        { "name": "Electronics", "value": 35, "color": "#3b82f6" },
                        { "name": "Clothing", "value": 28, "color": "#10b981" },
                        { "name": "Home & Garden", "value": 18, "color": "#f59e0b" },
                        { "name": "Sports", "value": 12, "color": "#ef4444" },
                        { "name": "Books", "value": 7, "color": "#8b5cf6" }
                    ]
                }
            }
        }),
        _ => return None,
    };

    Some(value)
}
