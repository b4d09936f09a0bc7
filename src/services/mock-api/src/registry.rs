//! Endpoint Registry Module
//!
//! Static table of logical endpoints and the read-only views the dashboard
//! derives from it. Tables are validated once, when they are defined.

use crate::models::{EndpointCategory, EndpointConfig, EndpointDefinition, HttpMethod, RouteMode};
use crate::{MockApiError, Result};

use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// Registry file format: a versioned list of endpoint definitions
#[derive(Debug, Clone, serde::Deserialize)]
struct RegistryFile {
    #[serde(default)]
    version: Option<String>,
    endpoints: Vec<EndpointDefinition>,
}

static BUILTIN_ENDPOINTS: Lazy<Vec<EndpointConfig>> = Lazy::new(builtin_table);

/// Immutable endpoint table
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    endpoints: Vec<EndpointConfig>,
}

impl EndpointRegistry {
    /// Registry holding the dashboard's endpoint table
    pub fn builtin() -> Self {
        Self {
            endpoints: BUILTIN_ENDPOINTS.clone(),
        }
    }

    /// Build a registry from definitions, validating every entry
    pub fn from_definitions(definitions: Vec<EndpointDefinition>) -> Result<Self> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for (index, definition) in definitions.iter().enumerate() {
            for error in validate_definition(definition) {
                errors.push(format!("endpoint[{}]: {}", index, error));
            }
            if !definition.endpoint.trim().is_empty() && !seen.insert(definition.endpoint.clone()) {
                errors.push(format!(
                    "endpoint[{}]: Duplicate endpoint path: {}",
                    index, definition.endpoint
                ));
            }
        }

        if !errors.is_empty() {
            return Err(MockApiError::Validation(errors));
        }

        let endpoints = definitions
            .into_iter()
            .map(|definition| EndpointConfig {
                default_mode: definition
                    .default_mode
                    .parse::<RouteMode>()
                    .unwrap_or(RouteMode::Mock),
                endpoint: definition.endpoint,
                name: definition.name,
                description: definition.description,
                fixture_file: definition.fixture_file,
                live_api_url: definition.live_api_url,
                headers: definition.headers,
                category: definition.category,
                methods: definition.methods,
                requires_auth: definition.requires_auth,
                permissions: definition.permissions,
            })
            .collect();

        Ok(Self { endpoints })
    }

    /// Parse a YAML registry file (`version`, `endpoints: [...]`)
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: RegistryFile = serde_yaml::from_str(yaml)
            .map_err(|e| MockApiError::Config(format!("Invalid endpoint registry: {}", e)))?;

        debug!(
            "Loading endpoint registry version {} with {} entries",
            file.version.as_deref().unwrap_or("unversioned"),
            file.endpoints.len()
        );

        Self::from_definitions(file.endpoints)
    }

    pub fn get(&self, endpoint: &str) -> Option<&EndpointConfig> {
        self.endpoints.iter().find(|config| config.endpoint == endpoint)
    }

    pub fn all(&self) -> &[EndpointConfig] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn list_by_category(&self, category: EndpointCategory) -> Vec<&EndpointConfig> {
        self.endpoints
            .iter()
            .filter(|config| config.category == category)
            .collect()
    }

    pub fn list_by_mode(&self, mode: RouteMode) -> Vec<&EndpointConfig> {
        self.endpoints
            .iter()
            .filter(|config| config.default_mode == mode)
            .collect()
    }

    pub fn list_by_permission(&self, permission: &str) -> Vec<&EndpointConfig> {
        self.endpoints
            .iter()
            .filter(|config| config.permissions.iter().any(|p| p == permission))
            .collect()
    }

    /// Distinct categories in table order
    pub fn list_categories(&self) -> Vec<EndpointCategory> {
        let mut categories = Vec::new();
        for config in &self.endpoints {
            if !categories.contains(&config.category) {
                categories.push(config.category);
            }
        }
        categories
    }

    /// Distinct fixture files in table order
    pub fn fixture_files(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.endpoints
            .iter()
            .filter_map(|config| config.fixture_file.as_deref())
            .filter(|file| seen.insert(*file))
            .collect()
    }
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Integrity problems in one endpoint definition; empty when valid
pub fn validate_definition(definition: &EndpointDefinition) -> Vec<String> {
    let mut errors = Vec::new();

    if definition.endpoint.trim().is_empty() {
        errors.push("Endpoint path is required".to_string());
    }

    if definition.name.trim().is_empty() {
        errors.push("Endpoint name is required".to_string());
    }

    if definition.default_mode.parse::<RouteMode>().is_err() {
        errors.push("Default mode must be either \"live\" or \"mock\"".to_string());
    }

    if definition.methods.is_empty() {
        errors.push("At least one HTTP method must be specified".to_string());
    }

    errors
}

fn entry(
    endpoint: &str,
    name: &str,
    description: &str,
    default_mode: RouteMode,
    category: EndpointCategory,
    methods: &[HttpMethod],
    requires_auth: bool,
    permissions: &[&str],
) -> EndpointConfig {
    EndpointConfig {
        endpoint: endpoint.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        default_mode,
        fixture_file: Some(format!("{}.json", endpoint.replace("/{id}", "").replace('/', "-"))),
        live_api_url: None,
        headers: BTreeMap::new(),
        category,
        methods: methods.to_vec(),
        requires_auth,
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
    }
}

fn builtin_table() -> Vec<EndpointConfig> {
    use EndpointCategory::*;
    use HttpMethod::*;
    use RouteMode::{Live, Mock};

    let mut login = entry(
        "auth/login",
        "User Login",
        "Authenticate user credentials and return JWT token",
        Mock,
        Auth,
        &[Post],
        false,
        &[],
    );
    login
        .headers
        .insert("Content-Type".to_string(), "application/json".to_string());

    vec![
        // Authentication
        login,
        entry("auth/logout", "User Logout", "Invalidate user session and JWT token", Mock, Auth, &[Post], true, &[]),
        entry("auth/forgot-password", "Forgot Password", "Send password reset email to user", Mock, Auth, &[Post], false, &[]),
        entry("auth/reset-password", "Reset Password", "Reset user password with token", Mock, Auth, &[Post], false, &[]),
        entry("auth/refresh", "Refresh Token", "Refresh JWT token", Live, Auth, &[Post], true, &[]),
        // Campaign management
        entry("campaigns/create", "Create Campaign", "Create a new marketing campaign", Mock, Campaigns, &[Post], true, &["campaigns.create"]),
        entry("campaigns/list", "List Campaigns", "Get list of all campaigns with pagination", Mock, Campaigns, &[Get], true, &["campaigns.view"]),
        with_fixture(entry("campaigns/{id}", "Get Campaign", "Get specific campaign details by ID", Mock, Campaigns, &[Get], true, &["campaigns.view"]), "campaigns-get.json"),
        entry("campaigns/{id}/update", "Update Campaign", "Update existing campaign", Mock, Campaigns, &[Put, Patch], true, &["campaigns.edit"]),
        entry("campaigns/{id}/delete", "Delete Campaign", "Delete campaign by ID", Live, Campaigns, &[Delete], true, &["campaigns.delete"]),
        entry("campaigns/{id}/publish", "Publish Campaign", "Publish campaign to make it active", Mock, Campaigns, &[Post], true, &["campaigns.publish"]),
        entry("campaigns/{id}/preview", "Preview Campaign", "Get campaign preview data", Mock, Campaigns, &[Get], true, &["campaigns.preview"]),
        // User management
        entry("users/create", "Create User", "Create new user account", Mock, Users, &[Post], true, &["admin.users.manage"]),
        entry("users/list", "List Users", "Get paginated list of users", Mock, Users, &[Get], true, &["admin.users.manage", "users.view"]),
        with_fixture(entry("users/{id}", "Get User", "Get user details by ID", Mock, Users, &[Get], true, &["admin.users.manage", "users.view"]), "users-get.json"),
        entry("users/{id}/update", "Update User", "Update user profile and settings", Live, Users, &[Put, Patch], true, &["admin.users.manage"]),
        entry("users/invite", "Invite User", "Send email invitation to new user", Live, Users, &[Post], true, &["admin.users.manage"]),
        // Store management
        entry("stores/list", "List Stores", "Get all POS stores and devices", Mock, Stores, &[Get], true, &["stores.view", "stores.manage"]),
        entry("stores/{id}/health", "Store Health Check", "Get device health status for store", Live, Stores, &[Get], true, &["stores.health", "stores.manage"]),
        entry("stores/create", "Create Store", "Add new POS store location", Mock, Stores, &[Post], true, &["stores.manage"]),
        entry("stores/{id}/devices", "Store Devices", "Get all devices for specific store", Mock, Stores, &[Get], true, &["stores.view", "stores.manage"]),
        // Reports and analytics
        entry("reports/dashboard", "Dashboard Metrics", "Get main dashboard statistics", Mock, Reports, &[Get], true, &["reports.view_all", "dashboard.view"]),
        entry("reports/campaigns", "Campaign Performance Reports", "Get detailed campaign analytics and performance metrics", Mock, Reports, &[Get], true, &["reports.view_all", "reports.view_campaigns"]),
        entry("reports/stores", "Store Performance Reports", "Get store analytics and performance data", Mock, Reports, &[Get], true, &["reports.view_all"]),
        entry("reports/export", "Export Reports", "Export reports in various formats (CSV, PDF, Excel)", Live, Reports, &[Post], true, &["reports.export"]),
        // Admin configuration
        entry("admin/roles", "Role Management", "Manage user roles and permissions", Mock, Admin, &[Get, Post, Put], true, &["admin.roles.manage"]),
        entry("admin/placements", "Ad Placements", "Manage advertisement placement configurations", Mock, Admin, &[Get, Post, Put], true, &["admin.placements.manage"]),
        entry("admin/conditions", "Campaign Conditions", "Configure campaign targeting conditions", Mock, Admin, &[Get, Post, Put], true, &["admin.conditions.manage"]),
        entry("admin/settings", "System Settings", "Global system configuration settings", Live, Admin, &[Get, Put], true, &["admin.settings.manage"]),
    ]
}

fn with_fixture(mut config: EndpointConfig, fixture_file: &str) -> EndpointConfig {
    config.fixture_file = Some(fixture_file.to_string());
    config
}
