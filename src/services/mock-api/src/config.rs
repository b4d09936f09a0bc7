//! Mock API Configuration Module
//!
//! Loads the service configuration from a YAML file, an environment-specific
//! overlay, `MOCK_API__*` environment variables and command-line overrides,
//! in that order.

use crate::models::{ApiMode, NetworkConfig};
use crate::{DEFAULT_JSON_DATASET, DEFAULT_LIVE_API_BASE_URL};

use anyhow::{Context, Result};
use boosttrade_shared::{LoggingConfig, ServerConfig};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Main mock API configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MockApiConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Routing and live backend settings
    pub api: ApiSettings,

    /// Simulated network characteristics at startup
    pub network: NetworkConfig,

    /// Where fixture files come from
    pub fixtures: FixtureSettings,

    /// Persisted settings location
    pub storage: StorageSettings,

    /// Monitoring configuration
    pub monitoring: MonitoringSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Global routing mode at startup
    pub global_mode: ApiMode,

    /// Base URL for live calls
    pub live_base_url: String,

    /// Selected JSON dataset
    pub json_dataset: String,

    /// YAML endpoint registry replacing the built-in table
    pub endpoints_file: Option<PathBuf>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            global_mode: ApiMode::Mock,
            live_base_url: DEFAULT_LIVE_API_BASE_URL.to_string(),
            json_dataset: DEFAULT_JSON_DATASET.to_string(),
            endpoints_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureSettings {
    /// Static asset server hosting the fixture files
    pub base_url: Option<String>,

    /// Path under `base_url` the fixtures live at
    pub responses_path: String,

    /// Local fixture directory; takes precedence over `base_url`
    pub directory: Option<PathBuf>,
}

impl Default for FixtureSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            responses_path: crate::fixtures::DEFAULT_RESPONSES_PATH.to_string(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// JSON file holding persisted settings; in-memory when absent
    pub settings_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringSettings {
    pub logging: LoggingConfig,
}

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(
    name = "mock-api-server",
    about = "BoostTrade Mock API and network simulation service",
    version
)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/mock-api.yaml")]
    pub config: PathBuf,

    /// Environment (development, testing, production)
    #[arg(short, long, default_value = "development")]
    pub environment: String,

    /// Server port (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log level (overrides config)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Global API mode (overrides config)
    #[arg(long)]
    pub mode: Option<ApiMode>,

    /// Live backend base URL (overrides config)
    #[arg(long)]
    pub live_url: Option<String>,

    /// Local fixture directory (overrides config)
    #[arg(long)]
    pub fixtures_dir: Option<PathBuf>,
}

impl MockApiConfig {
    /// Load configuration from file and environment variables
    pub fn load(args: &Args) -> Result<Self> {
        let mut settings = config::Config::builder();

        if args.config.exists() {
            settings = settings.add_source(config::File::from(args.config.clone()).required(false));
        }

        let env_file = format!("config/mock-api-{}.yaml", args.environment);
        settings = settings.add_source(config::File::with_name(&env_file).required(false));

        settings = settings.add_source(config::Environment::with_prefix("MOCK_API").separator("__"));

        let mut config: MockApiConfig = settings
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.apply_args(args);

        config
            .validate()
            .context("Configuration validation failed")?;

        Ok(config)
    }

    /// Apply command-line overrides
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        if let Some(ref log_level) = args.log_level {
            self.monitoring.logging.level = log_level.clone();
        }

        if args.debug {
            self.monitoring.logging.level = "debug".to_string();
        }

        if let Some(mode) = args.mode {
            self.api.global_mode = mode;
        }

        if let Some(ref live_url) = args.live_url {
            self.api.live_base_url = live_url.clone();
        }

        if let Some(ref directory) = args.fixtures_dir {
            self.fixtures.directory = Some(directory.clone());
        }
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        url::Url::parse(&self.api.live_base_url)
            .with_context(|| format!("Invalid live API base URL: {}", self.api.live_base_url))?;

        if let Some(ref base_url) = self.fixtures.base_url {
            url::Url::parse(base_url)
                .with_context(|| format!("Invalid fixture base URL: {}", base_url))?;
        }

        self.network
            .validate()
            .context("Invalid network configuration")?;

        if self.network.latency_min_ms > self.network.latency_max_ms {
            return Err(anyhow::anyhow!(
                "Network latency minimum ({}ms) exceeds maximum ({}ms)",
                self.network.latency_min_ms,
                self.network.latency_max_ms
            ));
        }

        Ok(())
    }
}
