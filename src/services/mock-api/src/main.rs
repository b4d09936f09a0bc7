//! Mock API Server
//!
//! Entry point for the BoostTrade mock API service. Serves the dispatcher and
//! its runtime configuration over HTTP for the dashboard and test tooling.

use anyhow::{Context, Result};
use clap::Parser;
use mock_api::{
    config::{Args, MockApiConfig},
    handlers::{create_router, AppState},
    MockApiService,
};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

/// Telemetry and observability setup
mod telemetry {
    use anyhow::Result;
    use mock_api::config::MockApiConfig;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    /// Initialize tracing and logging
    pub fn init_tracing(config: &MockApiConfig) -> Result<()> {
        let log_level = &config.monitoring.logging.level;
        let log_format = &config.monitoring.logging.format;

        let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

        let fmt_layer = match log_format.as_str() {
            "json" => fmt::layer().json().boxed(),
            _ => fmt::layer().pretty().boxed(),
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}

/// Middleware setup
mod middleware {
    use axum::Router;
    use boosttrade_shared::ServerConfig;
    use tower_http::{
        cors::{AllowOrigin, Any, CorsLayer},
        trace::TraceLayer,
    };

    pub fn apply(router: Router, server: &ServerConfig) -> Router {
        let origins = if server.allows_any_origin() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(
                server
                    .cors_allowed_origins
                    .iter()
                    .filter_map(|origin| origin.parse().ok()),
            )
        };

        let cors = CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }
}

/// Graceful shutdown handling
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = Arc::new(MockApiConfig::load(&args)?);

    telemetry::init_tracing(&config)?;

    info!("Starting BoostTrade Mock API Server v{}", mock_api::VERSION);
    info!("Configuration loaded from: {:?}", args.config);

    let service = Arc::new(
        MockApiService::from_config(&config)
            .await
            .context("Failed to initialize mock API service")?,
    );

    info!(
        global_mode = %service.global_api_mode(),
        endpoints = service.registry().len(),
        identifier = %service.api_identifier(),
        "Mock API service ready"
    );

    let state = AppState::new(Arc::clone(&service), Arc::clone(&config));
    let app = middleware::apply(create_router(state), &config.server);

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;

    info!("Mock API Server listening on {}", address);
    info!("Health endpoint: http://{}/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed to start")?;

    info!("Mock API Server shutdown complete");
    Ok(())
}
