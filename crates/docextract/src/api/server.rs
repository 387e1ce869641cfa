//! API server setup and configuration.

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, put},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::core::config::ServerConfig;
use crate::core::orchestrator::Orchestrator;
use crate::{DocextractError, Result};

use super::{
    handlers::{get_handler, health_handler, info_handler, put_handler},
    types::{ApiSizeLimits, ApiState},
};

/// Comma-separated list of allowed CORS origins.
pub const CORS_ORIGINS_ENV: &str = "DOCEXTRACT_CORS_ORIGINS";

/// Create the API router with default size limits.
///
/// This is public to allow users to embed the router in their own applications.
///
/// # Examples
///
/// ```no_run
/// use docextract::api::create_router;
/// use docextract::core::{Orchestrator, ServerConfig};
///
/// # fn main() -> docextract::Result<()> {
/// let orchestrator = Orchestrator::from_config(&ServerConfig::default())?;
/// let router = create_router(orchestrator);
/// # Ok(())
/// # }
/// ```
pub fn create_router(orchestrator: Orchestrator) -> Router {
    create_router_with_limits(orchestrator, ApiSizeLimits::default())
}

/// Create the API router with custom size limits.
pub fn create_router_with_limits(orchestrator: Orchestrator, limits: ApiSizeLimits) -> Router {
    let state = ApiState {
        orchestrator: Arc::new(orchestrator),
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .route("/{opkey}", put(put_handler))
        .route("/{opkey}/{pathkey}/{*resource}", get(get_handler))
        .layer(DefaultBodyLimit::max(limits.max_request_body_bytes))
        .layer(RequestBodyLimitLayer::new(limits.max_request_body_bytes))
        .layer(cors_layer_from_env())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// SECURITY WARNING: without DOCEXTRACT_CORS_ORIGINS every origin is allowed.
fn cors_layer_from_env() -> CorsLayer {
    let Ok(origins_str) = std::env::var(CORS_ORIGINS_ENV) else {
        tracing::warn!(
            "CORS configured to allow all origins (default). For production, set {} to a \
             comma-separated list of allowed origins (e.g., 'https://app.example.com')",
            CORS_ORIGINS_ENV
        );
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    };

    let origins: Vec<_> = origins_str
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!(
            "{} set but empty/invalid - falling back to permissive CORS",
            CORS_ORIGINS_ENV
        );
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }

    tracing::info!("CORS configured with {} explicit allowed origin(s)", origins.len());
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server with an explicit configuration.
///
/// # Errors
///
/// Returns `DocextractError::Validation` for an invalid configuration and
/// `DocextractError::Io` if the socket can't be bound.
///
/// # Examples
///
/// ```no_run
/// use docextract::api::serve;
/// use docextract::core::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> docextract::Result<()> {
///     let config = ServerConfig::from_toml_file("config/docextract.toml")?;
///     serve(config).await
/// }
/// ```
pub async fn serve(config: ServerConfig) -> Result<()> {
    config.validate()?;

    let ip: IpAddr = config
        .host
        .parse()
        .map_err(|e| DocextractError::validation(format!("Invalid host address: {}", e)))?;
    let addr = SocketAddr::new(ip, config.port);

    let orchestrator = Orchestrator::from_config(&config)?;
    let limits = ApiSizeLimits::new(config.limits.max_request_body_bytes);
    let app = create_router_with_limits(orchestrator, limits);

    tracing::info!(
        path_keys = config.paths.len(),
        max_request_body_bytes = limits.max_request_body_bytes,
        "Starting docextract API server on http://{}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(DocextractError::Io)?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DocextractError::Other(e.to_string()))?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Start the API server with a discovered configuration.
///
/// Searches for `docextract.toml` in the current and parent directories,
/// falls back to defaults, then applies environment overrides.
pub async fn serve_default() -> Result<()> {
    let mut config = match ServerConfig::discover()? {
        Some(config) => config,
        None => {
            tracing::info!("No config file found, using default configuration");
            ServerConfig::default()
        }
    };
    config.apply_env_overrides();

    serve(config).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
