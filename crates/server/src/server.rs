//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with the catalog groups under `/api`
//! - Middleware stack (request id, logging, panics, CORS, compression)
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::error::{INTERNAL_ERROR, ServerError};
use crate::middleware::{log_requests, request_id};
use crate::routes::{
    api_info, costos, dpgr, dppi, educacion, health, login, not_found, parametros, persona,
    presupuesto, regiones,
};
use crate::state::ServerState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use mssql::MssqlInvoker;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
///
/// Middleware stack (outermost first):
/// 1. HTTP tracing
/// 2. Request ID tracking
/// 3. Request logging and counting
/// 4. Panic recovery
/// 5. CORS
/// 6. Compression
/// 7. Body size limit
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(AnyOrigin)
            .allow_methods(AnyOrigin)
            .allow_headers(AnyOrigin)
    } else {
        CorsLayer::new()
    };

    let expose = state.expose_errors();
    let on_panic = move |panic: Box<dyn Any + Send + 'static>| panic_response(panic, expose);

    Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        .nest("/api/educacion", educacion::router())
        .nest("/api/dppi", dppi::router())
        .nest("/api/dpgr", dpgr::router())
        .nest("/api/presupuesto", presupuesto::router())
        .nest("/api/parametros", parametros::router())
        .nest("/api/regiones", regiones::router())
        .nest("/api/persona", persona::router())
        .nest("/api/costos", costos::router())
        .merge(login::router())
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(CatchPanicLayer::custom(on_panic))
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>, expose: bool) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| INTERNAL_ERROR.to_string());
    tracing::error!(panic = %detail, "handler panicked");
    ServerError::Internal { detail, expose }.into_response()
}

/// Start the SGI HTTP server
///
/// Initializes logging, validates the configuration, builds the SQL Server
/// invoker and serves until SIGTERM or Ctrl+C.
///
/// # Example
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .init();

    if let Err(err) = config.validate() {
        tracing::error!(error = %err, "invalid configuration");
        return Err(err);
    }

    let invoker = Arc::new(MssqlInvoker::new(config.database.clone())?);
    let mut state = ServerState::new(config.clone(), invoker);
    if config.metrics_enabled {
        let handle = PrometheusBuilder::new().install_recorder()?;
        state = state.with_metrics(handle);
    }

    let app = build_router(Arc::new(state));

    // Parse bind address
    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!(
        "Starting SGI server on {} ({:?})",
        addr,
        config.environment
    );
    tracing::info!(
        "Database: {}/{}, max {} connections",
        config.database.host,
        config.database.database,
        config.database.max_connections
    );
    tracing::info!(
        "CORS: {}, Metrics: {}, Max body: {}MB",
        config.enable_cors,
        config.metrics_enabled,
        config.max_body_size_mb
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
