pub mod response;

use crate::config::{Config, CorsConfig, StoreBackend};
use crate::db;
use crate::error::AppError;
use crate::features::{self, FeatureState};
use crate::middleware;
use crate::refresh::RefreshEngine;
use crate::store::{CountryStore, MemoryCountryStore, PgCountryStore};
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tracing::info;

/// Build the configured store, the refresh engine and serve until shutdown
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store: Arc<dyn CountryStore> = match config.store {
        StoreBackend::Postgres => {
            let pool = db::connect(&config.database).await?;
            Arc::new(PgCountryStore::new(pool))
        },
        StoreBackend::Memory => {
            info!("Using in-memory country store; data is lost on shutdown");
            Arc::new(MemoryCountryStore::new())
        },
    };

    let engine = Arc::new(RefreshEngine::new(store.clone(), &config.refresh)?);
    info!(
        countries_url = %config.refresh.countries_url,
        exchange_rates_url = %config.refresh.exchange_rates_url,
        summary_image = %engine.summary_image_path().display(),
        "Refresh engine ready"
    );

    let app = create_router(FeatureState { store, engine }, &config.cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Create the application router with all routes and middleware
pub fn create_router(state: FeatureState, cors: &CorsConfig) -> Router {
    let root = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(state.clone());

    root.merge(features::router(state))
        .fallback(not_found)
        // Apply layers from innermost to outermost
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(cors))
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "countrydb",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn health(State(state): State<FeatureState>) -> Result<impl IntoResponse, AppError> {
    state
        .store
        .health_check()
        .await
        .map_err(|e| AppError::Unavailable(e.to_string()))?;

    Ok(Json(json!({
        "status": "healthy",
        "store": "connected"
    })))
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
