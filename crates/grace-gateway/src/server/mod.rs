//! Gateway server setup
//!
//! Provides the main WebSocket server configuration and routes.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use crate::connection::ConnectionManager;
use crate::relay::{FeedRelay, FeedRelayConfig};
use axum::{extract::State, routing::get, Json, Router};
use grace_common::{AppConfig, AppError};
use grace_core::SnowflakeGenerator;
use grace_db::Store;
use grace_service::ServiceContextBuilder;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/gateway", get(gateway_handler))
        .route("/health", get(health_check))
}

#[derive(Debug, Serialize)]
struct GatewayHealth {
    status: &'static str,
    connections: usize,
    subscriptions: usize,
    live_queries: usize,
    relay: bool,
}

/// Health check endpoint with live connection counts
async fn health_check(State(state): State<GatewayState>) -> Json<GatewayHealth> {
    let manager = state.connection_manager();
    Json(GatewayHealth {
        status: "ok",
        connections: manager.connection_count(),
        subscriptions: manager.subscription_count(),
        live_queries: state.service_context().live().active_queries(),
        relay: state.relay().is_some_and(FeedRelay::is_running),
    })
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize all dependencies and create `GatewayState`
pub async fn create_gateway_state(config: AppConfig) -> Result<GatewayState, AppError> {
    let store = Store::connect(config.store.backend, config.database.as_ref()).await?;

    let service_context = ServiceContextBuilder::new()
        .store(&store)
        .snowflake_generator(Arc::new(SnowflakeGenerator::new(config.snowflake.worker_id)))
        .live_config(config.live.clone())
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    // Without Redis only writes made in this process reach live queries
    let relay = match &config.redis {
        Some(redis) => {
            tracing::info!("Starting feed relay from Redis...");
            let relay = FeedRelay::start(
                FeedRelayConfig::new(redis.url.clone()),
                service_context.feed().clone(),
            )
            .await
            .map_err(|e| AppError::Cache(format!("Failed to start feed relay: {e}")))?;
            Some(relay)
        }
        None => {
            tracing::warn!("REDIS_URL not set; live queries only see this process's writes");
            None
        }
    };

    let connection_manager =
        ConnectionManager::new_shared(config.gateway.max_subscriptions_per_connection);

    Ok(GatewayState::new(
        service_context,
        connection_manager,
        relay,
        config,
    ))
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    tracing::info!("Starting Gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Gateway listening on ws://{}/gateway", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .gateway
        .server
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid gateway address: {e}")))?;

    let state = create_gateway_state(config).await?;
    let relay_state = state.clone();
    let app = create_app(state);

    let result = run_server(app, addr).await;
    if let Some(relay) = relay_state.relay() {
        relay.shutdown().await;
    }
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
