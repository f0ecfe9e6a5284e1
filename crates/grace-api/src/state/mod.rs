//! Application state
//!
//! Holds the shared state for the Axum application including
//! the service context and configuration.

use std::sync::Arc;

use grace_cache::RedisPool;
use grace_common::{AppConfig, IdentityVerifier};
use grace_db::Store;
use grace_service::ServiceContext;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Service context containing all dependencies
    service_context: Arc<ServiceContext>,
    /// Application configuration
    config: Arc<AppConfig>,
    verifier: Arc<IdentityVerifier>,
    store: Store,
    /// Present when change relay over Redis is enabled
    redis: Option<RedisPool>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(
        service_context: ServiceContext,
        config: AppConfig,
        store: Store,
        redis: Option<RedisPool>,
    ) -> Self {
        let verifier = IdentityVerifier::from_config(&config.jwt);
        Self {
            service_context: Arc::new(service_context),
            config: Arc::new(config),
            verifier: Arc::new(verifier),
            store,
            redis,
        }
    }

    /// Get the service context
    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Identity token verifier
    pub fn verifier(&self) -> &IdentityVerifier {
        &self.verifier
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn redis(&self) -> Option<&RedisPool> {
        self.redis.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service_context", &"ServiceContext")
            .field("config", &"AppConfig")
            .field("store", &self.store)
            .field("redis", &self.redis.is_some())
            .finish()
    }
}
