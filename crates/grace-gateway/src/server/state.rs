//! Gateway state
//!
//! Application state for the gateway server.

use crate::connection::ConnectionManager;
use crate::relay::FeedRelay;
use grace_common::{AppConfig, IdentityVerifier};
use grace_service::ServiceContext;
use std::sync::Arc;

/// Gateway application state
///
/// Holds all shared dependencies for the gateway server.
#[derive(Clone)]
pub struct GatewayState {
    /// Service context with repositories and the live registry
    service_context: Arc<ServiceContext>,
    /// Connection manager for WebSocket connections
    connection_manager: Arc<ConnectionManager>,
    verifier: Arc<IdentityVerifier>,
    /// Present when Redis is configured
    relay: Option<Arc<FeedRelay>>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(
        service_context: ServiceContext,
        connection_manager: Arc<ConnectionManager>,
        relay: Option<FeedRelay>,
        config: AppConfig,
    ) -> Self {
        let verifier = IdentityVerifier::from_config(&config.jwt);
        Self {
            service_context: Arc::new(service_context),
            connection_manager,
            verifier: Arc::new(verifier),
            relay: relay.map(Arc::new),
            config: Arc::new(config),
        }
    }

    /// Get the service context
    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    /// Get the connection manager
    pub fn connection_manager(&self) -> &ConnectionManager {
        &self.connection_manager
    }

    pub fn verifier(&self) -> &IdentityVerifier {
        &self.verifier
    }

    pub fn relay(&self) -> Option<&FeedRelay> {
        self.relay.as_deref()
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("connection_manager", &self.connection_manager)
            .field("relay", &self.relay)
            .field("config", &"AppConfig")
            .finish()
    }
}
