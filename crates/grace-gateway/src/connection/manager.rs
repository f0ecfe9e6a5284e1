//! Connection manager
//!
//! Tracks all active WebSocket connections using DashMap for thread-safe access.

use super::{Connection, ConnectionState};
use crate::protocol::GatewayMessage;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Manages all active WebSocket connections
pub struct ConnectionManager {
    /// Active connections by session ID
    connections: DashMap<String, Arc<Connection>>,
    max_subscriptions: usize,
}

impl ConnectionManager {
    #[must_use]
    pub fn new(max_subscriptions: usize) -> Self {
        Self {
            connections: DashMap::new(),
            max_subscriptions,
        }
    }

    #[must_use]
    pub fn new_shared(max_subscriptions: usize) -> Arc<Self> {
        Arc::new(Self::new(max_subscriptions))
    }

    /// Register a new connection
    pub fn add_connection(
        &self,
        session_id: String,
        sender: mpsc::Sender<GatewayMessage>,
    ) -> Arc<Connection> {
        let connection = Connection::new(session_id.clone(), sender, self.max_subscriptions);
        self.connections.insert(session_id.clone(), connection.clone());

        tracing::debug!(session_id = %session_id, "Connection added");

        connection
    }

    /// Remove a connection and release every subscription it holds
    pub async fn remove_connection(&self, session_id: &str) {
        if let Some((_, connection)) = self.connections.remove(session_id) {
            connection.set_state(ConnectionState::Disconnected).await;
            let released = connection.release_subscriptions();

            tracing::debug!(
                session_id = %session_id,
                released_subscriptions = released,
                "Connection removed"
            );
        }
    }

    pub fn get_connection(&self, session_id: &str) -> Option<Arc<Connection>> {
        self.connections.get(session_id).map(|r| r.clone())
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Subscriptions held across all connections
    pub fn subscription_count(&self) -> usize {
        self.connections
            .iter()
            .map(|entry| entry.value().subscription_count())
            .sum()
    }

    pub fn has_session(&self, session_id: &str) -> bool {
        self.connections.contains_key(session_id)
    }

    /// Remove connections whose socket writer has gone away
    pub async fn cleanup_closed_connections(&self) -> usize {
        let closed: Vec<String> = self
            .connections
            .iter()
            .filter(|entry| entry.value().is_closed())
            .map(|entry| entry.key().clone())
            .collect();

        let count = closed.len();
        for session_id in closed {
            self.remove_connection(&session_id).await;
        }

        if count > 0 {
            tracing::info!(count = count, "Cleaned up closed connections");
        }

        count
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.connections.len())
            .field("max_subscriptions", &self.max_subscriptions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grace_core::Snowflake;
    use grace_db::MemoryStore;
    use grace_service::{ChangeFeed, LiveRegistry};

    #[tokio::test]
    async fn test_add_and_remove_connection() {
        let manager = ConnectionManager::new(4);
        let (tx, _rx) = mpsc::channel(10);

        manager.add_connection("session1".to_string(), tx);
        assert_eq!(manager.connection_count(), 1);
        assert!(manager.has_session("session1"));

        manager.remove_connection("session1").await;
        assert_eq!(manager.connection_count(), 0);
        assert!(manager.get_connection("session1").is_none());
    }

    #[tokio::test]
    async fn test_remove_releases_subscriptions() {
        let store = Arc::new(MemoryStore::new());
        let registry = LiveRegistry::new(store.clone(), store, ChangeFeed::new(16));
        let manager = ConnectionManager::new(4);
        let (tx, _rx) = mpsc::channel(10);

        let conn = manager.add_connection("session1".to_string(), tx);
        let sub = registry.subscribe_like_count(Snowflake::new(5), |_| {});
        conn.add_subscription(conn.next_subscription_id(), sub).unwrap();
        assert_eq!(manager.subscription_count(), 1);

        manager.remove_connection("session1").await;
        assert_eq!(registry.active_queries(), 0);
        assert_eq!(conn.state().await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_cleanup_closed_connections() {
        let manager = ConnectionManager::new(4);
        let (tx1, rx1) = mpsc::channel(10);
        let (tx2, _rx2) = mpsc::channel(10);

        manager.add_connection("closed".to_string(), tx1);
        manager.add_connection("open".to_string(), tx2);
        drop(rx1);

        assert_eq!(manager.cleanup_closed_connections().await, 1);
        assert!(manager.has_session("open"));
        assert!(!manager.has_session("closed"));
    }
}
