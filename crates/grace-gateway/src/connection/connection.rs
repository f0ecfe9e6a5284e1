//! Individual WebSocket connection
//!
//! Represents a single WebSocket connection, its identity, and the live
//! subscriptions it holds.

use crate::protocol::GatewayMessage;
use grace_core::Actor;
use grace_service::Subscription;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, RwLock};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Connection established, waiting for Identify
    Connecting,
    /// Identify received (with or without a token)
    Identified,
    /// Connection is closed
    Disconnected,
}

/// Why a subscription could not be attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionRejected {
    LimitReached { limit: usize },
    /// The socket is gone
    ConnectionClosed,
    /// The query already failed and delivered its error
    QueryClosed,
}

/// A single WebSocket connection
pub struct Connection {
    session_id: String,

    /// Verified identity; `None` for anonymous viewers
    actor: RwLock<Option<Actor>>,

    state: RwLock<ConnectionState>,

    /// Channel to send messages to the WebSocket
    sender: mpsc::Sender<GatewayMessage>,

    /// Last sequence number sent
    sequence: AtomicU64,

    /// Last heartbeat received
    last_heartbeat: RwLock<Instant>,

    /// Live subscriptions by id
    subscriptions: Mutex<HashMap<String, Subscription>>,
    next_subscription: AtomicU64,
    max_subscriptions: usize,

    created_at: Instant,
}

impl Connection {
    pub fn new(
        session_id: String,
        sender: mpsc::Sender<GatewayMessage>,
        max_subscriptions: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            session_id,
            actor: RwLock::new(None),
            state: RwLock::new(ConnectionState::Connecting),
            sender,
            sequence: AtomicU64::new(0),
            last_heartbeat: RwLock::new(Instant::now()),
            subscriptions: Mutex::new(HashMap::new()),
            next_subscription: AtomicU64::new(0),
            max_subscriptions,
            created_at: Instant::now(),
        })
    }

    /// Generate a new random session ID
    pub fn generate_session_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn actor(&self) -> Option<Actor> {
        self.actor.read().await.clone()
    }

    /// Record the Identify; `actor` is `None` for anonymous viewers
    pub async fn identify(&self, actor: Option<Actor>) {
        *self.actor.write().await = actor;
        *self.state.write().await = ConnectionState::Identified;
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    pub async fn set_state(&self, state: ConnectionState) {
        *self.state.write().await = state;
    }

    pub async fn is_identified(&self) -> bool {
        self.state().await == ConnectionState::Identified
    }

    /// Get the next sequence number
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    pub async fn record_heartbeat(&self) {
        *self.last_heartbeat.write().await = Instant::now();
    }

    pub async fn time_since_heartbeat(&self) -> std::time::Duration {
        self.last_heartbeat.read().await.elapsed()
    }

    /// Reserve the next subscription id
    pub fn next_subscription_id(&self) -> String {
        (self.next_subscription.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    /// Whether another subscription fits under the per-connection limit
    pub fn has_subscription_capacity(&self) -> bool {
        self.subscriptions.lock().len() < self.max_subscriptions
    }

    /// Attach a subscription under `id`.
    ///
    /// A rejected subscription is unsubscribed before returning.
    pub fn add_subscription(
        &self,
        id: String,
        subscription: Subscription,
    ) -> Result<(), SubscriptionRejected> {
        let mut subscriptions = self.subscriptions.lock();
        if self.is_closed() {
            drop(subscriptions);
            subscription.unsubscribe();
            return Err(SubscriptionRejected::ConnectionClosed);
        }
        if !subscription.is_active() {
            drop(subscriptions);
            subscription.unsubscribe();
            return Err(SubscriptionRejected::QueryClosed);
        }
        if subscriptions.len() >= self.max_subscriptions {
            drop(subscriptions);
            subscription.unsubscribe();
            return Err(SubscriptionRejected::LimitReached {
                limit: self.max_subscriptions,
            });
        }
        subscriptions.insert(id, subscription);
        Ok(())
    }

    /// Detach and release one subscription; false when the id is unknown
    pub fn remove_subscription(&self, id: &str) -> bool {
        let removed = self.subscriptions.lock().remove(id);
        match removed {
            Some(subscription) => {
                subscription.unsubscribe();
                true
            }
            None => false,
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    /// Release every subscription this connection holds
    pub fn release_subscriptions(&self) -> usize {
        let drained: Vec<Subscription> = self.subscriptions.lock().drain().map(|(_, s)| s).collect();
        let count = drained.len();
        for subscription in drained {
            subscription.unsubscribe();
        }
        count
    }

    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    /// Send a message to this connection
    pub async fn send(
        &self,
        message: GatewayMessage,
    ) -> Result<(), mpsc::error::SendError<GatewayMessage>> {
        self.sender.send(message).await
    }

    /// Try to send a message (non-blocking)
    pub fn try_send(
        &self,
        message: GatewayMessage,
    ) -> Result<(), mpsc::error::TrySendError<GatewayMessage>> {
        self.sender.try_send(message)
    }

    /// Check if the sender channel is closed
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("session_id", &self.session_id)
            .field("sequence", &self.sequence.load(Ordering::SeqCst))
            .field("subscriptions", &self.subscription_count())
            .field("created_at", &self.created_at)
            .finish()
    }
}
