//! Connection management
//!
//! Tracks WebSocket connections and the live subscriptions each one holds.

mod connection;
mod manager;

pub use connection::{Connection, ConnectionState, SubscriptionRejected};
pub use manager::ConnectionManager;
