//! # grace-gateway
//!
//! WebSocket gateway pushing live query snapshots to clients.
//!
//! A client connects to `/gateway`, receives Hello, optionally identifies,
//! and then subscribes to the post feed, a post's comments, or a post's like
//! count. Every subscription gets its current snapshot at once and a fresh
//! one after each change.

pub mod connection;
pub mod events;
pub mod handlers;
pub mod protocol;
pub mod relay;
pub mod server;

pub use server::{create_app, create_gateway_state, run, GatewayState};
