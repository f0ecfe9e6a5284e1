//! Op code handlers
//!
//! Handles incoming WebSocket messages based on their operation code.

mod error;
mod heartbeat;
mod identify;
mod subscribe;

pub use error::{HandlerError, HandlerResult};
pub use heartbeat::HeartbeatHandler;
pub use identify::{IdentifyHandler, GATEWAY_VERSION};
pub use subscribe::{
    query_key, SubscribeHandler, UnsubscribeHandler, SUBSCRIPTION_LIMIT, UNKNOWN_SUBSCRIPTION,
};

use crate::connection::Connection;
use crate::protocol::{CloseCode, GatewayMessage, OpCode};
use crate::server::GatewayState;
use std::sync::Arc;

/// Dispatch incoming client messages to appropriate handlers
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Handle one client message; `Some(code)` asks the caller to close
    pub async fn dispatch(
        state: &GatewayState,
        connection: &Arc<Connection>,
        message: GatewayMessage,
    ) -> HandlerResult<Option<CloseCode>> {
        if !message.op.is_client_op() {
            tracing::warn!(
                session_id = %connection.session_id(),
                op = %message.op,
                "Received server-only op code from client"
            );
            return Ok(Some(CloseCode::UnknownOpcode));
        }

        match message.op {
            OpCode::Identify => {
                let payload = message.as_identify().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Identify payload".to_string())
                })?;
                IdentifyHandler::handle(state, connection, payload).await
            }
            OpCode::Heartbeat => {
                let seq = message.as_heartbeat_seq().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Heartbeat payload".to_string())
                })?;
                HeartbeatHandler::handle(connection, seq).await
            }
            OpCode::Subscribe => {
                let payload = message.as_subscribe().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Subscribe payload".to_string())
                })?;
                SubscribeHandler::handle(state, connection, payload).await
            }
            OpCode::Unsubscribe => {
                let payload = message.as_unsubscribe().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Unsubscribe payload".to_string())
                })?;
                UnsubscribeHandler::handle(connection, payload).await
            }
            // Unreachable after the is_client_op check
            _ => Ok(Some(CloseCode::UnknownOpcode)),
        }
    }
}
