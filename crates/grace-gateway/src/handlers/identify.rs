//! Identify handler (op 2)

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::events::{GatewayEventType, ReadyEvent};
use crate::protocol::{CloseCode, GatewayMessage, IdentifyPayload};
use crate::server::GatewayState;
use std::sync::Arc;

/// Protocol version reported in READY
pub const GATEWAY_VERSION: i32 = 1;

pub struct IdentifyHandler;

impl IdentifyHandler {
    /// Attach the caller's identity, if any, and answer with READY.
    ///
    /// A missing token identifies an anonymous viewer; a present but invalid
    /// one closes the connection.
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: IdentifyPayload,
    ) -> HandlerResult<Option<CloseCode>> {
        if connection.is_identified().await {
            tracing::warn!(
                session_id = %connection.session_id(),
                "Client sent Identify twice"
            );
            return Err(HandlerError::AlreadyIdentified);
        }

        let actor = match payload.bearer() {
            Some(token) => Some(state.verifier().verify(token).map_err(|e| {
                tracing::debug!(error = %e, "Token validation failed");
                HandlerError::AuthenticationFailed(e)
            })?),
            None => None,
        };

        connection.identify(actor.clone()).await;

        tracing::info!(
            session_id = %connection.session_id(),
            user_id = actor.as_ref().map_or("anonymous", |a| a.user_id.as_str()),
            "Connection identified"
        );

        let ready = ReadyEvent {
            v: GATEWAY_VERSION,
            session_id: connection.session_id().to_string(),
            user: actor,
        };
        let data = serde_json::to_value(&ready)
            .map_err(|e| HandlerError::Internal(format!("Failed to encode READY: {e}")))?;

        connection
            .send(GatewayMessage::dispatch(
                GatewayEventType::Ready.as_str(),
                connection.next_sequence(),
                data,
            ))
            .await
            .map_err(|_| HandlerError::ConnectionClosed)?;

        Ok(None)
    }
}
