//! Subscribe (op 12) and Unsubscribe (op 13) handlers
//!
//! Each accepted Subscribe opens a live query in the service registry and
//! forwards every snapshot it produces to the socket as a dispatch.

use super::{HandlerError, HandlerResult};
use crate::connection::{Connection, SubscriptionRejected};
use crate::events::{
    CommentsSnapshotEvent, GatewayEventType, LikeCountEvent, PostsSnapshotEvent, SubscribedEvent,
    SubscriptionErrorEvent,
};
use crate::protocol::{CloseCode, GatewayMessage, SubscribePayload, UnsubscribePayload};
use crate::server::GatewayState;
use grace_service::dto::{CommentResponse, PostPageResponse};
use grace_service::{
    parse_post_id, LiveResult, PostService, QueryKey, ServiceResult, Snapshot,
};
use serde::Serialize;
use std::sync::{Arc, Weak};

/// Error code sent when a connection is at its subscription limit
pub const SUBSCRIPTION_LIMIT: &str = "SUBSCRIPTION_LIMIT";
/// Error code sent for an Unsubscribe naming no held subscription
pub const UNKNOWN_SUBSCRIPTION: &str = "UNKNOWN_SUBSCRIPTION";

/// Resolve a Subscribe payload to the registry key it names
pub fn query_key(payload: &SubscribePayload) -> ServiceResult<QueryKey> {
    match payload {
        SubscribePayload::Posts { post_type } => Ok(QueryKey::Posts(PostService::parse_filter(
            post_type.as_deref(),
        )?)),
        SubscribePayload::Comments { post_id } => Ok(QueryKey::Comments(parse_post_id(post_id)?)),
        SubscribePayload::LikeCount { post_id } => {
            Ok(QueryKey::LikeCount(parse_post_id(post_id)?))
        }
    }
}

pub struct SubscribeHandler;

impl SubscribeHandler {
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: SubscribePayload,
    ) -> HandlerResult<Option<CloseCode>> {
        let key = match query_key(&payload) {
            Ok(key) => key,
            Err(e) => {
                let error = SubscriptionErrorEvent::new(None, e.error_code(), e.to_string());
                send_event(connection, GatewayEventType::SubscriptionError, &error).await?;
                return Ok(None);
            }
        };

        if !connection.has_subscription_capacity() {
            send_event(connection, GatewayEventType::SubscriptionError, &limit_error(None))
                .await?;
            return Ok(None);
        }

        // SUBSCRIBED goes out before the first snapshot can be queued
        let subscription_id = connection.next_subscription_id();
        let subscribed = SubscribedEvent {
            subscription_id: subscription_id.clone(),
            query: key.to_string(),
        };
        send_event(connection, GatewayEventType::Subscribed, &subscribed).await?;

        let subscription = state.service_context().live().subscribe(
            key,
            forward_snapshots(Arc::downgrade(connection), subscription_id.clone(), key),
        );

        match connection.add_subscription(subscription_id.clone(), subscription) {
            Ok(()) => {
                tracing::debug!(
                    session_id = %connection.session_id(),
                    subscription_id = %subscription_id,
                    query = %key,
                    "Subscription opened"
                );
            }
            Err(SubscriptionRejected::LimitReached { .. }) => {
                let error = limit_error(Some(subscription_id));
                send_event(connection, GatewayEventType::SubscriptionError, &error).await?;
            }
            // The error dispatch has already been sent
            Err(SubscriptionRejected::QueryClosed) => {}
            Err(SubscriptionRejected::ConnectionClosed) => {
                return Err(HandlerError::ConnectionClosed);
            }
        }

        Ok(None)
    }
}

pub struct UnsubscribeHandler;

impl UnsubscribeHandler {
    pub async fn handle(
        connection: &Arc<Connection>,
        payload: UnsubscribePayload,
    ) -> HandlerResult<Option<CloseCode>> {
        let subscription_id = payload.subscription_id;

        if connection.remove_subscription(&subscription_id) {
            tracing::debug!(
                session_id = %connection.session_id(),
                subscription_id = %subscription_id,
                "Subscription closed by client"
            );
            let event = SubscribedEvent {
                query: String::new(),
                subscription_id,
            };
            send_event(connection, GatewayEventType::Unsubscribed, &event).await?;
        } else {
            let error = SubscriptionErrorEvent::new(
                Some(subscription_id),
                UNKNOWN_SUBSCRIPTION,
                "No such subscription",
            );
            send_event(connection, GatewayEventType::SubscriptionError, &error).await?;
        }

        Ok(None)
    }
}

fn limit_error(subscription_id: Option<String>) -> SubscriptionErrorEvent {
    SubscriptionErrorEvent::new(
        subscription_id,
        SUBSCRIPTION_LIMIT,
        "Subscription limit reached for this connection",
    )
}

async fn send_event<T: Serialize>(
    connection: &Connection,
    event: GatewayEventType,
    payload: &T,
) -> HandlerResult<()> {
    let data = serde_json::to_value(payload)
        .map_err(|e| HandlerError::Internal(format!("Failed to encode {event}: {e}")))?;
    connection
        .send(GatewayMessage::dispatch(
            event.as_str(),
            connection.next_sequence(),
            data,
        ))
        .await
        .map_err(|_| HandlerError::ConnectionClosed)
}

/// Callback turning each live result into a dispatch on `connection`.
///
/// Holds the connection weakly; the connection owns the subscription that
/// owns this callback. After an error the subscription is detached from the
/// connection, so it no longer counts toward the limit.
fn forward_snapshots(
    connection: Weak<Connection>,
    subscription_id: String,
    key: QueryKey,
) -> impl FnMut(LiveResult<Snapshot>) + Send + 'static {
    move |result| {
        let Some(connection) = connection.upgrade() else {
            return;
        };

        let failed = result.is_err();
        let (event, data) = snapshot_dispatch(&subscription_id, key, result);
        let message = GatewayMessage::dispatch(event.as_str(), connection.next_sequence(), data);

        if let Err(e) = connection.try_send(message) {
            tracing::warn!(
                session_id = %connection.session_id(),
                subscription_id = %subscription_id,
                error = %e,
                "Dropped live update for slow or closed connection"
            );
        }

        if failed {
            connection.remove_subscription(&subscription_id);
        }
    }
}

fn snapshot_dispatch(
    subscription_id: &str,
    key: QueryKey,
    result: LiveResult<Snapshot>,
) -> (GatewayEventType, serde_json::Value) {
    let subscription_id = subscription_id.to_string();
    let encoded = match (key, result) {
        (_, Err(e)) => encode(
            GatewayEventType::SubscriptionError,
            &SubscriptionErrorEvent::new(Some(subscription_id.clone()), e.code(), e.to_string()),
        ),
        (_, Ok(Snapshot::Posts(page))) => encode(
            GatewayEventType::PostsSnapshot,
            &PostsSnapshotEvent {
                subscription_id: subscription_id.clone(),
                page: PostPageResponse::from(page),
            },
        ),
        (QueryKey::Comments(post_id), Ok(Snapshot::Comments(comments))) => encode(
            GatewayEventType::CommentsSnapshot,
            &CommentsSnapshotEvent {
                subscription_id: subscription_id.clone(),
                post_id,
                comments: comments.into_iter().map(CommentResponse::from).collect(),
            },
        ),
        (QueryKey::LikeCount(post_id), Ok(Snapshot::LikeCount(like_count))) => encode(
            GatewayEventType::LikeCount,
            &LikeCountEvent {
                subscription_id: subscription_id.clone(),
                post_id,
                like_count,
            },
        ),
        (key, Ok(snapshot)) => Err(format!("{} snapshot for {key}", snapshot.kind())),
    };

    encoded.unwrap_or_else(|message| {
        tracing::error!(subscription_id = %subscription_id, error = %message, "Unencodable snapshot");
        let error = SubscriptionErrorEvent::new(Some(subscription_id), "QUERY_FAILED", message);
        (
            GatewayEventType::SubscriptionError,
            serde_json::to_value(error).unwrap_or_default(),
        )
    })
}

fn encode<T: Serialize>(
    event: GatewayEventType,
    payload: &T,
) -> Result<(GatewayEventType, serde_json::Value), String> {
    serde_json::to_value(payload)
        .map(|data| (event, data))
        .map_err(|e| e.to_string())
}
