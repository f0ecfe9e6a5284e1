//! Redis Pub/Sub publisher.
//!
//! Publishes committed community changes so other instances can refresh
//! their live queries.

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::PubSubChannel;
use grace_core::CommunityEvent;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

/// Event wrapper for Pub/Sub messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubSubEvent {
    /// Event type name (e.g., "POST_CREATED", "REACTION_CHANGED")
    pub event_type: String,
    /// Event payload
    pub data: serde_json::Value,
    /// Instance that published the event, so it can skip its own echo
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl PubSubEvent {
    /// Create a new event
    #[must_use]
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            origin: None,
        }
    }

    /// Wrap a community change event
    pub fn community(event: &CommunityEvent) -> Result<Self, serde_json::Error> {
        Ok(Self::new(event.event_type(), serde_json::to_value(event)?))
    }

    /// Tag the publishing instance
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// True when this event was published by `instance`
    #[must_use]
    pub fn is_from(&self, instance: &str) -> bool {
        self.origin.as_deref() == Some(instance)
    }

    /// Decode the payload back into a community event
    pub fn to_community(&self) -> Result<CommunityEvent, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Redis Pub/Sub publisher
#[derive(Clone, Debug)]
pub struct Publisher {
    pool: RedisPool,
    origin: String,
}

impl Publisher {
    /// Create a new publisher tagging events with `origin`
    #[must_use]
    pub fn new(pool: RedisPool, origin: impl Into<String>) -> Self {
        Self {
            pool,
            origin: origin.into(),
        }
    }

    /// Instance id stamped on published events
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Publish an event to a channel
    pub async fn publish(&self, channel: &PubSubChannel, event: &PubSubEvent) -> RedisResult<u32> {
        let mut conn = self.pool.get().await?;
        let channel_name = channel.name();
        let payload = event.to_json()?;

        let receivers: u32 = conn.publish(&channel_name, &payload).await?;

        tracing::debug!(
            channel = %channel_name,
            event_type = %event.event_type,
            receivers = receivers,
            "Published event"
        );

        Ok(receivers)
    }

    /// Publish a committed community change on the shared channel
    pub async fn publish_community(&self, event: &CommunityEvent) -> RedisResult<u32> {
        let wrapped = PubSubEvent::community(event)?.with_origin(self.origin.as_str());
        self.publish(&PubSubChannel::community(), &wrapped).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grace_core::{PostType, Snowflake};

    #[test]
    fn test_community_event_round_trip() {
        let event = CommunityEvent::post_created(Snowflake::new(7), PostType::Testimony);
        let wrapped = PubSubEvent::community(&event).unwrap().with_origin("node-a");

        assert_eq!(wrapped.event_type, "POST_CREATED");
        assert!(wrapped.is_from("node-a"));
        assert!(!wrapped.is_from("node-b"));
        assert_eq!(wrapped.to_community().unwrap(), event);
    }

    #[test]
    fn test_origin_omitted_when_unset() {
        let event = PubSubEvent::new("TEST", serde_json::json!({"key": "value"}));
        let json = event.to_json().unwrap();

        assert!(json.contains("\"event_type\":\"TEST\""));
        assert!(!json.contains("origin"));
    }
}
