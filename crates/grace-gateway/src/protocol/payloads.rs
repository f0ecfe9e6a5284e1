//! Client payload definitions
//!
//! Defines the payload structures for client-to-server messages.

use serde::{Deserialize, Serialize};

/// Payload for op 10 (Hello)
///
/// Sent by the server immediately after connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

impl HelloPayload {
    /// Default heartbeat interval (45 seconds)
    pub const DEFAULT_HEARTBEAT_INTERVAL: u64 = 45_000;

    #[must_use]
    pub fn new() -> Self {
        Self {
            heartbeat_interval: Self::DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_interval(heartbeat_interval: u64) -> Self {
        Self { heartbeat_interval }
    }
}

impl Default for HelloPayload {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload for op 2 (Identify)
///
/// The token is optional; anonymous viewers identify without one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifyPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl IdentifyPayload {
    /// The bare token, without a `Bearer ` prefix; blank tokens count as absent
    pub fn bearer(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(|t| t.strip_prefix("Bearer ").unwrap_or(t).trim())
            .filter(|t| !t.is_empty())
    }
}

/// Payload for op 12 (Subscribe)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "query", rename_all = "snake_case")]
pub enum SubscribePayload {
    /// Feed page; `type` is `all` or a post type, absent means `all`
    Posts {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        post_type: Option<String>,
    },
    Comments { post_id: String },
    LikeCount { post_id: String },
}

/// Payload for op 13 (Unsubscribe)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsubscribePayload {
    pub subscription_id: String,
}
