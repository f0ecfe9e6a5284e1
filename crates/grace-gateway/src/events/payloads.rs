//! Event payload definitions
//!
//! Data carried by each dispatch the gateway sends.

use grace_core::{Actor, Snowflake};
use grace_service::dto::{CommentResponse, PostPageResponse};
use serde::{Deserialize, Serialize};

/// READY event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyEvent {
    /// Gateway protocol version
    pub v: i32,
    pub session_id: String,
    /// Absent for anonymous viewers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Actor>,
}

/// SUBSCRIBED / UNSUBSCRIBED payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribedEvent {
    pub subscription_id: String,
    /// Canonical query key, e.g. `like_count:42`; omitted on UNSUBSCRIBED
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostsSnapshotEvent {
    pub subscription_id: String,
    #[serde(flatten)]
    pub page: PostPageResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentsSnapshotEvent {
    pub subscription_id: String,
    pub post_id: Snowflake,
    pub comments: Vec<CommentResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeCountEvent {
    pub subscription_id: String,
    pub post_id: Snowflake,
    pub like_count: i64,
}

/// SUBSCRIPTION_ERROR payload.
///
/// `subscription_id` is absent when the Subscribe itself was refused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionErrorEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    pub code: String,
    pub message: String,
}

impl SubscriptionErrorEvent {
    pub fn new(
        subscription_id: Option<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id,
            code: code.into(),
            message: message.into(),
        }
    }
}
