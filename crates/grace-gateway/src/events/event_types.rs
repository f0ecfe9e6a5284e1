//! Gateway event types
//!
//! Event names sent in the `t` field of dispatch messages.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayEventType {
    /// Sent after Identify
    Ready,
    /// A Subscribe was accepted
    Subscribed,
    /// An Unsubscribe was applied
    Unsubscribed,
    /// Current first feed page for a posts subscription
    PostsSnapshot,
    /// Current comments for a comments subscription
    CommentsSnapshot,
    /// Current counter for a like_count subscription
    LikeCount,
    /// A subscription was refused or has closed after a query error
    SubscriptionError,
}

impl GatewayEventType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Subscribed => "SUBSCRIBED",
            Self::Unsubscribed => "UNSUBSCRIBED",
            Self::PostsSnapshot => "POSTS_SNAPSHOT",
            Self::CommentsSnapshot => "COMMENTS_SNAPSHOT",
            Self::LikeCount => "LIKE_COUNT",
            Self::SubscriptionError => "SUBSCRIPTION_ERROR",
        }
    }
}

impl fmt::Display for GatewayEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
