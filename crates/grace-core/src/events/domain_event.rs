//! Community events - emitted after a write has committed
//!
//! These events are used for:
//! - Refreshing live queries whose result set the write may have changed
//! - Relaying changes to other server instances over pub/sub

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::PostType;
use crate::value_objects::Snowflake;

/// All change events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommunityEvent {
    PostCreated(PostCreatedEvent),
    ReactionChanged(ReactionChangedEvent),
    CommentAdded(CommentAddedEvent),
}

impl CommunityEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PostCreated(_) => "POST_CREATED",
            Self::ReactionChanged(_) => "REACTION_CHANGED",
            Self::CommentAdded(_) => "COMMENT_ADDED",
        }
    }

    /// The post this event touched
    pub fn post_id(&self) -> Snowflake {
        match self {
            Self::PostCreated(e) => e.post_id,
            Self::ReactionChanged(e) => e.post_id,
            Self::CommentAdded(e) => e.post_id,
        }
    }

    /// The type of the touched post, used to route feed refreshes
    pub fn post_type(&self) -> PostType {
        match self {
            Self::PostCreated(e) => e.post_type,
            Self::ReactionChanged(e) => e.post_type,
            Self::CommentAdded(e) => e.post_type,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::PostCreated(e) => e.timestamp,
            Self::ReactionChanged(e) => e.timestamp,
            Self::CommentAdded(e) => e.timestamp,
        }
    }

    pub fn post_created(post_id: Snowflake, post_type: PostType) -> Self {
        Self::PostCreated(PostCreatedEvent {
            post_id,
            post_type,
            timestamp: Utc::now(),
        })
    }

    pub fn reaction_changed(
        post_id: Snowflake,
        post_type: PostType,
        user_id: impl Into<String>,
        liked: bool,
    ) -> Self {
        Self::ReactionChanged(ReactionChangedEvent {
            post_id,
            post_type,
            user_id: user_id.into(),
            liked,
            timestamp: Utc::now(),
        })
    }

    pub fn comment_added(post_id: Snowflake, post_type: PostType, comment_id: Snowflake) -> Self {
        Self::CommentAdded(CommentAddedEvent {
            post_id,
            post_type,
            comment_id,
            timestamp: Utc::now(),
        })
    }
}

// ============================================================================
// Event Structs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCreatedEvent {
    pub post_id: Snowflake,
    pub post_type: PostType,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionChangedEvent {
    pub post_id: Snowflake,
    pub post_type: PostType,
    pub user_id: String,
    /// True when a like was added, false when removed
    pub liked: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAddedEvent {
    pub post_id: Snowflake,
    pub post_type: PostType,
    pub comment_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accessors() {
        let event = CommunityEvent::comment_added(
            Snowflake::new(1),
            PostType::Prayer,
            Snowflake::new(2),
        );
        assert_eq!(event.event_type(), "COMMENT_ADDED");
        assert_eq!(event.post_id(), Snowflake::new(1));
        assert_eq!(event.post_type(), PostType::Prayer);
    }

    #[test]
    fn test_event_json_shape() {
        let event =
            CommunityEvent::reaction_changed(Snowflake::new(9), PostType::Thought, "user-a", true);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "REACTION_CHANGED");
        assert_eq!(json["post_id"], "9");
        assert_eq!(json["post_type"], "thought");
        assert_eq!(json["liked"], true);

        let back: CommunityEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
