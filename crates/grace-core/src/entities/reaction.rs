//! Reaction entity - one user's like on one post

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// Reaction entity
///
/// Keyed uniquely by `(post_id, user_id)`. Created or deleted, never updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub post_id: Snowflake,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Reaction {
    /// Create a new Reaction stamped with the current time
    pub fn new(post_id: Snowflake, user_id: impl Into<String>) -> Self {
        Self {
            post_id,
            user_id: user_id.into(),
            created_at: Utc::now(),
        }
    }

    /// The uniqueness key
    #[inline]
    pub fn key(&self) -> (Snowflake, &str) {
        (self.post_id, self.user_id.as_str())
    }
}

/// Result of a reaction write batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionWrite {
    /// The reaction row changed and the counter delta was applied with it
    Applied,
    /// Nothing changed: the row already existed (insert) or was already gone (delete)
    Unchanged,
}

impl ReactionWrite {
    #[inline]
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}
