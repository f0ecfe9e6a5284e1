//! Comment entity - append-only reply attached to a post

use chrono::{DateTime, Utc};

use super::AuthorSnapshot;
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Comment entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: Snowflake,
    pub post_id: Snowflake,
    pub author: AuthorSnapshot,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub const MAX_CONTENT_LEN: usize = 2000;
}

/// Validated input for appending a comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub id: Snowflake,
    pub post_id: Snowflake,
    pub author: AuthorSnapshot,
    pub content: String,
}

impl NewComment {
    /// Build a new comment, trimming and validating content
    pub fn new(
        id: Snowflake,
        post_id: Snowflake,
        author: AuthorSnapshot,
        content: &str,
    ) -> Result<Self, DomainError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::ValidationError(
                "Comment must not be empty".to_string(),
            ));
        }
        if content.chars().count() > Comment::MAX_CONTENT_LEN {
            return Err(DomainError::ContentTooLong {
                max: Comment::MAX_CONTENT_LEN,
            });
        }

        Ok(Self {
            id,
            post_id,
            author,
            content: content.to_string(),
        })
    }
}
