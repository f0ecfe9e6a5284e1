//! Post entity - a timeline item of type prayer, testimony, or thought

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::{Actor, Snowflake};

/// Closed set of post kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Prayer,
    Testimony,
    Thought,
}

impl PostType {
    /// All post types, in display order
    pub const ALL: [PostType; 3] = [Self::Prayer, Self::Testimony, Self::Thought];

    /// Storage / wire representation
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prayer => "prayer",
            Self::Testimony => "testimony",
            Self::Thought => "thought",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prayer" => Ok(Self::Prayer),
            "testimony" => Ok(Self::Testimony),
            "thought" => Ok(Self::Thought),
            other => Err(DomainError::ValidationError(format!(
                "Unknown post type: {other}"
            ))),
        }
    }
}

/// Author fields copied onto a post or comment at write time.
///
/// Never updated retroactively when the author's profile changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSnapshot {
    pub id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl From<&Actor> for AuthorSnapshot {
    fn from(actor: &Actor) -> Self {
        Self {
            id: actor.user_id.clone(),
            display_name: actor.display_name.clone(),
            avatar_url: actor.avatar_url.clone(),
        }
    }
}

/// Post entity
///
/// Immutable after creation except for the two denormalized counters,
/// which only ever move by relative deltas applied by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: Snowflake,
    pub post_type: PostType,
    pub author: AuthorSnapshot,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub like_count: i64,
    pub comment_count: i64,
}

impl Post {
    pub const MAX_TITLE_LEN: usize = 200;
    pub const MAX_CONTENT_LEN: usize = 4000;

    /// Sort key used for feed ordering and cursors
    #[inline]
    pub fn sort_key(&self) -> (DateTime<Utc>, Snowflake) {
        (self.created_at, self.id)
    }

    /// Check whether this post matches a type filter
    #[inline]
    pub fn is_type(&self, post_type: PostType) -> bool {
        self.post_type == post_type
    }
}

/// Validated input for inserting a post.
///
/// The store assigns `created_at` and starts both counters at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub id: Snowflake,
    pub post_type: PostType,
    pub author: AuthorSnapshot,
    pub title: String,
    pub content: String,
    pub client_token: Option<String>,
}

impl NewPost {
    /// Build a new post, trimming and validating title and content
    pub fn new(
        id: Snowflake,
        post_type: PostType,
        author: AuthorSnapshot,
        title: &str,
        content: &str,
    ) -> Result<Self, DomainError> {
        let title = title.trim();
        let content = content.trim();

        if title.is_empty() {
            return Err(DomainError::ValidationError("Title must not be empty".to_string()));
        }
        if content.is_empty() {
            return Err(DomainError::ValidationError("Content must not be empty".to_string()));
        }
        if title.chars().count() > Post::MAX_TITLE_LEN {
            return Err(DomainError::ContentTooLong { max: Post::MAX_TITLE_LEN });
        }
        if content.chars().count() > Post::MAX_CONTENT_LEN {
            return Err(DomainError::ContentTooLong { max: Post::MAX_CONTENT_LEN });
        }

        Ok(Self {
            id,
            post_type,
            author,
            title: title.to_string(),
            content: content.to_string(),
            client_token: None,
        })
    }

    /// Attach a client idempotency token
    #[must_use]
    pub fn with_client_token(mut self, token: Option<String>) -> Self {
        self.client_token = token.filter(|t| !t.trim().is_empty());
        self
    }
}

/// Outcome of a post insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostWrite {
    pub post: Post,
    /// False when an earlier insert with the same client token was returned
    pub created: bool,
}
