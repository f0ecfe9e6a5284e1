//! Live query keys, snapshots, and errors

use std::fmt;

use grace_core::entities::{Comment, Post};
use grace_core::error::DomainError;
use grace_core::events::CommunityEvent;
use grace_core::value_objects::{Page, PostFilter, Snowflake};

/// Shape of a live query; one registry entry exists per distinct key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// First feed page for a type filter
    Posts(PostFilter),
    /// All comments on a post
    Comments(Snowflake),
    /// Denormalized like counter of a post
    LikeCount(Snowflake),
}

impl QueryKey {
    /// Keys whose result set may have changed because of `event`
    pub fn affected_by(event: &CommunityEvent) -> Vec<QueryKey> {
        let [all, typed] = PostFilter::affected_by(event.post_type());
        let mut keys = vec![Self::Posts(all), Self::Posts(typed)];

        match event {
            CommunityEvent::PostCreated(_) => {}
            CommunityEvent::ReactionChanged(e) => keys.push(Self::LikeCount(e.post_id)),
            CommunityEvent::CommentAdded(e) => keys.push(Self::Comments(e.post_id)),
        }
        keys
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Posts(filter) => write!(f, "posts:{filter}"),
            Self::Comments(id) => write!(f, "comments:{id}"),
            Self::LikeCount(id) => write!(f, "like_count:{id}"),
        }
    }
}

/// Full result set of a live query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Posts(Page<Post>),
    Comments(Vec<Comment>),
    LikeCount(i64),
}

impl Snapshot {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Posts(_) => "posts",
            Self::Comments(_) => "comments",
            Self::LikeCount(_) => "like_count",
        }
    }

    pub fn into_posts(self) -> LiveResult<Page<Post>> {
        match self {
            Self::Posts(page) => Ok(page),
            other => Err(other.mismatch("posts")),
        }
    }

    pub fn into_comments(self) -> LiveResult<Vec<Comment>> {
        match self {
            Self::Comments(comments) => Ok(comments),
            other => Err(other.mismatch("comments")),
        }
    }

    pub fn into_like_count(self) -> LiveResult<i64> {
        match self {
            Self::LikeCount(count) => Ok(count),
            other => Err(other.mismatch("like_count")),
        }
    }

    fn mismatch(&self, expected: &str) -> LiveError {
        LiveError::Query(format!("expected {expected} snapshot, got {}", self.kind()))
    }
}

/// Terminal failure of a live query
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiveError {
    #[error("Unknown post: {0}")]
    PostNotFound(Snowflake),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Query failed: {0}")]
    Query(String),
}

impl LiveError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::PostNotFound(_) => "UNKNOWN_POST",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Query(_) => "QUERY_FAILED",
        }
    }
}

impl From<DomainError> for LiveError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::PostNotFound(id) => Self::PostNotFound(id),
            e if e.is_unavailable() => Self::StoreUnavailable(e.to_string()),
            e => Self::Query(e.to_string()),
        }
    }
}

/// What a subscriber's callback receives
pub type LiveResult<T> = Result<T, LiveError>;
