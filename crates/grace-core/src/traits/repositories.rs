//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs from the store and the
//! infrastructure layer provides the implementation. Every store must:
//! - assign `created_at` itself at write time
//! - enforce uniqueness of the `(post_id, user_id)` reaction key
//! - apply counter changes as relative deltas in the same atomic batch as
//!   the reaction or comment write that causes them

use async_trait::async_trait;

use crate::entities::{Comment, NewComment, NewPost, Post, PostWrite, ReactionWrite};
use crate::error::DomainError;
use crate::value_objects::{FeedCursor, PostFilter, Snowflake};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Post Repository
// ============================================================================

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post with zeroed counters.
    ///
    /// When `client_token` is set and the author already created a post with
    /// the same token, the existing post is returned with `created == false`.
    async fn create(&self, post: &NewPost) -> RepoResult<PostWrite>;

    /// Find post by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Post>>;

    /// Posts matching `filter` strictly after `cursor`, in feed order
    /// (`created_at DESC, id DESC`), at most `limit` rows.
    async fn list(
        &self,
        filter: PostFilter,
        cursor: Option<FeedCursor>,
        limit: i64,
    ) -> RepoResult<Vec<Post>>;
}

// ============================================================================
// Reaction Repository
// ============================================================================

#[async_trait]
pub trait ReactionRepository: Send + Sync {
    /// Check whether `user_id` has liked `post_id`
    async fn exists(&self, post_id: Snowflake, user_id: &str) -> RepoResult<bool>;

    /// Insert the reaction and, only if a row was inserted, add 1 to the
    /// post's `like_count`, as one atomic batch.
    ///
    /// Returns `PostNotFound` when the post does not exist.
    async fn add(&self, post_id: Snowflake, user_id: &str) -> RepoResult<ReactionWrite>;

    /// Delete the reaction and, only if a row was deleted, subtract 1 from
    /// the post's `like_count`, as one atomic batch.
    async fn remove(&self, post_id: Snowflake, user_id: &str) -> RepoResult<ReactionWrite>;

    /// Count reaction rows for a post, independent of `like_count`
    async fn count(&self, post_id: Snowflake) -> RepoResult<i64>;
}

// ============================================================================
// Comment Repository
// ============================================================================

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert the comment and add 1 to the post's `comment_count`, as one
    /// atomic batch.
    ///
    /// Returns `PostNotFound` when the post does not exist.
    async fn create(&self, comment: &NewComment) -> RepoResult<Comment>;

    /// All comments on a post, newest first (ties by id descending)
    async fn list_by_post(&self, post_id: Snowflake) -> RepoResult<Vec<Comment>>;

    /// Count comment rows for a post, independent of `comment_count`
    async fn count(&self, post_id: Snowflake) -> RepoResult<i64>;
}
