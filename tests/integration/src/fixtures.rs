//! Test fixtures and data generators
//!
//! Request bodies sent to the API and the response shapes read back.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Unique user id so runs against a shared database do not collide
pub fn unique_user(prefix: &str) -> String {
    format!("{prefix}-{}-{}", std::process::id(), unique_suffix())
}

/// Create post request
#[derive(Debug, Serialize)]
pub struct CreatePostRequest {
    #[serde(rename = "type")]
    pub post_type: String,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_token: Option<String>,
}

impl CreatePostRequest {
    pub fn new(post_type: &str) -> Self {
        let suffix = unique_suffix();
        Self {
            post_type: post_type.to_string(),
            title: format!("Post {suffix}"),
            content: format!("Shared with the community ({suffix})"),
            client_token: None,
        }
    }

    pub fn with_client_token(mut self, token: impl Into<String>) -> Self {
        self.client_token = Some(token.into());
        self
    }
}

/// Post response
#[derive(Debug, Clone, Deserialize)]
pub struct PostResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub post_type: String,
    pub author_id: String,
    pub author_display_name: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub like_count: i64,
    pub comment_count: i64,
}

/// One feed page
#[derive(Debug, Deserialize)]
pub struct PostPage {
    pub items: Vec<PostResponse>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LikeToggleResponse {
    pub post_id: String,
    pub liked: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReactedResponse {
    pub reacted: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReactionCountResponse {
    pub post_id: String,
    pub count: i64,
    pub like_count: i64,
}

/// Add comment request
#[derive(Debug, Serialize)]
pub struct AddCommentRequest {
    pub content: String,
}

impl AddCommentRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentResponse {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub content: String,
}

/// Error envelope returned on every failure
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}
