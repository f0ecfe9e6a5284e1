//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.
//! Blank-after-trim checks live on the domain constructors, which also run
//! for callers that bypass these DTOs.

use serde::Deserialize;
use validator::Validate;

// ============================================================================
// Post Requests
// ============================================================================

/// Create post request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostRequest {
    /// `prayer`, `testimony` or `thought`
    #[serde(rename = "type")]
    pub post_type: String,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 4000, message = "Content must be 1-4000 characters"))]
    pub content: String,

    /// Retry key; a second submission with the same key returns the first post
    #[validate(length(min = 1, max = 64, message = "Client token must be 1-64 characters"))]
    pub client_token: Option<String>,
}

impl CreatePostRequest {
    pub fn new(post_type: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            post_type: post_type.into(),
            title: title.into(),
            content: content.into(),
            client_token: None,
        }
    }

    #[must_use]
    pub fn with_client_token(mut self, token: impl Into<String>) -> Self {
        self.client_token = Some(token.into());
        self
    }
}

/// Feed query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPostsQuery {
    /// `all` (default) or a post type
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    /// Opaque cursor from a previous page
    pub cursor: Option<String>,
}

// ============================================================================
// Comment Requests
// ============================================================================

/// Add comment request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddCommentRequest {
    #[validate(length(min = 1, max = 2000, message = "Comment must be 1-2000 characters"))]
    pub content: String,
}

impl AddCommentRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}
