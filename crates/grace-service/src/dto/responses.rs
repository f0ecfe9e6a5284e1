//! Response DTOs for API endpoints
//!
//! All response DTOs implement `Serialize` for JSON output.
//! Snowflake IDs are serialized as strings for JavaScript compatibility.

use chrono::{DateTime, Utc};
use grace_core::Snowflake;
use serde::Serialize;

// ============================================================================
// Post Responses
// ============================================================================

/// Post with its denormalized author snapshot and counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub post_type: String,
    pub author_id: String,
    pub author_display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_avatar_url: Option<String>,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub like_count: i64,
    pub comment_count: i64,
}

/// One feed page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostPageResponse {
    pub items: Vec<PostResponse>,
    /// Absent on the last page
    pub next_cursor: Option<String>,
}

// ============================================================================
// Like Responses
// ============================================================================

/// Result of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeToggleResponse {
    pub post_id: Snowflake,
    /// New state: true when the post is now liked
    pub liked: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReactedResponse {
    pub reacted: bool,
}

/// Reaction row count next to the denormalized counter
#[derive(Debug, Clone, Serialize)]
pub struct ReactionCountResponse {
    pub post_id: String,
    pub count: i64,
    pub like_count: i64,
}

impl ReactionCountResponse {
    /// True when the counter matches the reaction rows
    pub fn is_consistent(&self) -> bool {
        self.count == self.like_count
    }
}

// ============================================================================
// Comment Responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub author_display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_avatar_url: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Health Responses
// ============================================================================

/// Basic health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

/// Health check status per dependency
#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub store: String,
    /// Absent when Redis relay is not configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis: Option<String>,
}

fn health_label(healthy: bool) -> String {
    if healthy { "healthy" } else { "unhealthy" }.to_string()
}

impl ReadinessResponse {
    pub fn ready(store_healthy: bool, redis_healthy: Option<bool>) -> Self {
        let all_healthy = store_healthy && redis_healthy.unwrap_or(true);
        Self {
            status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
            timestamp: Utc::now(),
            checks: HealthChecks {
                store: health_label(store_healthy),
                redis: redis_healthy.map(health_label),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}
