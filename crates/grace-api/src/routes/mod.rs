//! Route definitions
//!
//! All API routes organized by domain and mounted under /api/v1.

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::{comments, health, likes, posts};
use crate::state::AppState;

/// Create the main API router with all routes (excluding health for separate middleware handling)
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes())
}

/// Health check routes (exported separately to bypass rate limiting)
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(post_routes())
        .merge(like_routes())
        .merge(comment_routes())
}

/// Post routes
fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(posts::create_post).get(posts::list_posts))
        .route("/posts/:post_id", get(posts::get_post))
}

/// Like routes
fn like_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/posts/:post_id/like",
            put(likes::toggle_like).get(likes::has_reacted),
        )
        .route("/posts/:post_id/reactions/count", get(likes::reaction_count))
}

/// Comment routes
fn comment_routes() -> Router<AppState> {
    Router::new().route(
        "/posts/:post_id/comments",
        post(comments::add_comment).get(comments::list_comments),
    )
}
