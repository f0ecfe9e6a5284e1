//! Post handlers
//!
//! Endpoints for creating posts and reading the feed.

use axum::{
    extract::{Path, State},
    Json,
};
use grace_service::{
    dto::{CreatePostRequest, PostPageResponse, PostResponse},
    PostService,
};

use crate::extractors::{AuthUser, FeedQuery, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// Create a post
///
/// POST /posts
pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreatePostRequest>,
) -> ApiResult<Created<Json<PostResponse>>> {
    let service = PostService::new(state.service_context());
    let post = service.create_post(Some(&auth.actor), request).await?;
    Ok(Created(Json(post)))
}

/// One page of the feed, newest first
///
/// GET /posts?type=&cursor=
pub async fn list_posts(
    State(state): State<AppState>,
    query: FeedQuery,
) -> ApiResult<Json<PostPageResponse>> {
    let service = PostService::new(state.service_context());
    let page = service
        .list_posts(query.filter, query.cursor.as_deref())
        .await?;
    Ok(Json(page))
}

/// Get a single post
///
/// GET /posts/{post_id}
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<Json<PostResponse>> {
    let service = PostService::new(state.service_context());
    let post = service.get_post(&post_id).await?;
    Ok(Json(post))
}
