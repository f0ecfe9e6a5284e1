//! Like handlers

use axum::{
    extract::{Path, State},
    Json,
};
use grace_service::{
    dto::{LikeToggleResponse, ReactedResponse, ReactionCountResponse},
    LikeService,
};

use crate::extractors::{AuthUser, OptionalAuthUser};
use crate::response::ApiResult;
use crate::state::AppState;

/// Flip the caller's like
///
/// PUT /posts/{post_id}/like
pub async fn toggle_like(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<String>,
) -> ApiResult<Json<LikeToggleResponse>> {
    let service = LikeService::new(state.service_context());
    let result = service.toggle_like(&post_id, Some(auth.user_id())).await?;
    Ok(Json(result))
}

/// Whether the caller has liked the post; anonymous callers get `false`
///
/// GET /posts/{post_id}/like
pub async fn has_reacted(
    State(state): State<AppState>,
    auth: OptionalAuthUser,
    Path(post_id): Path<String>,
) -> Json<ReactedResponse> {
    let service = LikeService::new(state.service_context());
    let reacted = service.has_reacted(&post_id, auth.user_id()).await;
    Json(ReactedResponse { reacted })
}

/// Reaction rows next to the denormalized counter
///
/// GET /posts/{post_id}/reactions/count
pub async fn reaction_count(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<Json<ReactionCountResponse>> {
    let service = LikeService::new(state.service_context());
    Ok(Json(service.reaction_summary(&post_id).await?))
}
