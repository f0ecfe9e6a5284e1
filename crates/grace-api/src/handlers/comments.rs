//! Comment handlers

use axum::{
    extract::{Path, State},
    Json,
};
use grace_service::{
    dto::{AddCommentRequest, CommentResponse},
    CommentService,
};

use crate::extractors::{AuthUser, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// Append a comment
///
/// POST /posts/{post_id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<String>,
    ValidatedJson(request): ValidatedJson<AddCommentRequest>,
) -> ApiResult<Created<Json<CommentResponse>>> {
    let service = CommentService::new(state.service_context());
    let comment = service
        .add_comment(&post_id, Some(&auth.actor), request)
        .await?;
    Ok(Created(Json(comment)))
}

/// Every comment on a post, newest first
///
/// GET /posts/{post_id}/comments
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<Json<Vec<CommentResponse>>> {
    let service = CommentService::new(state.service_context());
    Ok(Json(service.list_comments(&post_id).await?))
}
