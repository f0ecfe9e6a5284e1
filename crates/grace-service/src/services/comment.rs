//! Comment service
//!
//! Appends comments and lists them per post.

use grace_core::entities::{AuthorSnapshot, NewComment};
use grace_core::{Actor, CommunityEvent};
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{AddCommentRequest, CommentResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::ids::parse_post_id;
use super::post::require_actor;

/// Comment service
pub struct CommentService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> CommentService<'a> {
    /// Create a new CommentService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Append a comment to a post
    #[instrument(skip(self, actor, request))]
    pub async fn add_comment(
        &self,
        post_id: &str,
        actor: Option<&Actor>,
        request: AddCommentRequest,
    ) -> ServiceResult<CommentResponse> {
        let actor = require_actor(actor)?;
        let post_id = parse_post_id(post_id)?;
        request.validate()?;

        let new_comment = NewComment::new(
            self.ctx.generate_id(),
            post_id,
            AuthorSnapshot::from(actor),
            &request.content,
        )?;

        let post = self
            .ctx
            .post_repo()
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Post", post_id.to_string()))?;

        // The store re-checks the post inside the write batch
        let comment = self.ctx.comment_repo().create(&new_comment).await?;

        info!(
            post_id = %post_id,
            comment_id = %comment.id,
            author_id = %actor.user_id,
            "Comment added"
        );
        self.ctx
            .feed()
            .emit(CommunityEvent::comment_added(post_id, post.post_type, comment.id))
            .await;

        Ok(CommentResponse::from(comment))
    }

    /// Every comment on a post, newest first
    #[instrument(skip(self))]
    pub async fn list_comments(&self, post_id: &str) -> ServiceResult<Vec<CommentResponse>> {
        let post_id = parse_post_id(post_id)?;
        let comments = self.ctx.comment_repo().list_by_post(post_id).await?;
        Ok(comments.into_iter().map(CommentResponse::from).collect())
    }
}
