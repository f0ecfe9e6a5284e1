//! Post service
//!
//! Handles post creation, the paginated feed, and single-post lookup.

use std::str::FromStr;

use grace_core::entities::{AuthorSnapshot, NewPost, PostType};
use grace_core::value_objects::{FeedCursor, Page, PostFilter, FEED_PAGE_SIZE};
use grace_core::{Actor, CommunityEvent};
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{CreatePostRequest, PostPageResponse, PostResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::ids::parse_post_id;

/// Post service
pub struct PostService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PostService<'a> {
    /// Create a new PostService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a post authored by `actor`.
    ///
    /// Every check runs before the write. A retry carrying an already used
    /// client token returns the original post and announces nothing.
    #[instrument(skip(self, actor, request), fields(post_type = %request.post_type))]
    pub async fn create_post(
        &self,
        actor: Option<&Actor>,
        request: CreatePostRequest,
    ) -> ServiceResult<PostResponse> {
        let actor = require_actor(actor)?;
        request.validate()?;

        let post_type = PostType::from_str(&request.post_type)?;
        let new_post = NewPost::new(
            self.ctx.generate_id(),
            post_type,
            AuthorSnapshot::from(actor),
            &request.title,
            &request.content,
        )?
        .with_client_token(request.client_token);

        let write = self.ctx.post_repo().create(&new_post).await?;

        if write.created {
            info!(
                post_id = %write.post.id,
                post_type = %post_type,
                author_id = %actor.user_id,
                "Post created"
            );
            self.ctx
                .feed()
                .emit(CommunityEvent::post_created(write.post.id, post_type))
                .await;
        } else {
            info!(post_id = %write.post.id, "Post creation replayed from client token");
        }

        Ok(PostResponse::from(write.post))
    }

    /// One feed page, newest first
    #[instrument(skip(self))]
    pub async fn list_posts(
        &self,
        filter: PostFilter,
        cursor: Option<&str>,
    ) -> ServiceResult<PostPageResponse> {
        let cursor = match cursor.map(str::trim).filter(|c| !c.is_empty()) {
            Some(raw) => Some(
                FeedCursor::decode(raw).map_err(|_| ServiceError::validation("Malformed cursor"))?,
            ),
            None => None,
        };

        let rows = self
            .ctx
            .post_repo()
            .list(filter, cursor, FEED_PAGE_SIZE + 1)
            .await?;

        Ok(PostPageResponse::from(Page::from_overfetch(rows, FEED_PAGE_SIZE)))
    }

    /// Parse a feed filter from its query-string form
    pub fn parse_filter(raw: Option<&str>) -> ServiceResult<PostFilter> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Ok(PostFilter::from_str(raw)?),
            None => Ok(PostFilter::All),
        }
    }

    /// Get a post by ID
    #[instrument(skip(self))]
    pub async fn get_post(&self, post_id: &str) -> ServiceResult<PostResponse> {
        let id = parse_post_id(post_id)?;
        let post = self
            .ctx
            .post_repo()
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Post", id.to_string()))?;

        Ok(PostResponse::from(post))
    }
}

/// Reject missing and anonymous actors
pub(crate) fn require_actor(actor: Option<&Actor>) -> ServiceResult<&Actor> {
    actor
        .filter(|a| a.is_authenticated())
        .ok_or(ServiceError::Unauthenticated)
}
