//! Like service
//!
//! Implements the like toggle protocol. The toggle reads the current state
//! under a deadline, then applies one atomic add or remove batch whose
//! counter delta only lands when the reaction row actually changed.

use grace_core::entities::{Post, ReactionWrite};
use grace_core::{CommunityEvent, Snowflake};
use tracing::{info, instrument, warn};

use crate::dto::{LikeToggleResponse, ReactionCountResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::ids::{normalize_user_id, parse_post_id};

/// Like service
pub struct LikeService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> LikeService<'a> {
    /// Create a new LikeService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Flip `user_id`'s like on a post
    #[instrument(skip(self))]
    pub async fn toggle_like(
        &self,
        post_id: &str,
        user_id: Option<&str>,
    ) -> ServiceResult<LikeToggleResponse> {
        let user_id = normalize_user_id(user_id).ok_or(ServiceError::Unauthenticated)?;
        let post_id = parse_post_id(post_id)?;

        let (post, reacted) = tokio::time::timeout(
            self.ctx.live_config().toggle_read_timeout(),
            self.read_state(post_id, user_id),
        )
        .await
        .map_err(|_| ServiceError::unavailable("Timed out reading like state"))??;

        let (write, liked) = if reacted {
            (self.ctx.reaction_repo().remove(post_id, user_id).await?, false)
        } else {
            (self.ctx.reaction_repo().add(post_id, user_id).await?, true)
        };

        match write {
            ReactionWrite::Applied => {
                info!(post_id = %post_id, user_id = %user_id, liked, "Like toggled");
                self.ctx
                    .feed()
                    .emit(CommunityEvent::reaction_changed(
                        post_id,
                        post.post_type,
                        user_id,
                        liked,
                    ))
                    .await;
            }
            ReactionWrite::Unchanged => {
                // A concurrent toggle from the same user won the race
                info!(post_id = %post_id, user_id = %user_id, liked, "Like toggle was a no-op");
            }
        }

        Ok(LikeToggleResponse { post_id, liked })
    }

    async fn read_state(&self, post_id: Snowflake, user_id: &str) -> ServiceResult<(Post, bool)> {
        let post = self
            .ctx
            .post_repo()
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Post", post_id.to_string()))?;
        let reacted = self.ctx.reaction_repo().exists(post_id, user_id).await?;
        Ok((post, reacted))
    }

    /// Whether `user_id` has liked the post.
    ///
    /// Never fails: anonymous callers, unknown posts, and store errors all
    /// read as `false`.
    #[instrument(skip(self))]
    pub async fn has_reacted(&self, post_id: &str, user_id: Option<&str>) -> bool {
        let Some(user_id) = normalize_user_id(user_id) else {
            return false;
        };
        let Ok(post_id) = parse_post_id(post_id) else {
            return false;
        };

        match self.ctx.reaction_repo().exists(post_id, user_id).await {
            Ok(reacted) => reacted,
            Err(e) => {
                warn!(post_id = %post_id, error = %e, "has_reacted failed, reporting false");
                false
            }
        }
    }

    /// Count reaction rows directly, independent of the denormalized counter
    #[instrument(skip(self))]
    pub async fn count_reactions(&self, post_id: &str) -> ServiceResult<i64> {
        let post_id = parse_post_id(post_id)?;
        Ok(self.ctx.reaction_repo().count(post_id).await?)
    }

    /// The post's denormalized like counter
    #[instrument(skip(self))]
    pub async fn like_count(&self, post_id: &str) -> ServiceResult<i64> {
        let post_id = parse_post_id(post_id)?;
        self.ctx
            .post_repo()
            .find_by_id(post_id)
            .await?
            .map(|post| post.like_count)
            .ok_or_else(|| ServiceError::not_found("Post", post_id.to_string()))
    }

    /// Row count and counter side by side
    pub async fn reaction_summary(&self, post_id: &str) -> ServiceResult<ReactionCountResponse> {
        let like_count = self.like_count(post_id).await?;
        let count = self.count_reactions(post_id).await?;
        Ok(ReactionCountResponse {
            post_id: post_id.trim().to_string(),
            count,
            like_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::CreatePostRequest;
    use crate::services::{PostService, ServiceContextBuilder};
    use grace_common::LiveConfig;
    use grace_core::Actor;
    use grace_db::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;

    async fn setup() -> (ServiceContext, Arc<MemoryStore>, String) {
        let store = Arc::new(MemoryStore::new());
        let ctx = ServiceContextBuilder::new()
            .memory(store.clone())
            .live_config(LiveConfig {
                toggle_read_timeout_ms: 100,
                ..LiveConfig::default()
            })
            .build()
            .unwrap();
        let post = PostService::new(&ctx)
            .create_post(
                Some(&Actor::new("author", "Ruth", None)),
                CreatePostRequest::new("prayer", "T", "C"),
            )
            .await
            .unwrap();
        (ctx, store, post.id)
    }

    #[tokio::test]
    async fn test_toggle_round_trip() {
        let (ctx, _, post_id) = setup().await;
        let likes = LikeService::new(&ctx);

        assert!(likes.toggle_like(&post_id, Some("u1")).await.unwrap().liked);
        assert_eq!(likes.like_count(&post_id).await.unwrap(), 1);
        assert!(likes.has_reacted(&post_id, Some("u1")).await);

        assert!(!likes.toggle_like(&post_id, Some("u1")).await.unwrap().liked);
        assert_eq!(likes.like_count(&post_id).await.unwrap(), 0);
        assert!(!likes.has_reacted(&post_id, Some("u1")).await);
    }

    #[tokio::test]
    async fn test_toggle_requires_user() {
        let (ctx, _, post_id) = setup().await;
        let likes = LikeService::new(&ctx);

        assert!(likes.toggle_like(&post_id, None).await.unwrap_err().is_unauthenticated());
        assert!(likes.toggle_like(&post_id, Some(" ")).await.unwrap_err().is_unauthenticated());
    }

    #[tokio::test]
    async fn test_toggle_unknown_post() {
        let (ctx, _, _) = setup().await;
        let likes = LikeService::new(&ctx);

        assert!(likes.toggle_like("12345", Some("u1")).await.unwrap_err().is_not_found());
        assert!(likes.toggle_like("", Some("u1")).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_toggle_read_timeout() {
        let (ctx, store, post_id) = setup().await;
        store.set_read_delay(Some(Duration::from_millis(500)));

        let err = LikeService::new(&ctx)
            .toggle_like(&post_id, Some("u1"))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());

        store.set_read_delay(None);
        assert_eq!(LikeService::new(&ctx).count_reactions(&post_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_has_reacted_never_fails() {
        let (ctx, store, post_id) = setup().await;
        let likes = LikeService::new(&ctx);

        assert!(!likes.has_reacted(&post_id, None).await);
        assert!(!likes.has_reacted("not-a-post", Some("u1")).await);
        assert!(!likes.has_reacted("777", Some("u1")).await);

        likes.toggle_like(&post_id, Some("u1")).await.unwrap();
        store.set_unavailable(true);
        assert!(!likes.has_reacted(&post_id, Some("u1")).await);
    }

    #[tokio::test]
    async fn test_like_count_unknown_post() {
        let (ctx, _, _) = setup().await;
        let likes = LikeService::new(&ctx);

        assert!(likes.like_count("31337").await.unwrap_err().is_not_found());
        assert_eq!(likes.count_reactions("31337").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reaction_summary() {
        let (ctx, _, post_id) = setup().await;
        let likes = LikeService::new(&ctx);
        likes.toggle_like(&post_id, Some("u1")).await.unwrap();
        likes.toggle_like(&post_id, Some("u2")).await.unwrap();

        let summary = likes.reaction_summary(&post_id).await.unwrap();
        assert_eq!(summary.count, 2);
        assert!(summary.is_consistent());
    }
}
