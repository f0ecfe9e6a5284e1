//! # grace-service
//!
//! Application layer: post, like, and comment services, request/response
//! DTOs, and the live query registry that pushes changes to subscribers.
//!
//! ```rust,ignore
//! let ctx = ServiceContextBuilder::new().memory(store).build()?;
//! let post = PostService::new(&ctx).create_post(Some(&actor), request).await?;
//!
//! let sub = ctx.live().subscribe_like_count(post_id, |count| println!("{count:?}"));
//! LikeService::new(&ctx).toggle_like(&post.id, Some(&actor.user_id)).await?;
//! sub.unsubscribe();
//! ```

pub mod dto;
pub mod live;
pub mod services;

pub use live::{
    spawn_relay, ChangeFeed, LiveError, LiveRegistry, LiveResult, QueryKey, Snapshot,
    Subscription, SubscriptionState,
};
pub use services::{
    parse_post_id, CommentService, LikeService, PostService, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult,
};
