//! Business logic services
//!
//! Each service borrows the shared [`ServiceContext`], validates input,
//! performs its write through the repositories, and announces committed
//! changes on the change feed.

pub mod comment;
pub mod context;
pub mod error;
pub mod ids;
pub mod like;
pub mod post;

pub use comment::CommentService;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use ids::parse_post_id;
pub use like::LikeService;
pub use post::PostService;
