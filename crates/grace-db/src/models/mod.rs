//! Database models - SQLx-compatible structs for PostgreSQL tables

mod comment;
mod post;

pub use comment::CommentModel;
pub use post::PostModel;
