//! Repository traits

mod repositories;

pub use repositories::{CommentRepository, PostRepository, ReactionRepository, RepoResult};
