//! Domain entities - core business objects

mod comment;
mod post;
mod reaction;

pub use comment::{Comment, NewComment};
pub use post::{AuthorSnapshot, NewPost, Post, PostType, PostWrite};
pub use reaction::{Reaction, ReactionWrite};
