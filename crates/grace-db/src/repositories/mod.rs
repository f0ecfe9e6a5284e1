//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in grace-core.

mod comment;
mod error;
mod post;
mod reaction;

pub use comment::PgCommentRepository;
pub use post::PgPostRepository;
pub use reaction::PgReactionRepository;
