//! # grace-core
//!
//! Domain layer for the community timeline: posts, likes, and comments.
//! Holds entities, value objects, repository traits, and change events.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    AuthorSnapshot, Comment, NewComment, NewPost, Post, PostType, PostWrite, Reaction,
    ReactionWrite,
};
pub use error::DomainError;
pub use events::{CommentAddedEvent, CommunityEvent, PostCreatedEvent, ReactionChangedEvent};
pub use traits::{CommentRepository, PostRepository, ReactionRepository, RepoResult};
pub use value_objects::{
    to_store_precision, Actor, FeedCursor, Page, PostFilter, Snowflake, SnowflakeGenerator,
    SnowflakeParseError, FEED_PAGE_SIZE,
};
