//! Entity to model mappers
//!
//! Conversions between domain entities (grace-core) and database models.
//! - `From`/`TryFrom<Model> for Entity`: convert database rows to domain objects
//! - `*Insert` structs: borrow entity data as column values for inserts

mod comment;
mod post;

pub use comment::CommentInsert;
pub use post::{posts_from_models, PostInsert};
