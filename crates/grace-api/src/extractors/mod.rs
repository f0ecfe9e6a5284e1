//! Axum extractors for request handling
//!
//! Custom extractors for authentication, validation, and feed queries.

mod auth;
mod feed;
mod validated;

pub use auth::{AuthUser, OptionalAuthUser};
pub use feed::FeedQuery;
pub use validated::ValidatedJson;
