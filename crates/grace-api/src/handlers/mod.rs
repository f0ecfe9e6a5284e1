//! HTTP request handlers
//!
//! Each handler extracts its input, delegates to a service, and maps the
//! result into a JSON response.

pub mod comments;
pub mod health;
pub mod likes;
pub mod posts;
