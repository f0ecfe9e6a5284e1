//! Identity verification

mod jwt;

pub use jwt::{Claims, IdentityVerifier};
