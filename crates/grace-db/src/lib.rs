//! # grace-db
//!
//! Store layer implementing the grace-core repository traits.
//!
//! ## Overview
//!
//! - PostgreSQL via SQLx: connection pool, schema bootstrap, row models,
//!   entity mappers and repositories
//! - [`MemoryStore`]: a process-local implementation of the same traits
//!   with identical ordering, uniqueness and counter semantics
//! - [`Store`]: the backend chosen by configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use grace_db::pool::{create_pool, run_migrations, DatabaseConfig};
//! use grace_db::repositories::PgPostRepository;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env();
//!     let pool = create_pool(&config).await?;
//!     run_migrations(&pool).await?;
//!     let posts = PgPostRepository::new(pool);
//!
//!     // Use the repository...
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;
pub mod store;

// Re-export commonly used types
pub use memory::MemoryStore;
pub use pool::{create_pool, create_pool_from_env, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{PgCommentRepository, PgPostRepository, PgReactionRepository};
pub use store::Store;
