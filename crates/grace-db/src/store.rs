//! Store selection
//!
//! Picks the repository backend named by configuration and hands out the
//! three repositories as trait objects.

use std::sync::Arc;

use grace_common::{AppError, StoreBackend};
use grace_core::traits::{CommentRepository, PostRepository, ReactionRepository};
use sqlx::PgPool;
use tracing::info;

use crate::memory::MemoryStore;
use crate::pool::{create_pool, run_migrations, DatabaseConfig};
use crate::repositories::{PgCommentRepository, PgPostRepository, PgReactionRepository};

/// A connected store backend
#[derive(Clone)]
pub enum Store {
    Postgres(PgPool),
    Memory(Arc<MemoryStore>),
}

impl Store {
    /// Connect the configured backend.
    ///
    /// Postgres requires `database`; the schema is applied when its
    /// `run_migrations` flag is set.
    pub async fn connect(
        backend: StoreBackend,
        database: Option<&grace_common::DatabaseConfig>,
    ) -> Result<Self, AppError> {
        match backend {
            StoreBackend::Memory => {
                info!("Using in-memory store");
                Ok(Self::memory())
            }
            StoreBackend::Postgres => {
                let database = database
                    .ok_or_else(|| AppError::Config("DATABASE_URL is required".to_string()))?;

                info!("Connecting to PostgreSQL...");
                let pool = create_pool(&DatabaseConfig::from(database))
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                if database.run_migrations {
                    run_migrations(&pool)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;
                }
                info!("PostgreSQL connection established");

                Ok(Self::Postgres(pool))
            }
        }
    }

    /// A fresh, empty in-memory store
    pub fn memory() -> Self {
        Self::Memory(Arc::new(MemoryStore::new()))
    }

    pub fn backend(&self) -> StoreBackend {
        match self {
            Self::Postgres(_) => StoreBackend::Postgres,
            Self::Memory(_) => StoreBackend::Memory,
        }
    }

    pub fn post_repo(&self) -> Arc<dyn PostRepository> {
        match self {
            Self::Postgres(pool) => Arc::new(PgPostRepository::new(pool.clone())),
            Self::Memory(store) => store.clone(),
        }
    }

    pub fn reaction_repo(&self) -> Arc<dyn ReactionRepository> {
        match self {
            Self::Postgres(pool) => Arc::new(PgReactionRepository::new(pool.clone())),
            Self::Memory(store) => store.clone(),
        }
    }

    pub fn comment_repo(&self) -> Arc<dyn CommentRepository> {
        match self {
            Self::Postgres(pool) => Arc::new(PgCommentRepository::new(pool.clone())),
            Self::Memory(store) => store.clone(),
        }
    }

    /// Whether the backend can currently serve requests
    pub async fn health_check(&self) -> bool {
        match self {
            Self::Postgres(pool) => pool.acquire().await.is_ok(),
            Self::Memory(store) => store.is_available(),
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres(_) => f.write_str("Store::Postgres"),
            Self::Memory(store) => f.debug_tuple("Store::Memory").field(store).finish(),
        }
    }
}
