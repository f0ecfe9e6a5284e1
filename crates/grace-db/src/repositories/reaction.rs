//! PostgreSQL implementation of ReactionRepository
//!
//! The `(post_id, user_id)` primary key is the uniqueness guarantee. Each
//! write runs the reaction row change and the `like_count` delta in one
//! transaction; the delta is applied only when the row change took effect,
//! so a duplicate insert from a racing toggle leaves the counter untouched.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use grace_core::entities::ReactionWrite;
use grace_core::traits::{ReactionRepository, RepoResult};
use grace_core::value_objects::Snowflake;

use super::error::{map_db_error, map_foreign_key_violation, post_not_found};

/// PostgreSQL implementation of ReactionRepository
#[derive(Clone)]
pub struct PgReactionRepository {
    pool: PgPool,
}

impl PgReactionRepository {
    /// Create a new PgReactionRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReactionRepository for PgReactionRepository {
    #[instrument(skip(self))]
    async fn exists(&self, post_id: Snowflake, user_id: &str) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM post_reactions WHERE post_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(post_id.into_inner())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn add(&self, post_id: Snowflake, user_id: &str) -> RepoResult<ReactionWrite> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO post_reactions (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, user_id) DO NOTHING
            "#,
        )
        .bind(post_id.into_inner())
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_foreign_key_violation(e, || post_not_found(post_id)))?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await.map_err(map_db_error)?;
            debug!("Reaction already present, counter untouched");
            return Ok(ReactionWrite::Unchanged);
        }

        sqlx::query("UPDATE posts SET like_count = like_count + 1 WHERE id = $1")
            .bind(post_id.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(ReactionWrite::Applied)
    }

    #[instrument(skip(self))]
    async fn remove(&self, post_id: Snowflake, user_id: &str) -> RepoResult<ReactionWrite> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let deleted = sqlx::query("DELETE FROM post_reactions WHERE post_id = $1 AND user_id = $2")
            .bind(post_id.into_inner())
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await.map_err(map_db_error)?;
            debug!("Reaction already absent, counter untouched");
            return Ok(ReactionWrite::Unchanged);
        }

        sqlx::query("UPDATE posts SET like_count = like_count - 1 WHERE id = $1")
            .bind(post_id.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(ReactionWrite::Applied)
    }

    #[instrument(skip(self))]
    async fn count(&self, post_id: Snowflake) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post_reactions WHERE post_id = $1")
            .bind(post_id.into_inner())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }
}
