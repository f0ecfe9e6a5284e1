//! PostgreSQL implementation of PostRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use grace_core::entities::{NewPost, Post, PostWrite};
use grace_core::error::DomainError;
use grace_core::traits::{PostRepository, RepoResult};
use grace_core::value_objects::{FeedCursor, PostFilter, Snowflake};

use crate::mappers::{posts_from_models, PostInsert};
use crate::models::PostModel;

use super::error::{map_db_error, map_unique_violation};

const POST_COLUMNS: &str = "id, post_type, author_id, author_display_name, author_avatar_url, \
                            title, content, client_token, like_count, comment_count, created_at";

/// PostgreSQL implementation of PostRepository
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    /// Create a new PgPostRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_client_token(&self, author_id: &str, token: &str) -> RepoResult<Option<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author_id = $1 AND client_token = $2"
        );
        sqlx::query_as::<_, PostModel>(&sql)
            .bind(author_id)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .map(Post::try_from)
            .transpose()
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    #[instrument(skip(self, post), fields(post_id = %post.id, post_type = %post.post_type))]
    async fn create(&self, post: &NewPost) -> RepoResult<PostWrite> {
        let insert = PostInsert::new(post);

        // created_at and both counters come from column defaults
        let sql = format!(
            r#"
            INSERT INTO posts (id, post_type, author_id, author_display_name, author_avatar_url,
                               title, content, client_token)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (author_id, client_token) WHERE client_token IS NOT NULL DO NOTHING
            RETURNING {POST_COLUMNS}
            "#
        );

        let inserted = sqlx::query_as::<_, PostModel>(&sql)
            .bind(insert.id)
            .bind(insert.post_type)
            .bind(insert.author_id)
            .bind(insert.author_display_name)
            .bind(insert.author_avatar_url)
            .bind(insert.title)
            .bind(insert.content)
            .bind(insert.client_token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, || DomainError::DuplicateClientToken))?;

        if let Some(model) = inserted {
            return Ok(PostWrite {
                post: Post::try_from(model)?,
                created: true,
            });
        }

        // Conflict on the client token: hand back the original post
        let token = insert.client_token.ok_or(DomainError::DuplicateClientToken)?;
        let existing = self
            .find_by_client_token(insert.author_id, token)
            .await?
            .ok_or(DomainError::DuplicateClientToken)?;

        Ok(PostWrite {
            post: existing,
            created: false,
        })
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        sqlx::query_as::<_, PostModel>(&sql)
            .bind(id.into_inner())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .map(Post::try_from)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        filter: PostFilter,
        cursor: Option<FeedCursor>,
        limit: i64,
    ) -> RepoResult<Vec<Post>> {
        // Filter, keyset predicate, and ordering in one statement so the
        // cursor is valid for whichever filter produced it.
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE ($1::text IS NULL OR post_type = $1)
              AND ($2::timestamptz IS NULL OR (created_at, id) < ($2::timestamptz, $3::bigint))
            ORDER BY created_at DESC, id DESC
            LIMIT $4
            "#
        );

        let results = sqlx::query_as::<_, PostModel>(&sql)
            .bind(filter.post_type().map(|t| t.as_str()))
            .bind(cursor.map(|c| c.created_at))
            .bind(cursor.map(|c| c.id.into_inner()))
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        posts_from_models(results)
    }
}
