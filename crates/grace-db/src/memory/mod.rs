//! In-memory store
//!
//! Implements every repository trait over a single `parking_lot::RwLock`.
//! Each write takes the lock once, so a reaction or comment row change and
//! its counter delta are one atomic batch, exactly like the PostgreSQL
//! transactions. Used by the `memory` store backend, local development and
//! service-level tests.
//!
//! Tests can make the store fail (`set_unavailable`) or slow down reads
//! (`set_read_delay`) to exercise the unavailable and timeout paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, instrument};

use grace_core::entities::{
    Comment, NewComment, NewPost, Post, PostWrite, Reaction, ReactionWrite,
};
use grace_core::error::DomainError;
use grace_core::traits::{CommentRepository, PostRepository, ReactionRepository, RepoResult};
use grace_core::value_objects::{to_store_precision, FeedCursor, PostFilter, Snowflake};

#[derive(Default)]
struct State {
    posts: HashMap<Snowflake, Post>,
    /// `(author_id, client_token)` -> post id
    client_tokens: HashMap<(String, String), Snowflake>,
    reactions: HashMap<(Snowflake, String), Reaction>,
    comments: HashMap<Snowflake, Vec<Comment>>,
    last_created_at: Option<DateTime<Utc>>,
}

impl State {
    /// Store clock: microsecond precision and strictly increasing, so two
    /// writes never share a timestamp within one store.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = to_store_precision(Utc::now());
        let ts = match self.last_created_at {
            Some(last) if now <= last => last + chrono::Duration::microseconds(1),
            _ => now,
        };
        self.last_created_at = Some(ts);
        ts
    }

    fn post_mut(&mut self, id: Snowflake) -> RepoResult<&mut Post> {
        self.posts.get_mut(&id).ok_or(DomainError::PostNotFound(id))
    }
}

/// Process-local store backing all three repositories
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    unavailable: AtomicBool,
    read_delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with `StoreUnavailable` until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }

    /// Delay every read by `delay`
    pub fn set_read_delay(&self, delay: Option<Duration>) {
        *self.read_delay.lock() = delay;
    }

    /// Number of stored posts
    pub fn post_count(&self) -> usize {
        self.state.read().posts.len()
    }

    fn check_available(&self) -> RepoResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::StoreUnavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    async fn before_read(&self) -> RepoResult<()> {
        let delay = *self.read_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_available()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("MemoryStore")
            .field("posts", &state.posts.len())
            .field("reactions", &state.reactions.len())
            .field("unavailable", &self.unavailable.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Posts
// ============================================================================

#[async_trait]
impl PostRepository for MemoryStore {
    #[instrument(skip(self, post), fields(post_id = %post.id))]
    async fn create(&self, post: &NewPost) -> RepoResult<PostWrite> {
        self.check_available()?;
        let mut state = self.state.write();

        let token_key = post
            .client_token
            .as_ref()
            .map(|token| (post.author.id.clone(), token.clone()));

        if let Some(key) = &token_key {
            if let Some(existing) = state.client_tokens.get(key).and_then(|id| state.posts.get(id)) {
                debug!(existing_id = %existing.id, "Client token replayed");
                return Ok(PostWrite {
                    post: existing.clone(),
                    created: false,
                });
            }
        }

        if state.posts.contains_key(&post.id) {
            return Err(DomainError::DatabaseError(format!(
                "duplicate post id {}",
                post.id
            )));
        }

        let created_at = state.next_timestamp();
        let stored = Post {
            id: post.id,
            post_type: post.post_type,
            author: post.author.clone(),
            title: post.title.clone(),
            content: post.content.clone(),
            created_at,
            like_count: 0,
            comment_count: 0,
        };

        state.posts.insert(post.id, stored.clone());
        if let Some(key) = token_key {
            state.client_tokens.insert(key, post.id);
        }

        Ok(PostWrite {
            post: stored,
            created: true,
        })
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Post>> {
        self.before_read().await?;
        Ok(self.state.read().posts.get(&id).cloned())
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        filter: PostFilter,
        cursor: Option<FeedCursor>,
        limit: i64,
    ) -> RepoResult<Vec<Post>> {
        self.before_read().await?;
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);

        let mut posts: Vec<Post> = self
            .state
            .read()
            .posts
            .values()
            .filter(|p| filter.matches(p))
            .filter(|p| cursor.map_or(true, |c| c.precedes(p)))
            .cloned()
            .collect();

        posts.sort_unstable_by(|a, b| b.sort_key().cmp(&a.sort_key()));
        posts.truncate(limit);
        Ok(posts)
    }
}

// ============================================================================
// Reactions
// ============================================================================

#[async_trait]
impl ReactionRepository for MemoryStore {
    #[instrument(skip(self))]
    async fn exists(&self, post_id: Snowflake, user_id: &str) -> RepoResult<bool> {
        self.before_read().await?;
        Ok(self
            .state
            .read()
            .reactions
            .contains_key(&(post_id, user_id.to_string())))
    }

    #[instrument(skip(self))]
    async fn add(&self, post_id: Snowflake, user_id: &str) -> RepoResult<ReactionWrite> {
        self.check_available()?;
        let mut state = self.state.write();
        state.post_mut(post_id)?;

        let key = (post_id, user_id.to_string());
        if state.reactions.contains_key(&key) {
            return Ok(ReactionWrite::Unchanged);
        }

        let mut reaction = Reaction::new(post_id, user_id);
        reaction.created_at = state.next_timestamp();
        state.reactions.insert(key, reaction);
        state.post_mut(post_id)?.like_count += 1;

        Ok(ReactionWrite::Applied)
    }

    #[instrument(skip(self))]
    async fn remove(&self, post_id: Snowflake, user_id: &str) -> RepoResult<ReactionWrite> {
        self.check_available()?;
        let mut state = self.state.write();

        if state
            .reactions
            .remove(&(post_id, user_id.to_string()))
            .is_none()
        {
            return Ok(ReactionWrite::Unchanged);
        }

        if let Ok(post) = state.post_mut(post_id) {
            post.like_count -= 1;
        }

        Ok(ReactionWrite::Applied)
    }

    #[instrument(skip(self))]
    async fn count(&self, post_id: Snowflake) -> RepoResult<i64> {
        self.before_read().await?;
        let count = self
            .state
            .read()
            .reactions
            .keys()
            .filter(|(id, _)| *id == post_id)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }
}

// ============================================================================
// Comments
// ============================================================================

#[async_trait]
impl CommentRepository for MemoryStore {
    #[instrument(skip(self, comment), fields(comment_id = %comment.id, post_id = %comment.post_id))]
    async fn create(&self, comment: &NewComment) -> RepoResult<Comment> {
        self.check_available()?;
        let mut state = self.state.write();
        state.post_mut(comment.post_id)?;

        let stored = Comment {
            id: comment.id,
            post_id: comment.post_id,
            author: comment.author.clone(),
            content: comment.content.clone(),
            created_at: state.next_timestamp(),
        };

        state
            .comments
            .entry(comment.post_id)
            .or_default()
            .push(stored.clone());
        state.post_mut(comment.post_id)?.comment_count += 1;

        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn list_by_post(&self, post_id: Snowflake) -> RepoResult<Vec<Comment>> {
        self.before_read().await?;
        let mut comments = self
            .state
            .read()
            .comments
            .get(&post_id)
            .cloned()
            .unwrap_or_default();

        comments.sort_unstable_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(comments)
    }

    #[instrument(skip(self))]
    async fn count(&self, post_id: Snowflake) -> RepoResult<i64> {
        self.before_read().await?;
        let count = self.state.read().comments.get(&post_id).map_or(0, Vec::len);
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grace_core::entities::{AuthorSnapshot, PostType};
    use std::sync::Arc;

    fn author(id: &str) -> AuthorSnapshot {
        AuthorSnapshot {
            id: id.to_string(),
            display_name: id.to_uppercase(),
            avatar_url: None,
        }
    }

    fn new_post(id: i64, post_type: PostType) -> NewPost {
        NewPost::new(Snowflake::new(id), post_type, author("author"), "Title", "Body").unwrap()
    }

    async fn seeded(store: &MemoryStore, id: i64) -> Post {
        PostRepository::create(store, &new_post(id, PostType::Prayer))
            .await
            .unwrap()
            .post
    }

    #[tokio::test]
    async fn test_create_starts_counters_at_zero() {
        let store = MemoryStore::new();
        let post = seeded(&store, 1).await;

        assert_eq!(post.like_count, 0);
        assert_eq!(post.comment_count, 0);
        assert_eq!(
            store.find_by_id(post.id).await.unwrap().unwrap(),
            post
        );
    }

    #[tokio::test]
    async fn test_created_at_strictly_increases() {
        let store = MemoryStore::new();
        let mut last = None;
        for id in 1..=50 {
            let post = seeded(&store, id).await;
            if let Some(prev) = last {
                assert!(post.created_at > prev);
            }
            last = Some(post.created_at);
        }
    }

    #[tokio::test]
    async fn test_client_token_replay_returns_existing() {
        let store = MemoryStore::new();
        let first = new_post(1, PostType::Thought).with_client_token(Some("tok".into()));
        let retry = new_post(2, PostType::Thought).with_client_token(Some("tok".into()));

        let created = PostRepository::create(&store, &first).await.unwrap();
        let replayed = PostRepository::create(&store, &retry).await.unwrap();

        assert!(created.created);
        assert!(!replayed.created);
        assert_eq!(replayed.post.id, Snowflake::new(1));
        assert_eq!(store.post_count(), 1);
    }

    #[tokio::test]
    async fn test_list_orders_and_filters() {
        let store = MemoryStore::new();
        PostRepository::create(&store, &new_post(1, PostType::Prayer)).await.unwrap();
        PostRepository::create(&store, &new_post(2, PostType::Testimony)).await.unwrap();
        PostRepository::create(&store, &new_post(3, PostType::Prayer)).await.unwrap();

        let all = store.list(PostFilter::All, None, 10).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|p| p.id.into_inner()).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let prayers = store
            .list(PostFilter::Type(PostType::Prayer), None, 10)
            .await
            .unwrap();
        assert!(prayers.iter().all(|p| p.post_type == PostType::Prayer));
        assert_eq!(prayers.len(), 2);

        let after = store
            .list(PostFilter::All, Some(FeedCursor::after(&all[0])), 10)
            .await
            .unwrap();
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].id, Snowflake::new(2));
    }

    #[tokio::test]
    async fn test_reaction_add_is_idempotent() {
        let store = MemoryStore::new();
        let post = seeded(&store, 1).await;

        assert_eq!(store.add(post.id, "a").await.unwrap(), ReactionWrite::Applied);
        assert_eq!(store.add(post.id, "a").await.unwrap(), ReactionWrite::Unchanged);

        let stored = store.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored.like_count, 1);
        assert_eq!(ReactionRepository::count(&store, post.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reaction_remove_missing_is_unchanged() {
        let store = MemoryStore::new();
        let post = seeded(&store, 1).await;

        assert_eq!(store.remove(post.id, "a").await.unwrap(), ReactionWrite::Unchanged);
        let stored = store.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored.like_count, 0);
    }

    #[tokio::test]
    async fn test_reaction_on_missing_post() {
        let store = MemoryStore::new();
        let err = store.add(Snowflake::new(99), "a").await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_reactions_keep_counter_in_sync() {
        let store = Arc::new(MemoryStore::new());
        let post = seeded(&store, 1).await;

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.add(post.id, &format!("user-{}", i % 8)).await.unwrap()
            }));
        }
        let applied = futures_applied(handles).await;

        assert_eq!(applied, 8);
        let stored = store.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored.like_count, 8);
        assert_eq!(ReactionRepository::count(&*store, post.id).await.unwrap(), 8);
    }

    async fn futures_applied(handles: Vec<tokio::task::JoinHandle<ReactionWrite>>) -> usize {
        let mut applied = 0;
        for handle in handles {
            if handle.await.unwrap().is_applied() {
                applied += 1;
            }
        }
        applied
    }

    #[tokio::test]
    async fn test_comment_increments_counter() {
        let store = MemoryStore::new();
        let post = seeded(&store, 1).await;

        let c1 = NewComment::new(Snowflake::new(10), post.id, author("a"), "Amen").unwrap();
        let c2 = NewComment::new(Snowflake::new(11), post.id, author("b"), "Praying").unwrap();
        CommentRepository::create(&store, &c1).await.unwrap();
        CommentRepository::create(&store, &c2).await.unwrap();

        let comments = store.list_by_post(post.id).await.unwrap();
        assert_eq!(comments[0].id, Snowflake::new(11));
        assert_eq!(comments[1].id, Snowflake::new(10));

        let stored = store.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored.comment_count, 2);
        assert_eq!(CommentRepository::count(&store, post.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_comment_on_missing_post() {
        let store = MemoryStore::new();
        let comment = NewComment::new(Snowflake::new(10), Snowflake::new(1), author("a"), "Hi").unwrap();
        let err = CommentRepository::create(&store, &comment).await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(_)));
    }

    #[tokio::test]
    async fn test_unavailable() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        let err = store.find_by_id(Snowflake::new(1)).await.unwrap_err();
        assert!(err.is_unavailable());

        store.set_unavailable(false);
        assert!(store.find_by_id(Snowflake::new(1)).await.unwrap().is_none());
    }
}
