//! Live query registry
//!
//! One [`LiveQuery`] exists per [`QueryKey`], shared by every subscriber of
//! that key. The first subscriber spawns its refresh task; the last one to
//! leave removes the entry and aborts the task. A single dispatcher task
//! turns change events into refresh signals.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use grace_core::entities::{Comment, Post};
use grace_core::events::CommunityEvent;
use grace_core::traits::{CommentRepository, PostRepository};
use grace_core::value_objects::{Page, PostFilter, Snowflake, FEED_PAGE_SIZE};
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch, Notify};
use tokio::task::JoinHandle;

use super::feed::ChangeFeed;
use super::query::{LiveError, LiveResult, QueryKey, Snapshot};
use super::subscription::Subscription;

/// Shared state of one live query
pub(crate) struct LiveQuery {
    pub(crate) key: QueryKey,
    refs: AtomicUsize,
    latest: watch::Sender<Option<LiveResult<Snapshot>>>,
    dirty: Notify,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LiveQuery {
    fn new(key: QueryKey) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            key,
            refs: AtomicUsize::new(0),
            latest,
            dirty: Notify::new(),
            task: Mutex::new(None),
        }
    }

    pub(crate) fn watch(&self) -> watch::Receiver<Option<LiveResult<Snapshot>>> {
        self.latest.subscribe()
    }

    /// Store a result, waking subscribers only when it differs
    fn publish(&self, result: LiveResult<Snapshot>) -> bool {
        self.latest.send_if_modified(|current| {
            if current.as_ref() == Some(&result) {
                false
            } else {
                *current = Some(result);
                true
            }
        })
    }

    fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

struct Inner {
    entries: DashMap<QueryKey, Arc<LiveQuery>>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    feed: ChangeFeed,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    async fn load(&self, key: QueryKey) -> LiveResult<Snapshot> {
        match key {
            QueryKey::Posts(filter) => {
                let rows = self.posts.list(filter, None, FEED_PAGE_SIZE + 1).await?;
                Ok(Snapshot::Posts(Page::from_overfetch(rows, FEED_PAGE_SIZE)))
            }
            QueryKey::Comments(post_id) => {
                Ok(Snapshot::Comments(self.comments.list_by_post(post_id).await?))
            }
            QueryKey::LikeCount(post_id) => self
                .posts
                .find_by_id(post_id)
                .await?
                .map(|post| Snapshot::LikeCount(post.like_count))
                .ok_or(LiveError::PostNotFound(post_id)),
        }
    }

    fn mark_dirty(&self, key: &QueryKey) {
        if let Some(query) = self.entries.get(key) {
            query.dirty.notify_one();
        }
    }

    fn mark_all_dirty(&self) {
        for query in self.entries.iter() {
            query.dirty.notify_one();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(task) = self.dispatcher.get_mut().take() {
            task.abort();
        }
        for query in self.entries.iter() {
            query.stop();
        }
    }
}

/// Ref-counted registry of live queries
#[derive(Clone)]
pub struct LiveRegistry {
    inner: Arc<Inner>,
}

impl LiveRegistry {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        feed: ChangeFeed,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                posts,
                comments,
                feed,
                dispatcher: Mutex::new(None),
            }),
        }
    }

    /// Subscribe to the first feed page for `filter`
    pub fn subscribe_posts<F>(&self, filter: PostFilter, mut on_change: F) -> Subscription
    where
        F: FnMut(LiveResult<Page<Post>>) + Send + 'static,
    {
        self.subscribe(QueryKey::Posts(filter), move |result| {
            on_change(result.and_then(Snapshot::into_posts));
        })
    }

    /// Subscribe to every comment on a post, newest first
    pub fn subscribe_comments<F>(&self, post_id: Snowflake, mut on_change: F) -> Subscription
    where
        F: FnMut(LiveResult<Vec<Comment>>) + Send + 'static,
    {
        self.subscribe(QueryKey::Comments(post_id), move |result| {
            on_change(result.and_then(Snapshot::into_comments));
        })
    }

    /// Subscribe to the like counter of a post
    pub fn subscribe_like_count<F>(&self, post_id: Snowflake, mut on_change: F) -> Subscription
    where
        F: FnMut(LiveResult<i64>) + Send + 'static,
    {
        self.subscribe(QueryKey::LikeCount(post_id), move |result| {
            on_change(result.and_then(Snapshot::into_like_count));
        })
    }

    /// Subscribe to any query shape.
    ///
    /// `on_change` runs with the current snapshot, then again after each
    /// change to it. After an `Err` it is not called again and the
    /// subscription is closed. Must be called within a Tokio runtime.
    pub fn subscribe<F>(&self, key: QueryKey, on_change: F) -> Subscription
    where
        F: FnMut(LiveResult<Snapshot>) + Send + 'static,
    {
        // Listen before the first load so no commit falls between the two
        self.ensure_dispatcher();

        let query = {
            let entry = self
                .inner
                .entries
                .entry(key)
                .or_insert_with(|| self.start_query(key));
            entry.refs.fetch_add(1, Ordering::SeqCst);
            Arc::clone(entry.value())
        };

        Subscription::start(self.clone(), query, on_change)
    }

    /// Number of distinct live queries
    pub fn active_queries(&self) -> usize {
        self.inner.entries.len()
    }

    /// Subscribers currently sharing `key`
    pub fn subscriber_count(&self, key: &QueryKey) -> usize {
        self.inner
            .entries
            .get(key)
            .map_or(0, |query| query.refs.load(Ordering::SeqCst))
    }

    /// Drop one reference; the last one removes the entry and stops its task
    pub(crate) fn release(&self, query: &Arc<LiveQuery>) {
        let removed = self.inner.entries.remove_if(&query.key, |_, current| {
            Arc::ptr_eq(current, query) && query.refs.fetch_sub(1, Ordering::SeqCst) == 1
        });

        if removed.is_some() {
            query.stop();
            tracing::debug!(key = %query.key, "Live query released");
        }
    }

    fn start_query(&self, key: QueryKey) -> Arc<LiveQuery> {
        let query = Arc::new(LiveQuery::new(key));
        let task = tokio::spawn(refresh(Arc::downgrade(&self.inner), Arc::clone(&query)));
        *query.task.lock() = Some(task);

        tracing::debug!(key = %key, "Live query started");
        query
    }

    fn ensure_dispatcher(&self) {
        let mut slot = self.inner.dispatcher.lock();
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let events = self.inner.feed.subscribe();
        *slot = Some(tokio::spawn(dispatch(Arc::downgrade(&self.inner), events)));
    }
}

impl std::fmt::Debug for LiveRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveRegistry")
            .field("active_queries", &self.active_queries())
            .finish_non_exhaustive()
    }
}

/// Re-run one query every time it is marked dirty
async fn refresh(registry: Weak<Inner>, query: Arc<LiveQuery>) {
    loop {
        let Some(inner) = registry.upgrade() else {
            return;
        };

        let result = inner.load(query.key).await;
        if let Err(e) = &result {
            tracing::debug!(key = %query.key, error = %e, "Live query failed, closing");
            // Evict first so a subscriber seeing the error can resubscribe fresh
            inner
                .entries
                .remove_if(&query.key, |_, current| Arc::ptr_eq(current, &query));
            query.publish(result);
            return;
        }

        if query.publish(result) {
            tracing::trace!(key = %query.key, "Live query refreshed");
        }
        drop(inner);

        // A permit stored during the load triggers an immediate reload
        query.dirty.notified().await;
    }
}

/// Route change events to the live queries they may affect
async fn dispatch(registry: Weak<Inner>, mut events: broadcast::Receiver<CommunityEvent>) {
    loop {
        let received = events.recv().await;
        let Some(inner) = registry.upgrade() else {
            return;
        };

        match received {
            Ok(event) => {
                for key in QueryKey::affected_by(&event) {
                    inner.mark_dirty(&key);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Change feed lagged, refreshing every live query");
                inner.mark_all_dirty();
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}
