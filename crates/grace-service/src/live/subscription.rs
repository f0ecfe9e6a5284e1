//! Subscription handle returned by the live registry

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

use super::query::{LiveResult, QueryKey, Snapshot};
use super::registry::{LiveQuery, LiveRegistry};

/// Lifecycle of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Active,
    Closed,
}

/// One subscriber's hold on a live query.
///
/// Moves from `Active` to `Closed` on [`unsubscribe`](Self::unsubscribe),
/// on drop, or after delivering a query error. The registry reference is
/// released exactly once.
pub struct Subscription {
    registry: LiveRegistry,
    query: Arc<LiveQuery>,
    closed: Arc<AtomicBool>,
    forward: JoinHandle<()>,
    released: bool,
}

impl Subscription {
    pub(crate) fn start<F>(registry: LiveRegistry, query: Arc<LiveQuery>, mut on_change: F) -> Self
    where
        F: FnMut(LiveResult<Snapshot>) + Send + 'static,
    {
        let closed = Arc::new(AtomicBool::new(false));
        let mut latest = query.watch();
        let closed_flag = Arc::clone(&closed);

        let forward = tokio::spawn(async move {
            loop {
                let current = latest.borrow_and_update().clone();
                if let Some(result) = current {
                    if result.is_err() {
                        closed_flag.store(true, Ordering::SeqCst);
                        on_change(result);
                        return;
                    }
                    on_change(result);
                }

                if latest.changed().await.is_err() {
                    closed_flag.store(true, Ordering::SeqCst);
                    return;
                }
            }
        });

        Self {
            registry,
            query,
            closed,
            forward,
            released: false,
        }
    }

    pub fn key(&self) -> QueryKey {
        self.query.key
    }

    pub fn state(&self) -> SubscriptionState {
        if self.released || self.closed.load(Ordering::SeqCst) {
            SubscriptionState::Closed
        } else {
            SubscriptionState::Active
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state() == SubscriptionState::Active
    }

    /// Stop receiving updates and release the registry reference
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.closed.store(true, Ordering::SeqCst);
        self.forward.abort();
        self.registry.release(&self.query);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.query.key)
            .field("state", &self.state())
            .finish()
    }
}
