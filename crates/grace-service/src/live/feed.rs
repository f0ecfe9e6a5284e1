//! In-process change feed with optional Redis relay
//!
//! Services emit a [`CommunityEvent`] after every committed write. Live
//! queries in this process see it through the broadcast; other processes see
//! it through Redis when a publisher is attached.

use grace_cache::{PubSubChannel, Publisher, Subscriber};
use grace_core::CommunityEvent;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Broadcast of committed changes
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<CommunityEvent>,
    publisher: Option<Publisher>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            publisher: None,
        }
    }

    /// Also publish every emitted event to Redis
    #[must_use]
    pub fn with_publisher(mut self, publisher: Publisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CommunityEvent> {
        self.tx.subscribe()
    }

    /// Number of in-process receivers
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Instance id stamped on published events, if relaying
    pub fn origin(&self) -> Option<&str> {
        self.publisher.as_ref().map(Publisher::origin)
    }

    /// Announce a committed change.
    ///
    /// Never fails: the write is already durable, so publish errors are only logged.
    pub async fn emit(&self, event: CommunityEvent) {
        if let Some(publisher) = &self.publisher {
            if let Err(e) = publisher.publish_community(&event).await {
                tracing::warn!(
                    error = %e,
                    event_type = event.event_type(),
                    post_id = %event.post_id(),
                    "Failed to publish community event"
                );
            }
        }
        self.emit_local(event);
    }

    /// Announce a change to this process only
    pub fn emit_local(&self, event: CommunityEvent) {
        tracing::trace!(event_type = event.event_type(), post_id = %event.post_id(), "Change emitted");
        // No live queries is fine
        let _ = self.tx.send(event);
    }
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("receivers", &self.tx.receiver_count())
            .field("origin", &self.origin())
            .finish()
    }
}

/// Forward community events published by other instances into `feed`.
///
/// Events stamped with `origin` were already emitted locally and are skipped.
pub async fn spawn_relay(
    subscriber: &Subscriber,
    feed: ChangeFeed,
    origin: impl Into<String>,
) -> grace_cache::SubscriberResult<JoinHandle<()>> {
    let origin = origin.into();
    let mut rx = subscriber.receiver();
    subscriber.subscribe(&[PubSubChannel::community()]).await?;

    Ok(tokio::spawn(async move {
        loop {
            let msg = match rx.recv().await {
                Ok(msg) => msg,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Relay lagged behind Redis");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            if msg.channel != PubSubChannel::Community {
                continue;
            }
            let Some(event) = msg.event else {
                tracing::warn!(payload = %msg.payload, "Dropping unparseable relay payload");
                continue;
            };
            if event.is_from(&origin) {
                continue;
            }

            match event.to_community() {
                Ok(change) => feed.emit_local(change),
                Err(e) => tracing::warn!(error = %e, "Dropping malformed community event"),
            }
        }
        tracing::debug!("Relay stopped");
    }))
}
