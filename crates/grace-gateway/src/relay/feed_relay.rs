//! Redis-backed feed relay

use grace_cache::{Subscriber, SubscriberBuilder, SubscriberResult};
use grace_service::{spawn_relay, ChangeFeed};
use tokio::task::JoinHandle;

/// Configuration for the feed relay
#[derive(Debug, Clone)]
pub struct FeedRelayConfig {
    pub redis_url: String,
    /// Broadcast buffer size
    pub broadcast_buffer: usize,
    /// Reconnection delay in milliseconds
    pub reconnect_delay_ms: u64,
    /// Instance id; events stamped with it are not relayed back
    pub origin: String,
}

impl FeedRelayConfig {
    pub fn new(redis_url: impl Into<String>) -> Self {
        Self {
            redis_url: redis_url.into(),
            broadcast_buffer: 1024,
            reconnect_delay_ms: 1000,
            origin: format!("gateway-{}", uuid::Uuid::new_v4()),
        }
    }
}

/// Listens on the community channel and re-emits events locally.
///
/// Owns the Redis subscriber; dropping the relay stops both the listener
/// and the forwarding task.
pub struct FeedRelay {
    subscriber: Subscriber,
    task: JoinHandle<()>,
    origin: String,
}

impl FeedRelay {
    /// Connect to Redis and start forwarding into `feed`
    pub async fn start(config: FeedRelayConfig, feed: ChangeFeed) -> SubscriberResult<Self> {
        let subscriber = SubscriberBuilder::new()
            .redis_url(&config.redis_url)
            .broadcast_buffer(config.broadcast_buffer)
            .reconnect_delay_ms(config.reconnect_delay_ms)
            .build()
            .await?;

        let task = spawn_relay(&subscriber, feed, config.origin.clone()).await?;
        tracing::info!(origin = %config.origin, "Feed relay started");

        Ok(Self {
            subscriber,
            task,
            origin: config.origin,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop listening on Redis
    pub async fn shutdown(&self) {
        self.subscriber.shutdown().await.ok();
        self.task.abort();
        tracing::info!(origin = %self.origin, "Feed relay stopped");
    }
}

impl Drop for FeedRelay {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for FeedRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedRelay")
            .field("origin", &self.origin)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_config_defaults() {
        let config = FeedRelayConfig::new("redis://127.0.0.1:6379");
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.broadcast_buffer, 1024);
        assert_eq!(config.reconnect_delay_ms, 1000);
        assert!(config.origin.starts_with("gateway-"));
    }

    #[test]
    fn test_relay_origins_are_unique() {
        let a = FeedRelayConfig::new("redis://localhost");
        let b = FeedRelayConfig::new("redis://localhost");
        assert_ne!(a.origin, b.origin);
    }
}
