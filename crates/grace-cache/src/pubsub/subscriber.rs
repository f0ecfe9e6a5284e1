//! Redis Pub/Sub subscriber.
//!
//! Listens on Redis channels from a background task and rebroadcasts every
//! message in-process. After a connection loss the task reconnects and
//! resubscribes to the channels it held.

use crate::pubsub::{PubSubChannel, PubSubEvent};
use futures_util::StreamExt;
use redis::Client;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, RwLock};

/// Error type for subscriber operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Failed to parse event: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Subscriber task stopped")]
    ChannelClosed,
}

/// Result type for subscriber operations
pub type SubscriberResult<T> = Result<T, SubscriberError>;

/// Message received from Pub/Sub
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub channel: PubSubChannel,
    /// Parsed event, `None` when the payload is not a `PubSubEvent`
    pub event: Option<PubSubEvent>,
    pub payload: String,
}

impl ReceivedMessage {
    fn from_redis(channel_name: String, payload: String) -> Self {
        Self {
            channel: PubSubChannel::parse(&channel_name),
            event: serde_json::from_str(&payload).ok(),
            payload,
        }
    }
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub redis_url: String,
    /// In-process broadcast capacity
    pub broadcast_buffer: usize,
    pub reconnect_delay_ms: u64,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            broadcast_buffer: 1024,
            reconnect_delay_ms: 1000,
        }
    }
}

#[derive(Debug)]
enum Command {
    Subscribe(Vec<String>),
    Shutdown,
}

/// Outcome of one connection's lifetime
enum Exit {
    Shutdown,
    Reconnect,
}

/// Redis Pub/Sub subscriber
pub struct Subscriber {
    channels: Arc<RwLock<HashSet<String>>>,
    messages: broadcast::Sender<ReceivedMessage>,
    control: mpsc::Sender<Command>,
}

impl Subscriber {
    /// Spawn the background listener
    pub fn spawn(config: SubscriberConfig) -> Self {
        let (messages, _) = broadcast::channel(config.broadcast_buffer);
        let (control, control_rx) = mpsc::channel(16);
        let channels = Arc::new(RwLock::new(HashSet::new()));

        tokio::spawn(listen(config, Arc::clone(&channels), messages.clone(), control_rx));

        Self {
            channels,
            messages,
            control,
        }
    }

    /// Subscribe to channels
    pub async fn subscribe(&self, channels: &[PubSubChannel]) -> SubscriberResult<()> {
        let names = channels.iter().map(PubSubChannel::name).collect();
        self.control
            .send(Command::Subscribe(names))
            .await
            .map_err(|_| SubscriberError::ChannelClosed)
    }

    /// Receive every message from subscribed channels
    #[must_use]
    pub fn receiver(&self) -> broadcast::Receiver<ReceivedMessage> {
        self.messages.subscribe()
    }

    /// Channels the listener currently holds
    pub async fn subscribed_channels(&self) -> Vec<String> {
        self.channels.read().await.iter().cloned().collect()
    }

    /// Stop the listener
    pub async fn shutdown(&self) -> SubscriberResult<()> {
        self.control
            .send(Command::Shutdown)
            .await
            .map_err(|_| SubscriberError::ChannelClosed)
    }
}

async fn listen(
    config: SubscriberConfig,
    channels: Arc<RwLock<HashSet<String>>>,
    messages: broadcast::Sender<ReceivedMessage>,
    mut control: mpsc::Receiver<Command>,
) {
    let delay = Duration::from_millis(config.reconnect_delay_ms);
    loop {
        match connection(&config, &channels, &messages, &mut control).await {
            Ok(Exit::Shutdown) => {
                tracing::info!("Subscriber shutting down");
                return;
            }
            Ok(Exit::Reconnect) => tokio::time::sleep(delay).await,
            Err(e) => {
                tracing::error!(error = %e, "Subscriber connection failed, reconnecting");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

async fn connection(
    config: &SubscriberConfig,
    channels: &RwLock<HashSet<String>>,
    messages: &broadcast::Sender<ReceivedMessage>,
    control: &mut mpsc::Receiver<Command>,
) -> SubscriberResult<Exit> {
    let client = Client::open(config.redis_url.as_str())?;
    let mut pubsub = client.get_async_pubsub().await?;

    for channel in channels.read().await.iter() {
        pubsub.subscribe(channel).await?;
    }
    tracing::info!("Subscriber connected to Redis");

    loop {
        let mut stream = pubsub.on_message();
        let command = tokio::select! {
            msg = stream.next() => {
                let Some(msg) = msg else {
                    tracing::warn!("Pub/Sub stream ended");
                    return Ok(Exit::Reconnect);
                };
                let channel_name = msg.get_channel_name().to_string();
                let payload: String = msg.get_payload().unwrap_or_default();
                tracing::trace!(channel = %channel_name, "Received Pub/Sub message");
                // No receivers is fine
                let _ = messages.send(ReceivedMessage::from_redis(channel_name, payload));
                continue;
            }
            cmd = control.recv() => cmd,
        };
        drop(stream);

        match command {
            Some(Command::Subscribe(names)) => {
                for name in names {
                    pubsub.subscribe(&name).await?;
                    tracing::debug!(channel = %name, "Subscribed to channel");
                    channels.write().await.insert(name);
                }
            }
            Some(Command::Shutdown) | None => return Ok(Exit::Shutdown),
        }
    }
}

/// Builder for subscriber
pub struct SubscriberBuilder {
    config: SubscriberConfig,
    initial_channels: Vec<PubSubChannel>,
}

impl SubscriberBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SubscriberConfig::default(),
            initial_channels: Vec::new(),
        }
    }

    #[must_use]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.config.redis_url = url.into();
        self
    }

    #[must_use]
    pub fn broadcast_buffer(mut self, size: usize) -> Self {
        self.config.broadcast_buffer = size;
        self
    }

    #[must_use]
    pub fn reconnect_delay_ms(mut self, delay: u64) -> Self {
        self.config.reconnect_delay_ms = delay;
        self
    }

    /// Add initial channel subscription
    #[must_use]
    pub fn subscribe(mut self, channel: PubSubChannel) -> Self {
        self.initial_channels.push(channel);
        self
    }

    /// Spawn the subscriber and queue the initial subscriptions
    pub async fn build(self) -> SubscriberResult<Subscriber> {
        let subscriber = Subscriber::spawn(self.config);
        if !self.initial_channels.is_empty() {
            subscriber.subscribe(&self.initial_channels).await?;
        }
        Ok(subscriber)
    }
}

impl Default for SubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grace_core::{CommunityEvent, PostType, Snowflake};

    #[test]
    fn test_received_message_parsing() {
        let event =
            CommunityEvent::comment_added(Snowflake::new(1), PostType::Prayer, Snowflake::new(2));
        let payload = PubSubEvent::community(&event).unwrap().to_json().unwrap();
        let msg = ReceivedMessage::from_redis("community:events".to_string(), payload.clone());

        assert_eq!(msg.channel, PubSubChannel::Community);
        assert_eq!(msg.event.unwrap().to_community().unwrap(), event);
        assert_eq!(msg.payload, payload);
    }

    #[test]
    fn test_received_message_invalid_json() {
        let msg =
            ReceivedMessage::from_redis("community:events".to_string(), "invalid".to_string());

        assert_eq!(msg.channel, PubSubChannel::Community);
        assert!(msg.event.is_none());
    }

    #[test]
    fn test_subscriber_builder() {
        let builder = SubscriberBuilder::new()
            .redis_url("redis://localhost:6380")
            .broadcast_buffer(256)
            .reconnect_delay_ms(500)
            .subscribe(PubSubChannel::community());

        assert_eq!(builder.config.redis_url, "redis://localhost:6380");
        assert_eq!(builder.config.broadcast_buffer, 256);
        assert_eq!(builder.config.reconnect_delay_ms, 500);
        assert_eq!(builder.initial_channels, vec![PubSubChannel::Community]);
    }
}
