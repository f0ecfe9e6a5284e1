//! # grace-cache
//!
//! Redis layer relaying community change events between server instances.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Pub/Sub**: Publish committed changes on `community:events` and
//!   rebroadcast received ones in-process
//!
//! ## Example
//!
//! ```ignore
//! use grace_cache::{PubSubChannel, Publisher, RedisPool, RedisPoolConfig, SubscriberBuilder};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let publisher = Publisher::new(pool, "node-a");
//! publisher.publish_community(&event).await?;
//!
//! let subscriber = SubscriberBuilder::new()
//!     .subscribe(PubSubChannel::community())
//!     .build()
//!     .await?;
//! let mut rx = subscriber.receiver();
//! ```

pub mod pool;
pub mod pubsub;

pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};
pub use pubsub::{
    PubSubChannel, PubSubEvent, Publisher, ReceivedMessage, Subscriber, SubscriberBuilder,
    SubscriberConfig, SubscriberError, SubscriberResult, COMMUNITY_CHANNEL,
};
