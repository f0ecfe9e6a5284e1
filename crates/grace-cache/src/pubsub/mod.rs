//! Redis Pub/Sub module.
//!
//! Relays community change events between server instances.

mod channels;
mod publisher;
mod subscriber;

pub use channels::{PubSubChannel, COMMUNITY_CHANNEL};
pub use publisher::{PubSubEvent, Publisher};
pub use subscriber::{
    ReceivedMessage, Subscriber, SubscriberBuilder, SubscriberConfig, SubscriberError,
    SubscriberResult,
};
