//! Live queries: change feed, registry, and subscription handles

mod feed;
mod query;
mod registry;
mod subscription;

pub use feed::{spawn_relay, ChangeFeed};
pub use query::{LiveError, LiveResult, QueryKey, Snapshot};
pub use registry::LiveRegistry;
pub use subscription::{Subscription, SubscriptionState};
