//! Cross-process change relay
//!
//! Feeds community events published to Redis by API instances into this
//! gateway's change feed, so live queries here see writes made elsewhere.

mod feed_relay;

pub use feed_relay::{FeedRelay, FeedRelayConfig};
