//! Value objects - immutable types that represent domain concepts

mod actor;
mod feed;
mod snowflake;

pub use actor::Actor;
pub use feed::{to_store_precision, FeedCursor, Page, PostFilter, FEED_PAGE_SIZE};
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
