//! Pub/Sub channel definitions.
//!
//! Every instance publishes committed community changes to one shared
//! channel and listens on it to refresh its own live queries.

/// Channel carrying community change events between instances
pub const COMMUNITY_CHANNEL: &str = "community:events";

/// Pub/Sub channel types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PubSubChannel {
    /// Shared change feed
    Community,
    /// Custom channel name
    Custom(String),
}

impl PubSubChannel {
    #[must_use]
    pub fn community() -> Self {
        Self::Community
    }

    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Get the Redis channel name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Community => COMMUNITY_CHANNEL.to_string(),
            Self::Custom(name) => name.clone(),
        }
    }

    /// Parse a channel name back to a `PubSubChannel`
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name == COMMUNITY_CHANNEL {
            Self::Community
        } else {
            Self::Custom(name.to_string())
        }
    }
}

impl std::fmt::Display for PubSubChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
