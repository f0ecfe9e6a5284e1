//! Service context - dependency container for services
//!
//! Holds the repositories, the change feed, and the live registry shared by
//! every service.

use std::sync::Arc;

use grace_cache::Publisher;
use grace_common::LiveConfig;
use grace_core::traits::{CommentRepository, PostRepository, ReactionRepository};
use grace_core::{Snowflake, SnowflakeGenerator};
use grace_db::{MemoryStore, Store};

use super::error::{ServiceError, ServiceResult};
use crate::live::{ChangeFeed, LiveRegistry};

/// Service context containing all dependencies
///
/// Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    post_repo: Arc<dyn PostRepository>,
    reaction_repo: Arc<dyn ReactionRepository>,
    comment_repo: Arc<dyn CommentRepository>,

    // Live updates
    feed: ChangeFeed,
    live: LiveRegistry,
    live_config: LiveConfig,

    snowflake_generator: Arc<SnowflakeGenerator>,
}

impl ServiceContext {
    /// Create a new service context.
    ///
    /// The live registry reads through the same post and comment
    /// repositories the services write to.
    pub fn new(
        post_repo: Arc<dyn PostRepository>,
        reaction_repo: Arc<dyn ReactionRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        feed: ChangeFeed,
        live_config: LiveConfig,
        snowflake_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        let live = LiveRegistry::new(Arc::clone(&post_repo), Arc::clone(&comment_repo), feed.clone());

        Self {
            post_repo,
            reaction_repo,
            comment_repo,
            feed,
            live,
            live_config,
            snowflake_generator,
        }
    }

    // === Repositories ===

    pub fn post_repo(&self) -> &dyn PostRepository {
        self.post_repo.as_ref()
    }

    pub fn reaction_repo(&self) -> &dyn ReactionRepository {
        self.reaction_repo.as_ref()
    }

    pub fn comment_repo(&self) -> &dyn CommentRepository {
        self.comment_repo.as_ref()
    }

    // === Live updates ===

    /// Change feed every committed write is announced on
    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Registry of live queries
    pub fn live(&self) -> &LiveRegistry {
        &self.live
    }

    pub fn live_config(&self) -> &LiveConfig {
        &self.live_config
    }

    // === IDs ===

    pub fn snowflake_generator(&self) -> &SnowflakeGenerator {
        self.snowflake_generator.as_ref()
    }

    /// Generate a new Snowflake ID
    pub fn generate_id(&self) -> Snowflake {
        self.snowflake_generator.generate()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("feed", &self.feed)
            .field("live", &self.live)
            .field("live_config", &self.live_config)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    post_repo: Option<Arc<dyn PostRepository>>,
    reaction_repo: Option<Arc<dyn ReactionRepository>>,
    comment_repo: Option<Arc<dyn CommentRepository>>,
    snowflake_generator: Option<Arc<SnowflakeGenerator>>,
    live_config: Option<LiveConfig>,
    publisher: Option<Publisher>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post_repo(mut self, repo: Arc<dyn PostRepository>) -> Self {
        self.post_repo = Some(repo);
        self
    }

    pub fn reaction_repo(mut self, repo: Arc<dyn ReactionRepository>) -> Self {
        self.reaction_repo = Some(repo);
        self
    }

    pub fn comment_repo(mut self, repo: Arc<dyn CommentRepository>) -> Self {
        self.comment_repo = Some(repo);
        self
    }

    /// Back all three repositories with one in-memory store
    pub fn memory(self, store: Arc<MemoryStore>) -> Self {
        self.post_repo(store.clone())
            .reaction_repo(store.clone())
            .comment_repo(store)
    }

    /// Take all three repositories from a connected store
    pub fn store(self, store: &Store) -> Self {
        self.post_repo(store.post_repo())
            .reaction_repo(store.reaction_repo())
            .comment_repo(store.comment_repo())
    }

    pub fn snowflake_generator(mut self, generator: Arc<SnowflakeGenerator>) -> Self {
        self.snowflake_generator = Some(generator);
        self
    }

    pub fn live_config(mut self, config: LiveConfig) -> Self {
        self.live_config = Some(config);
        self
    }

    /// Relay emitted changes to other instances
    pub fn publisher(mut self, publisher: Publisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any repository is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let live_config = self.live_config.unwrap_or_default();
        let mut feed = ChangeFeed::new(live_config.broadcast_capacity);
        if let Some(publisher) = self.publisher {
            feed = feed.with_publisher(publisher);
        }

        Ok(ServiceContext::new(
            self.post_repo
                .ok_or_else(|| ServiceError::validation("post_repo is required"))?,
            self.reaction_repo
                .ok_or_else(|| ServiceError::validation("reaction_repo is required"))?,
            self.comment_repo
                .ok_or_else(|| ServiceError::validation("comment_repo is required"))?,
            feed,
            live_config,
            self.snowflake_generator.unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_repositories() {
        let err = ServiceContextBuilder::new().build().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("post_repo"));
    }

    #[tokio::test]
    async fn test_builder_with_memory_store() {
        let ctx = ServiceContextBuilder::new()
            .memory(Arc::new(MemoryStore::new()))
            .snowflake_generator(Arc::new(SnowflakeGenerator::new(3)))
            .build()
            .unwrap();

        assert_eq!(ctx.snowflake_generator().worker_id(), 3);
        assert_eq!(ctx.live_config().toggle_read_timeout_ms, 2_000);
        assert!(ctx.feed().origin().is_none());
        assert_eq!(ctx.live().active_queries(), 0);
    }
}
