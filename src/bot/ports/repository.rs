//! Repository port for bot persistence.

use crate::bot::domain::{Bot, BotFleetStats, BotHealthUpdate, BotId, BotName, RedirectUrl};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for bot repository operations.
pub type BotRepositoryResult<T> = Result<T, BotRepositoryError>;

/// Persistence contract for bot records.
///
/// Consistency is row-level only: every method is atomic for the row it
/// touches and no lock spans several rows.
#[async_trait]
pub trait BotRepository: Send + Sync {
    /// Stores a new bot.
    ///
    /// # Errors
    ///
    /// Returns [`BotRepositoryError::DuplicateBot`] when the ID already
    /// exists, [`BotRepositoryError::DuplicateBotName`] when the name is
    /// taken, or [`BotRepositoryError::DuplicateRedirectUrl`] when another bot
    /// already targets the same URL.
    async fn register(&self, bot: &Bot) -> BotRepositoryResult<()>;

    /// Finds a bot by identifier.
    async fn find_by_id(&self, bot_id: BotId) -> BotRepositoryResult<Option<Bot>>;

    /// Returns every bot ordered by creation time, then identifier.
    async fn list_all(&self) -> BotRepositoryResult<Vec<Bot>>;

    /// Atomically writes the monitor-owned columns of one bot.
    ///
    /// # Errors
    ///
    /// Returns [`BotRepositoryError::NotFound`] when the row no longer
    /// exists.
    async fn update_status(&self, update: &BotHealthUpdate) -> BotRepositoryResult<()>;

    /// Removes a bot.
    ///
    /// # Errors
    ///
    /// Returns [`BotRepositoryError::NotFound`] when the row does not exist.
    async fn delete(&self, bot_id: BotId) -> BotRepositoryResult<()>;

    /// Computes aggregate statistics over every bot.
    async fn stats(&self) -> BotRepositoryResult<BotFleetStats>;
}

/// Errors returned by bot repository implementations.
#[derive(Debug, Clone, Error)]
pub enum BotRepositoryError {
    /// A bot with the same identifier already exists.
    #[error("duplicate bot identifier: {0}")]
    DuplicateBot(BotId),

    /// A bot with the same name already exists.
    #[error("duplicate bot name: {0}")]
    DuplicateBotName(BotName),

    /// Another bot already targets the same redirect URL.
    #[error("duplicate redirect URL: {0}")]
    DuplicateRedirectUrl(RedirectUrl),

    /// The bot was not found.
    #[error("bot not found: {0}")]
    NotFound(BotId),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted bot data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl BotRepositoryError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
