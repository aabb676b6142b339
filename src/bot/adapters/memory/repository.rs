//! In-memory repository for bot records.

use crate::bot::{
    domain::{Bot, BotFleetStats, BotHealthUpdate, BotId, BotName, RedirectUrl},
    ports::{BotRepository, BotRepositoryError, BotRepositoryResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory bot repository.
///
/// Enforces the same uniqueness rules as the `PostgreSQL` table. The store can
/// be switched into an unavailable mode in which every call fails with a
/// persistence error, which models a lost database connection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBotRepository {
    state: Arc<RwLock<InMemoryBotState>>,
}

#[derive(Debug, Default)]
struct InMemoryBotState {
    bots: HashMap<BotId, Bot>,
    name_index: HashMap<BotName, BotId>,
    url_index: HashMap<RedirectUrl, BotId>,
    unavailable: bool,
}

impl InMemoryBotRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles simulated unavailability.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn set_unavailable(&self, unavailable: bool) -> BotRepositoryResult<()> {
        let mut state = self.state.write().map_err(|err| {
            BotRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        state.unavailable = unavailable;
        Ok(())
    }

    fn read_state(&self) -> BotRepositoryResult<RwLockReadGuard<'_, InMemoryBotState>> {
        let state = self.state.read().map_err(|err| {
            BotRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        if state.unavailable {
            return Err(unavailable_error());
        }
        Ok(state)
    }

    fn write_state(&self) -> BotRepositoryResult<RwLockWriteGuard<'_, InMemoryBotState>> {
        let state = self.state.write().map_err(|err| {
            BotRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        if state.unavailable {
            return Err(unavailable_error());
        }
        Ok(state)
    }
}

fn unavailable_error() -> BotRepositoryError {
    BotRepositoryError::persistence(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "bot store is unavailable",
    ))
}

#[async_trait]
impl BotRepository for InMemoryBotRepository {
    async fn register(&self, bot: &Bot) -> BotRepositoryResult<()> {
        let mut state = self.write_state()?;

        if state.bots.contains_key(&bot.id()) {
            return Err(BotRepositoryError::DuplicateBot(bot.id()));
        }

        if state.name_index.contains_key(bot.name()) {
            return Err(BotRepositoryError::DuplicateBotName(bot.name().clone()));
        }

        if state.url_index.contains_key(bot.redirect_url()) {
            return Err(BotRepositoryError::DuplicateRedirectUrl(
                bot.redirect_url().clone(),
            ));
        }

        state.name_index.insert(bot.name().clone(), bot.id());
        state.url_index.insert(bot.redirect_url().clone(), bot.id());
        state.bots.insert(bot.id(), bot.clone());
        Ok(())
    }

    async fn find_by_id(&self, bot_id: BotId) -> BotRepositoryResult<Option<Bot>> {
        let state = self.read_state()?;
        Ok(state.bots.get(&bot_id).cloned())
    }

    async fn list_all(&self) -> BotRepositoryResult<Vec<Bot>> {
        let state = self.read_state()?;
        let mut bots: Vec<Bot> = state.bots.values().cloned().collect();
        bots.sort_by_key(|bot| (bot.created_at(), bot.id()));
        Ok(bots)
    }

    async fn update_status(&self, update: &BotHealthUpdate) -> BotRepositoryResult<()> {
        let mut state = self.write_state()?;
        let bot = state
            .bots
            .get_mut(&update.id)
            .ok_or(BotRepositoryError::NotFound(update.id))?;
        bot.apply_health_update(update);
        Ok(())
    }

    async fn delete(&self, bot_id: BotId) -> BotRepositoryResult<()> {
        let mut state = self.write_state()?;
        let removed = state
            .bots
            .remove(&bot_id)
            .ok_or(BotRepositoryError::NotFound(bot_id))?;
        state.name_index.remove(removed.name());
        state.url_index.remove(removed.redirect_url());
        Ok(())
    }

    async fn stats(&self) -> BotRepositoryResult<BotFleetStats> {
        let state = self.read_state()?;
        Ok(BotFleetStats::from_bots(state.bots.values()))
    }
}
