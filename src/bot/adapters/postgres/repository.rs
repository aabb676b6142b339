//! `PostgreSQL` repository implementation for bots.

use super::{
    models::{BotHealthChangeset, BotRow, NewBotRow},
    schema::bots,
};
use crate::bot::{
    domain::{
        Bot, BotDomainError, BotFleetStats, BotHealthUpdate, BotId, BotName, BotStatus,
        PersistedBotData, RedirectUrl,
    },
    ports::{BotRepository, BotRepositoryError, BotRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::{count_star, max, sum};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::warn;

/// `PostgreSQL` connection pool type for bot adapters.
pub type BotPgPool = Pool<ConnectionManager<PgConnection>>;

const REDIRECT_URL_CONSTRAINT: &str = "uq_bot_redirect_url";
const NAME_CONSTRAINT: &str = "uq_bot_name";

/// `PostgreSQL`-backed repository for bot records.
#[derive(Debug, Clone)]
pub struct PostgresBotRepository {
    pool: BotPgPool,
}

impl PostgresBotRepository {
    /// Creates a new repository from a `PostgreSQL` pool.
    #[must_use]
    pub const fn new(pool: BotPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, operation: F) -> BotRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> BotRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(BotRepositoryError::persistence)?;
            operation(&mut connection)
        })
        .await
        .map_err(BotRepositoryError::persistence)?
    }
}

#[async_trait]
impl BotRepository for PostgresBotRepository {
    async fn register(&self, bot: &Bot) -> BotRepositoryResult<()> {
        let bot_id = bot.id();
        let bot_name = bot.name().clone();
        let redirect_url = bot.redirect_url().clone();
        let new_row = to_new_row(bot);

        self.run_blocking(move |connection| {
            diesel::insert_into(bots::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
                        match info.constraint_name() {
                            Some(REDIRECT_URL_CONSTRAINT) => {
                                BotRepositoryError::DuplicateRedirectUrl(redirect_url.clone())
                            }
                            Some(NAME_CONSTRAINT) => {
                                BotRepositoryError::DuplicateBotName(bot_name.clone())
                            }
                            _ => BotRepositoryError::DuplicateBot(bot_id),
                        }
                    }
                    _ => BotRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, bot_id: BotId) -> BotRepositoryResult<Option<Bot>> {
        self.run_blocking(move |connection| {
            let row = bots::table
                .filter(bots::id.eq(bot_id.into_inner()))
                .select(BotRow::as_select())
                .first::<BotRow>(connection)
                .optional()
                .map_err(BotRepositoryError::persistence)?;
            row.map(row_to_bot).transpose()
        })
        .await
    }

    async fn list_all(&self) -> BotRepositoryResult<Vec<Bot>> {
        self.run_blocking(move |connection| {
            let rows = bots::table
                .order_by((bots::created_at.asc(), bots::id.asc()))
                .select(BotRow::as_select())
                .load::<BotRow>(connection)
                .map_err(BotRepositoryError::persistence)?;
            Ok(decode_listing(rows))
        })
        .await
    }

    async fn update_status(&self, update: &BotHealthUpdate) -> BotRepositoryResult<()> {
        let bot_id = update.id;
        let changeset = to_changeset(update);

        self.run_blocking(move |connection| {
            let updated_count =
                diesel::update(bots::table.filter(bots::id.eq(bot_id.into_inner())))
                    .set(&changeset)
                    .execute(connection)
                    .map_err(BotRepositoryError::persistence)?;

            if updated_count == 0 {
                return Err(BotRepositoryError::NotFound(bot_id));
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, bot_id: BotId) -> BotRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let deleted_count =
                diesel::delete(bots::table.filter(bots::id.eq(bot_id.into_inner())))
                    .execute(connection)
                    .map_err(BotRepositoryError::persistence)?;

            if deleted_count == 0 {
                return Err(BotRepositoryError::NotFound(bot_id));
            }
            Ok(())
        })
        .await
    }

    async fn stats(&self) -> BotRepositoryResult<BotFleetStats> {
        self.run_blocking(move |connection| {
            let groups = bots::table
                .group_by(bots::status)
                .select((
                    bots::status,
                    count_star(),
                    sum(bots::failures),
                    max(bots::updated_at),
                ))
                .load::<(String, i64, Option<i64>, Option<DateTime<Utc>>)>(connection)
                .map_err(BotRepositoryError::persistence)?;

            groups.into_iter().try_fold(
                BotFleetStats::default(),
                |stats, (status, count, failures, last_update)| {
                    let parsed_status = BotStatus::try_from(status.as_str())
                        .map_err(BotRepositoryError::invalid_persisted_data)?;
                    Ok(stats.with_group(
                        parsed_status,
                        u64::try_from(count).unwrap_or_default(),
                        failures.and_then(|total| u64::try_from(total).ok()).unwrap_or_default(),
                        last_update,
                    ))
                },
            )
        })
        .await
    }
}

/// Decodes listed rows. Rows that fail validation are logged and skipped.
fn decode_listing(rows: Vec<BotRow>) -> Vec<Bot> {
    rows.into_iter()
        .filter_map(|row| {
            let row_id = row.id;
            match row_to_bot(row) {
                Ok(bot) => Some(bot),
                Err(err) => {
                    warn!(bot_id = %row_id, error = %err, "skipping undecodable bot row");
                    None
                }
            }
        })
        .collect()
}

fn to_new_row(bot: &Bot) -> NewBotRow {
    let changeset = to_changeset(&bot.health_update());
    NewBotRow {
        id: bot.id().into_inner(),
        name: bot.name().as_str().to_owned(),
        redirect_url: bot.redirect_url().as_str().to_owned(),
        status: changeset.status,
        failures: changeset.failures,
        last_ok: changeset.last_ok,
        last_error: changeset.last_error,
        last_http_status: changeset.last_http_status,
        created_at: bot.created_at(),
        updated_at: changeset.updated_at,
    }
}

fn to_changeset(update: &BotHealthUpdate) -> BotHealthChangeset {
    BotHealthChangeset {
        status: update.status.as_str().to_owned(),
        failures: i32::try_from(update.failures).unwrap_or(i32::MAX),
        last_ok: update.last_ok,
        last_error: update.last_error.clone(),
        last_http_status: update.last_http_status.map(i32::from),
        updated_at: update.updated_at,
    }
}

fn row_to_bot(row: BotRow) -> BotRepositoryResult<Bot> {
    let BotRow {
        id,
        name,
        redirect_url,
        status,
        failures,
        last_ok,
        last_error,
        last_http_status,
        created_at,
        updated_at,
    } = row;

    let parsed_name = BotName::new(name).map_err(BotRepositoryError::invalid_persisted_data)?;
    let parsed_url =
        RedirectUrl::new(redirect_url).map_err(BotRepositoryError::invalid_persisted_data)?;
    let parsed_status = BotStatus::try_from(status.as_str())
        .map_err(BotRepositoryError::invalid_persisted_data)?;
    let parsed_failures = u32::try_from(failures).map_err(|_| {
        BotRepositoryError::invalid_persisted_data(BotDomainError::NegativeFailureCount(failures))
    })?;
    let parsed_http_status = last_http_status
        .map(|code| {
            u16::try_from(code).map_err(|_| {
                BotRepositoryError::invalid_persisted_data(BotDomainError::InvalidHttpStatus(code))
            })
        })
        .transpose()?;

    Ok(Bot::from_persisted(PersistedBotData {
        id: BotId::from_uuid(id),
        name: parsed_name,
        redirect_url: parsed_url,
        status: parsed_status,
        failures: parsed_failures,
        last_ok,
        last_error,
        last_http_status: parsed_http_status,
        created_at,
        updated_at,
    }))
}
