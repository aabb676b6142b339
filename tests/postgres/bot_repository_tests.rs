//! `PostgreSQL` integration tests for the bot repository.

use crate::postgres::helpers::{BoxError, PreparedRepo, prepared_repo};
use bot_monitor::bot::{
    adapters::memory::ScriptedEndpointProber,
    domain::{Bot, BotHealthUpdate, BotId, BotName, BotStatus, PersistedBotData, RedirectUrl},
    ports::{BotRepository, BotRepositoryError},
    services::BotSweepService,
};
use chrono::{DateTime, Duration as ChronoDuration, Local, TimeZone, Utc};
use diesel::connection::SimpleConnection;
use mockable::{Clock, DefaultClock};
use rstest::rstest;
use std::sync::Arc;
use tokio::sync::watch;

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

fn at(offset_secs: i64) -> FixedClock {
    let base = Utc
        .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp");
    FixedClock(base + ChronoDuration::seconds(offset_secs))
}

fn bot(name: &str, offset_secs: i64) -> Bot {
    Bot::new(
        BotName::new(name).expect("valid name"),
        RedirectUrl::new(format!("https://bots.example.com/r/{name}")).expect("valid url"),
        &at(offset_secs),
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn register_then_find_round_trips(
    #[future] prepared_repo: Result<PreparedRepo, BoxError>,
) -> Result<(), BoxError> {
    let ctx = prepared_repo.await?;
    let created = bot("checkout", 0);

    ctx.repo.register(&created).await?;
    let found = ctx.repo.find_by_id(created.id()).await?;

    assert_eq!(found, Some(created));
    assert_eq!(ctx.repo.find_by_id(BotId::new()).await?, None);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unique_violations_map_to_distinct_errors(
    #[future] prepared_repo: Result<PreparedRepo, BoxError>,
) -> Result<(), BoxError> {
    let ctx = prepared_repo.await?;
    let original = bot("checkout", 0);
    ctx.repo.register(&original).await?;

    let same_name = Bot::new(
        BotName::new("checkout")?,
        RedirectUrl::new("https://elsewhere.example.com/checkout")?,
        &at(1),
    );
    let same_url = Bot::new(
        BotName::new("checkout-mirror")?,
        original.redirect_url().clone(),
        &at(1),
    );

    assert!(matches!(
        ctx.repo.register(&same_name).await,
        Err(BotRepositoryError::DuplicateBotName(_))
    ));
    assert!(matches!(
        ctx.repo.register(&same_url).await,
        Err(BotRepositoryError::DuplicateRedirectUrl(_))
    ));
    let same_id = Bot::from_persisted(PersistedBotData {
        id: original.id(),
        name: BotName::new("checkout-copy")?,
        redirect_url: RedirectUrl::new("https://copies.example.com/checkout")?,
        status: BotStatus::Unknown,
        failures: 0,
        last_ok: None,
        last_error: None,
        last_http_status: None,
        created_at: original.created_at(),
        updated_at: original.updated_at(),
    });
    assert!(matches!(
        ctx.repo.register(&same_id).await,
        Err(BotRepositoryError::DuplicateBot(id)) if id == original.id()
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_all_orders_by_creation_time(
    #[future] prepared_repo: Result<PreparedRepo, BoxError>,
) -> Result<(), BoxError> {
    let ctx = prepared_repo.await?;
    let late = bot("late", 120);
    let early = bot("early", 0);
    let middle = bot("middle", 60);
    for entry in [&late, &early, &middle] {
        ctx.repo.register(entry).await?;
    }

    let listed: Vec<BotId> = ctx.repo.list_all().await?.iter().map(Bot::id).collect();

    assert_eq!(listed, vec![early.id(), middle.id(), late.id()]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_status_persists_monitor_columns(
    #[future] prepared_repo: Result<PreparedRepo, BoxError>,
) -> Result<(), BoxError> {
    let ctx = prepared_repo.await?;
    let created = bot("checkout", 0);
    ctx.repo.register(&created).await?;
    let now = at(60).utc();
    let update = BotHealthUpdate {
        id: created.id(),
        status: BotStatus::Down,
        failures: 4,
        last_ok: None,
        last_error: Some("HTTP 503".to_owned()),
        last_http_status: Some(503),
        updated_at: now,
    };

    ctx.repo.update_status(&update).await?;
    let stored = ctx
        .repo
        .find_by_id(created.id())
        .await?
        .ok_or("bot should exist")?;

    assert_eq!(stored.health_update(), update);
    assert_eq!(stored.created_at(), created.created_at());
    assert_eq!(stored.name(), created.name());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_rows_report_not_found(
    #[future] prepared_repo: Result<PreparedRepo, BoxError>,
) -> Result<(), BoxError> {
    let ctx = prepared_repo.await?;
    let ghost = bot("ghost", 0);

    let updated = ctx.repo.update_status(&ghost.health_update()).await;
    let deleted = ctx.repo.delete(ghost.id()).await;

    assert!(matches!(updated, Err(BotRepositoryError::NotFound(id)) if id == ghost.id()));
    assert!(matches!(deleted, Err(BotRepositoryError::NotFound(id)) if id == ghost.id()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_removes_row(
    #[future] prepared_repo: Result<PreparedRepo, BoxError>,
) -> Result<(), BoxError> {
    let ctx = prepared_repo.await?;
    let created = bot("checkout", 0);
    ctx.repo.register(&created).await?;

    ctx.repo.delete(created.id()).await?;

    assert_eq!(ctx.repo.find_by_id(created.id()).await?, None);
    ctx.repo.register(&bot("checkout", 5)).await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stats_group_by_status(
    #[future] prepared_repo: Result<PreparedRepo, BoxError>,
) -> Result<(), BoxError> {
    let ctx = prepared_repo.await?;
    let degraded = bot("degraded", 0);
    let down = bot("down", 0);
    let fresh = bot("fresh", 0);
    for entry in [&degraded, &down, &fresh] {
        ctx.repo.register(entry).await?;
    }
    let latest = at(300).utc();
    ctx.repo
        .update_status(&BotHealthUpdate {
            status: BotStatus::Degraded,
            failures: 2,
            updated_at: at(120).utc(),
            ..degraded.health_update()
        })
        .await?;
    ctx.repo
        .update_status(&BotHealthUpdate {
            status: BotStatus::Down,
            failures: 5,
            updated_at: latest,
            ..down.health_update()
        })
        .await?;

    let stats = ctx.repo.stats().await?;

    assert_eq!(stats.total(), 3);
    assert_eq!(stats.count(BotStatus::Degraded), 1);
    assert_eq!(stats.count(BotStatus::Down), 1);
    assert_eq!(stats.count(BotStatus::Unknown), 1);
    assert_eq!(stats.total_failures(), 7);
    assert_eq!(stats.last_update(), Some(latest));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn healthy_row_with_failures_is_rejected_by_the_table(
    #[future] prepared_repo: Result<PreparedRepo, BoxError>,
) -> Result<(), BoxError> {
    let ctx = prepared_repo.await?;
    let created = bot("checkout", 0);
    ctx.repo.register(&created).await?;

    let result = ctx
        .repo
        .update_status(&BotHealthUpdate {
            status: BotStatus::Healthy,
            failures: 3,
            ..created.health_update()
        })
        .await;

    assert!(matches!(result, Err(BotRepositoryError::Persistence(_))));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_persisted_name_is_invalid_data(
    #[future] prepared_repo: Result<PreparedRepo, BoxError>,
) -> Result<(), BoxError> {
    let ctx = prepared_repo.await?;
    let id = uuid::Uuid::new_v4();
    let mut conn = ctx.pool.get()?;
    conn.batch_execute(&format!(
        "INSERT INTO bots (id, name, redirect_url) VALUES ('{id}', '   ', 'https://bots.example.com/r/blank')"
    ))?;
    drop(conn);

    let result = ctx.repo.find_by_id(BotId::from_uuid(id)).await;

    assert!(matches!(
        result,
        Err(BotRepositoryError::InvalidPersistedData(_))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn schemeless_row_does_not_hide_the_rest_of_the_fleet(
    #[future] prepared_repo: Result<PreparedRepo, BoxError>,
) -> Result<(), BoxError> {
    let ctx = prepared_repo.await?;
    let valid = bot("checkout", 0);
    ctx.repo.register(&valid).await?;
    let mut conn = ctx.pool.get()?;
    conn.batch_execute(&format!(
        "INSERT INTO bots (id, name, redirect_url) VALUES ('{}', 'telegram', 't.me/some_bot')",
        uuid::Uuid::new_v4()
    ))?;
    drop(conn);

    let listed: Vec<BotId> = ctx.repo.list_all().await?.iter().map(Bot::id).collect();
    assert_eq!(listed, vec![valid.id()]);

    let prober = Arc::new(ScriptedEndpointProber::new());
    let sweeper = BotSweepService::new(
        Arc::new(ctx.repo.clone()),
        Arc::clone(&prober),
        Arc::new(DefaultClock),
    );
    let (_sender, shutdown) = watch::channel(false);
    let report = sweeper.run_sweep(&shutdown).await?;

    assert_eq!(report.probed, 1);
    assert_eq!(report.healthy, 1);
    assert_eq!(prober.probe_count(valid.redirect_url()), 1);
    let stored = ctx
        .repo
        .find_by_id(valid.id())
        .await?
        .ok_or("bot should exist")?;
    assert_eq!(stored.status(), BotStatus::Healthy);
    Ok(())
}
