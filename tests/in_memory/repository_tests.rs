//! Contract tests for the in-memory bot store.

use super::helpers::{Harness, bot_url, harness};
use bot_monitor::bot::{
    domain::{Bot, BotHealthUpdate, BotId, BotName, BotStatus, RedirectUrl},
    ports::{BotRepository, BotRepositoryError},
};
use rstest::rstest;

#[rstest]
#[tokio::test]
async fn duplicate_name_is_rejected(harness: Harness) {
    harness.register("alpha").await;
    let clash = Bot::new(
        BotName::new("alpha").expect("valid name"),
        RedirectUrl::new("https://other.example.com/alpha").expect("valid url"),
        &*harness.clock,
    );

    let result = harness.repository.register(&clash).await;

    assert!(matches!(result, Err(BotRepositoryError::DuplicateBotName(name)) if name.as_str() == "alpha"));
}

#[rstest]
#[tokio::test]
async fn duplicate_redirect_url_is_rejected(harness: Harness) {
    harness.register("alpha").await;
    let clash = Bot::new(
        BotName::new("beta").expect("valid name"),
        bot_url("alpha"),
        &*harness.clock,
    );

    let result = harness.repository.register(&clash).await;

    assert!(matches!(result, Err(BotRepositoryError::DuplicateRedirectUrl(url)) if url == bot_url("alpha")));
}

#[rstest]
#[tokio::test]
async fn duplicate_id_is_rejected(harness: Harness) {
    let bot = harness.register("alpha").await;

    let result = harness.repository.register(&bot).await;

    assert!(matches!(result, Err(BotRepositoryError::DuplicateBot(id)) if id == bot.id()));
}

#[rstest]
#[tokio::test]
async fn list_is_ordered_by_creation_time(harness: Harness) {
    let first = harness.register("zulu").await;
    harness.clock.advance(5);
    let second = harness.register("alpha").await;
    harness.clock.advance(5);
    let third = harness.register("mike").await;

    let listed: Vec<BotId> = harness
        .repository
        .list_all()
        .await
        .expect("list succeeds")
        .iter()
        .map(Bot::id)
        .collect();

    assert_eq!(listed, vec![first.id(), second.id(), third.id()]);
}

#[rstest]
#[tokio::test]
async fn update_and_delete_of_missing_bot_report_not_found(harness: Harness) {
    let ghost = BotId::new();
    let update = BotHealthUpdate {
        id: ghost,
        status: BotStatus::Healthy,
        failures: 0,
        last_ok: None,
        last_error: None,
        last_http_status: Some(200),
        updated_at: harness.clock_now(),
    };

    let updated = harness.repository.update_status(&update).await;
    let deleted = harness.repository.delete(ghost).await;

    assert!(matches!(updated, Err(BotRepositoryError::NotFound(id)) if id == ghost));
    assert!(matches!(deleted, Err(BotRepositoryError::NotFound(id)) if id == ghost));
}

#[rstest]
#[tokio::test]
async fn delete_frees_name_and_url(harness: Harness) {
    let bot = harness.register("alpha").await;

    harness
        .repository
        .delete(bot.id())
        .await
        .expect("delete succeeds");

    harness.register("alpha").await;
}

#[rstest]
#[tokio::test]
async fn stats_aggregate_per_status(harness: Harness) {
    let healthy = harness.register("healthy").await;
    let down = harness.register("down").await;
    harness.register("fresh").await;
    harness.clock.advance(30);
    let now = harness.clock_now();

    for update in [
        BotHealthUpdate {
            id: healthy.id(),
            status: BotStatus::Healthy,
            failures: 0,
            last_ok: Some(now),
            last_error: None,
            last_http_status: Some(302),
            updated_at: now,
        },
        BotHealthUpdate {
            id: down.id(),
            status: BotStatus::Down,
            failures: 7,
            last_ok: None,
            last_error: Some("connection refused".to_owned()),
            last_http_status: None,
            updated_at: now,
        },
    ] {
        harness
            .repository
            .update_status(&update)
            .await
            .expect("update succeeds");
    }

    let stats = harness.repository.stats().await.expect("stats succeed");

    assert_eq!(stats.total(), 3);
    assert_eq!(stats.count(BotStatus::Healthy), 1);
    assert_eq!(stats.count(BotStatus::Down), 1);
    assert_eq!(stats.count(BotStatus::Unknown), 1);
    assert_eq!(stats.count(BotStatus::Degraded), 0);
    assert_eq!(stats.total_failures(), 7);
    assert_eq!(stats.last_update(), Some(now));
}

#[rstest]
#[tokio::test]
async fn unavailable_store_fails_every_call(harness: Harness) {
    let bot = harness.register("alpha").await;
    harness
        .repository
        .set_unavailable(true)
        .expect("toggle succeeds");

    assert!(matches!(
        harness.repository.list_all().await,
        Err(BotRepositoryError::Persistence(_))
    ));
    assert!(matches!(
        harness.repository.update_status(&bot.health_update()).await,
        Err(BotRepositoryError::Persistence(_))
    ));
    assert!(matches!(
        harness.repository.stats().await,
        Err(BotRepositoryError::Persistence(_))
    ));
}
