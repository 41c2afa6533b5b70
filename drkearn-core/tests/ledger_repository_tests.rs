// File: drkearn-core/tests/ledger_repository_tests.rs

mod test_utils;

use chrono::Duration;

use drkearn_common::models::{AdCredit, CreditOutcome, LedgerStats};
use drkearn_common::traits::LedgerRepository;
use drkearn_core::repositories::sqlite::SqliteLedgerRepository;
use drkearn_core::{Database, Error};

use test_utils::*;

fn credit_at(secs: i64, ad_type: &str) -> AdCredit {
    AdCredit {
        ad_type: ad_type.to_string(),
        amount: 100,
        watched_at: at(secs),
        daily_cap: 10,
        cooldown_secs: 120,
    }
}

fn credit_at_millis(millis: i64, ad_type: &str) -> AdCredit {
    AdCredit {
        watched_at: t0() + Duration::milliseconds(millis),
        ..credit_at(0, ad_type)
    }
}

async fn count_watches(db: &Database, user: &str) -> Result<i64, Error> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ad_watches WHERE user_id = ?")
        .bind(user)
        .fetch_one(db.pool())
        .await?;
    Ok(n)
}

#[tokio::test]
async fn test_register_is_idempotent() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let repo = ledger_repo(&db);

    assert!(repo.register_user("1001", t0()).await?);
    assert!(!repo.register_user("1001", at(60)).await?);

    let user = repo.get_user("1001").await?.expect("user should exist");
    assert_eq!(user.money, 0);
    assert_eq!(user.ads_watched_today, 0);
    assert_eq!(user.total_ads_watched, 0);
    assert!(user.last_ad_at.is_none());
    // The second call must not overwrite the existing record.
    assert_eq!(user.created_at, t0());

    assert!(repo.get_user("2002").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_credit_updates_counters_and_audit_log() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let repo = ledger_repo(&db);
    repo.register_user("1001", t0()).await?;

    let outcome = repo.credit_ad_watch("1001", &credit_at(0, "ad_1")).await?;
    let CreditOutcome::Credited(user) = outcome else {
        panic!("expected a credit, got {outcome:?}");
    };
    assert_eq!(user.money, 100);
    assert_eq!(user.ads_watched_today, 1);
    assert_eq!(user.total_ads_watched, 1);
    assert_eq!(user.last_ad_at, Some(t0()));

    let watches = repo.list_ad_watches("1001", 10).await?;
    assert_eq!(watches.len(), 1);
    assert_eq!(watches[0].ad_type, "ad_1");
    assert_eq!(watches[0].watched_at, t0());
    assert_eq!(watches[0].user_id, "1001");
    Ok(())
}

#[tokio::test]
async fn test_credit_refused_during_cooldown_writes_nothing() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let repo = ledger_repo(&db);
    repo.register_user("1001", t0()).await?;
    repo.credit_ad_watch("1001", &credit_at(0, "ad_1")).await?;

    let outcome = repo.credit_ad_watch("1001", &credit_at(30, "ad_2")).await?;
    assert_eq!(outcome, CreditOutcome::CoolingDown { remaining_secs: 90 });

    let user = repo.get_user("1001").await?.expect("user should exist");
    assert_eq!(user.money, 100);
    assert_eq!(user.ads_watched_today, 1);
    assert_eq!(count_watches(&db, "1001").await?, 1);

    // Exactly at the cooldown boundary the credit goes through.
    let outcome = repo.credit_ad_watch("1001", &credit_at(120, "ad_2")).await?;
    assert!(matches!(outcome, CreditOutcome::Credited(ref u) if u.money == 200));
    Ok(())
}

#[tokio::test]
async fn test_cooldown_holds_to_the_millisecond() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let repo = ledger_repo(&db);
    repo.register_user("1001", t0()).await?;

    let first = repo.credit_ad_watch("1001", &credit_at_millis(900, "ad_1")).await?;
    assert!(matches!(first, CreditOutcome::Credited(ref u)
        if u.last_ad_at == Some(t0() + Duration::milliseconds(900))));

    // 119.2 s after the first credit: still inside the window.
    let early = repo
        .credit_ad_watch("1001", &credit_at_millis(900 + 119_200, "ad_2"))
        .await?;
    assert_eq!(early, CreditOutcome::CoolingDown { remaining_secs: 1 });

    let one_ms_short = repo
        .credit_ad_watch("1001", &credit_at_millis(900 + 119_999, "ad_2"))
        .await?;
    assert_eq!(one_ms_short, CreditOutcome::CoolingDown { remaining_secs: 1 });

    let user = repo.get_user("1001").await?.expect("user should exist");
    assert_eq!(user.money, 100);
    assert_eq!(count_watches(&db, "1001").await?, 1);

    let on_time = repo
        .credit_ad_watch("1001", &credit_at_millis(900 + 120_000, "ad_2"))
        .await?;
    assert!(matches!(on_time, CreditOutcome::Credited(ref u) if u.money == 200));
    Ok(())
}

#[tokio::test]
async fn test_credit_refused_at_daily_cap() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let repo = ledger_repo(&db);
    repo.register_user("1001", t0()).await?;

    for i in 0..10 {
        let outcome = repo
            .credit_ad_watch("1001", &credit_at(i * 120, &format!("ad_{}", i + 1)))
            .await?;
        assert!(matches!(outcome, CreditOutcome::Credited(_)), "ad {} refused", i + 1);
    }

    let outcome = repo.credit_ad_watch("1001", &credit_at(10 * 120, "ad_11")).await?;
    assert_eq!(outcome, CreditOutcome::DailyCapReached);

    let user = repo.get_user("1001").await?.expect("user should exist");
    assert_eq!(user.money, 1000);
    assert_eq!(user.ads_watched_today, 10);
    assert_eq!(count_watches(&db, "1001").await?, 10);
    Ok(())
}

#[tokio::test]
async fn test_credit_for_unknown_user() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let repo = ledger_repo(&db);

    let outcome = repo.credit_ad_watch("ghost", &credit_at(0, "ad_1")).await?;
    assert_eq!(outcome, CreditOutcome::NotRegistered);
    assert_eq!(count_watches(&db, "ghost").await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_reset_only_touches_daily_counter() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let repo = ledger_repo(&db);
    repo.register_user("1001", t0()).await?;
    repo.register_user("1002", t0()).await?;
    repo.credit_ad_watch("1001", &credit_at(0, "ad_1")).await?;
    repo.credit_ad_watch("1001", &credit_at(120, "ad_2")).await?;

    let touched = repo.reset_daily_counts().await?;
    assert_eq!(touched, 2);

    let user = repo.get_user("1001").await?.expect("user should exist");
    assert_eq!(user.ads_watched_today, 0);
    assert_eq!(user.money, 200);
    assert_eq!(user.total_ads_watched, 2);
    assert_eq!(user.last_ad_at, Some(at(120)));
    Ok(())
}

#[tokio::test]
async fn test_stats_aggregate_all_users() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let repo = ledger_repo(&db);
    assert_eq!(repo.stats().await?, LedgerStats::default());

    repo.register_user("1001", t0()).await?;
    repo.register_user("1002", t0()).await?;
    repo.register_user("1003", t0()).await?;
    repo.credit_ad_watch("1001", &credit_at(0, "ad_1")).await?;
    repo.credit_ad_watch("1002", &credit_at(0, "ad_1")).await?;
    repo.credit_ad_watch("1002", &credit_at(120, "ad_2")).await?;

    let stats = repo.stats().await?;
    assert_eq!(stats.total_users, 3);
    assert_eq!(stats.total_money, 300);
    assert_eq!(stats.total_ads_watched, 3);
    Ok(())
}

#[tokio::test]
async fn test_list_ad_watches_newest_first() -> Result<(), Error> {
    let db = setup_test_database().await?;
    let repo = ledger_repo(&db);
    repo.register_user("1001", t0()).await?;
    for i in 0..3 {
        repo.credit_ad_watch("1001", &credit_at(i * 120, &format!("ad_{}", i + 1)))
            .await?;
    }

    let watches = repo.list_ad_watches("1001", 2).await?;
    let types: Vec<_> = watches.iter().map(|w| w.ad_type.as_str()).collect();
    assert_eq!(types, vec!["ad_3", "ad_2"]);
    Ok(())
}

#[tokio::test]
async fn test_ledger_survives_reopen() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("ledger.db");
    let url = path.to_string_lossy().to_string();

    {
        let db = Database::new(&url).await?;
        db.migrate().await?;
        let repo = SqliteLedgerRepository::new(db.pool().clone());
        repo.register_user("1001", t0()).await?;
        repo.credit_ad_watch("1001", &credit_at(0, "ad_1")).await?;
        db.pool().close().await;
    }

    let db = Database::new(&url).await?;
    db.migrate().await?;
    let repo = SqliteLedgerRepository::new(db.pool().clone());
    let user = repo.get_user("1001").await?.expect("user should persist");
    assert_eq!(user.money, 100);
    assert_eq!(repo.list_ad_watches("1001", 10).await?.len(), 1);
    Ok(())
}
