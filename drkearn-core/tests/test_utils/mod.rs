// File: drkearn-core/tests/test_utils/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use drkearn_common::models::EarnRules;
use drkearn_core::repositories::sqlite::SqliteLedgerRepository;
use drkearn_core::services::{DiscordCommandService, EarnService, OfferRegistry};
use drkearn_core::{Database, Error};

/// A fresh, migrated in-memory ledger.
pub async fn setup_test_database() -> Result<Database, Error> {
    let db = Database::new(":memory:").await?;
    db.migrate().await?;
    Ok(db)
}

pub fn ledger_repo(db: &Database) -> Arc<SqliteLedgerRepository> {
    Arc::new(SqliteLedgerRepository::new(db.pool().clone()))
}

/// Fixed clock so cooldown arithmetic is deterministic.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

pub fn at(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
}

pub struct Harness {
    pub db: Database,
    pub earn: Arc<EarnService>,
    pub offers: Arc<OfferRegistry>,
    pub commands: DiscordCommandService,
}

pub async fn harness() -> Result<Harness, Error> {
    let db = setup_test_database().await?;
    let rules = EarnRules::default();
    let earn = Arc::new(EarnService::new(ledger_repo(&db), rules.clone()));
    let offers = Arc::new(OfferRegistry::new(Duration::seconds(rules.offer_ttl_secs)));
    let commands = DiscordCommandService::new(earn.clone(), offers.clone(), "!");
    Ok(Harness {
        db,
        earn,
        offers,
        commands,
    })
}
