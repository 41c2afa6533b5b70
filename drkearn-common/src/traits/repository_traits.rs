use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::models::ledger::{AdCredit, AdWatch, CreditOutcome, LedgerStats, LedgerUser};

/// The persistent users + ad-watch store.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Inserts a zero-balance record. Returns `false` when the id already exists.
    async fn register_user(&self, discord_id: &str, now: DateTime<Utc>) -> Result<bool, Error>;

    async fn get_user(&self, discord_id: &str) -> Result<Option<LedgerUser>, Error>;

    /// Applies one ad credit and appends its audit row, or reports why the
    /// user is not eligible. Nothing is written unless the outcome is
    /// `Credited`.
    async fn credit_ad_watch(&self, discord_id: &str, credit: &AdCredit) -> Result<CreditOutcome, Error>;

    /// Zeroes every user's daily counter. Returns the number of rows touched.
    async fn reset_daily_counts(&self) -> Result<u64, Error>;

    async fn stats(&self) -> Result<LedgerStats, Error>;

    /// Most recent first.
    async fn list_ad_watches(&self, discord_id: &str, limit: i64) -> Result<Vec<AdWatch>, Error>;
}
