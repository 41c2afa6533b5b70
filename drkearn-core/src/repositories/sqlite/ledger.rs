// src/repositories/sqlite/ledger.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

use drkearn_common::models::{AdCredit, AdWatch, CreditOutcome, LedgerStats, LedgerUser};
use drkearn_common::traits::LedgerRepository;

use crate::utils::time::{from_epoch_millis, to_epoch_millis};
use crate::Error;

const USER_COLUMNS: &str =
    "discord_id, money, last_ad_at, ads_watched_today, total_ads_watched, created_at";

#[derive(Clone)]
pub struct SqliteLedgerRepository {
    pool: Pool<Sqlite>,
}

impl SqliteLedgerRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &SqliteRow) -> Result<LedgerUser, Error> {
    let last_ad_at: Option<i64> = row.try_get("last_ad_at")?;
    Ok(LedgerUser {
        discord_id: row.try_get("discord_id")?,
        money: row.try_get("money")?,
        last_ad_at: last_ad_at.map(from_epoch_millis),
        ads_watched_today: row.try_get("ads_watched_today")?,
        total_ads_watched: row.try_get("total_ads_watched")?,
        created_at: from_epoch_millis(row.try_get("created_at")?),
    })
}

/// Whole seconds of cooldown left for `user` at `now_ms`, rounded up and
/// clamped to `1..=cooldown`.
fn remaining_cooldown(user: &LedgerUser, now_ms: i64, cooldown_secs: i64) -> i64 {
    let Some(last_ms) = user.last_ad_at.map(to_epoch_millis) else {
        return 1;
    };
    let left_ms = cooldown_secs.saturating_mul(1000) - now_ms.saturating_sub(last_ms);
    let left_secs = left_ms.saturating_add(999).div_euclid(1000);
    left_secs.clamp(1, cooldown_secs.max(1))
}

#[async_trait]
impl LedgerRepository for SqliteLedgerRepository {
    async fn register_user(&self, discord_id: &str, now: DateTime<Utc>) -> Result<bool, Error> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO users (discord_id, money, ads_watched_today, total_ads_watched, created_at)
            VALUES (?, 0, 0, 0, ?)
            ON CONFLICT(discord_id) DO NOTHING
            "#,
        )
            .bind(discord_id)
            .bind(to_epoch_millis(now))
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(inserted == 1)
    }

    async fn get_user(&self, discord_id: &str) -> Result<Option<LedgerUser>, Error> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE discord_id = ?"
        ))
            .bind(discord_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn credit_ad_watch(&self, discord_id: &str, credit: &AdCredit) -> Result<CreditOutcome, Error> {
        let now = to_epoch_millis(credit.watched_at);
        let cooldown_cutoff = now - credit.cooldown_secs.saturating_mul(1000);

        let mut tx = self.pool.begin().await?;

        // The eligibility gate lives in the WHERE clause so that two
        // confirmations racing each other cannot both pass it.
        let updated = sqlx::query(
            r#"
            UPDATE users
            SET money = money + ?,
                last_ad_at = ?,
                ads_watched_today = ads_watched_today + 1,
                total_ads_watched = total_ads_watched + 1
            WHERE discord_id = ?
              AND ads_watched_today < ?
              AND (last_ad_at IS NULL OR last_ad_at <= ?)
            "#,
        )
            .bind(credit.amount)
            .bind(now)
            .bind(discord_id)
            .bind(credit.daily_cap)
            .bind(cooldown_cutoff)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE discord_id = ?"
        ))
            .bind(discord_id)
            .fetch_optional(&mut *tx)
            .await?;
        let user = row.as_ref().map(user_from_row).transpose()?;

        if updated == 0 {
            tx.rollback().await?;
            return Ok(match user {
                None => CreditOutcome::NotRegistered,
                Some(u) if u.ads_watched_today >= credit.daily_cap => CreditOutcome::DailyCapReached,
                Some(u) => CreditOutcome::CoolingDown {
                    remaining_secs: remaining_cooldown(&u, now, credit.cooldown_secs),
                },
            });
        }

        sqlx::query("INSERT INTO ad_watches (user_id, watched_at, ad_type) VALUES (?, ?, ?)")
            .bind(discord_id)
            .bind(now)
            .bind(&credit.ad_type)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        match user {
            Some(u) => Ok(CreditOutcome::Credited(u)),
            None => Err(Error::Platform(format!(
                "user {discord_id} vanished while being credited"
            ))),
        }
    }

    async fn reset_daily_counts(&self) -> Result<u64, Error> {
        let touched = sqlx::query("UPDATE users SET ads_watched_today = 0")
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(touched)
    }

    async fn stats(&self) -> Result<LedgerStats, Error> {
        let users = sqlx::query(
            r#"
            SELECT COUNT(*) AS total_users,
                   COALESCE(SUM(money), 0) AS total_money
            FROM users
            "#,
        )
            .fetch_one(&self.pool)
            .await?;

        let ads = sqlx::query("SELECT COUNT(*) AS total_ads FROM ad_watches")
            .fetch_one(&self.pool)
            .await?;

        Ok(LedgerStats {
            total_users: users.try_get("total_users")?,
            total_money: users.try_get("total_money")?,
            total_ads_watched: ads.try_get("total_ads")?,
        })
    }

    async fn list_ad_watches(&self, discord_id: &str, limit: i64) -> Result<Vec<AdWatch>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, watched_at, ad_type
            FROM ad_watches
            WHERE user_id = ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
            .bind(discord_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| {
                Ok(AdWatch {
                    id: r.try_get("id")?,
                    user_id: r.try_get("user_id")?,
                    watched_at: from_epoch_millis(r.try_get("watched_at")?),
                    ad_type: r.try_get("ad_type")?,
                })
            })
            .collect()
    }
}
