use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the `users` table.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LedgerUser {
    pub discord_id: String,
    pub money: i64,
    pub last_ad_at: Option<DateTime<Utc>>,
    pub ads_watched_today: i64,
    pub total_ads_watched: i64,
    pub created_at: DateTime<Utc>,
}

impl LedgerUser {
    /// A freshly registered, zero-balance user.
    pub fn new(discord_id: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            discord_id: discord_id.to_string(),
            money: 0,
            last_ad_at: None,
            ads_watched_today: 0,
            total_ads_watched: 0,
            created_at,
        }
    }
}

/// Append-only audit entry written once per credited ad.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AdWatch {
    pub id: i64,
    pub user_id: String,
    pub watched_at: DateTime<Utc>,
    pub ad_type: String,
}

/// Everything the ledger needs to apply one credit, including the gate it
/// must re-check inside the same statement.
#[derive(Debug, Clone)]
pub struct AdCredit {
    pub ad_type: String,
    pub amount: i64,
    pub watched_at: DateTime<Utc>,
    pub daily_cap: i64,
    pub cooldown_secs: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditOutcome {
    /// Credit applied; carries the updated record.
    Credited(LedgerUser),
    NotRegistered,
    DailyCapReached,
    CoolingDown { remaining_secs: i64 },
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStats {
    pub total_users: i64,
    pub total_money: i64,
    pub total_ads_watched: i64,
}
