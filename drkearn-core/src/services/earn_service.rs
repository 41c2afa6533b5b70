// File: drkearn-core/src/services/earn_service.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use drkearn_common::models::{AdCredit, CreditOutcome, EarnRules, LedgerStats, LedgerUser};
use drkearn_common::traits::LedgerRepository;

use crate::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Created(LedgerUser),
    AlreadyRegistered,
}

/// Whether a user may be offered new ads right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    /// Ad slots that can be offered, numbered from the user's next ad of the day.
    Ready { ad_numbers: Vec<i64> },
    DailyCapReached,
    CoolingDown { remaining_secs: i64 },
}

/// What `!ads` shows: the user's counters plus their eligibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdBoard {
    pub user: LedgerUser,
    pub eligibility: Eligibility,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Withdrawal {
    BelowMinimum { balance: i64, minimum: i64 },
    /// Demo only, no money leaves the ledger.
    Requested { amount: i64, cash_value: f64 },
}

/// Business rules of the earn loop, on top of a `LedgerRepository`.
pub struct EarnService {
    ledger: Arc<dyn LedgerRepository>,
    rules: EarnRules,
}

impl EarnService {
    pub fn new(ledger: Arc<dyn LedgerRepository>, rules: EarnRules) -> Self {
        Self { ledger, rules }
    }

    pub fn rules(&self) -> &EarnRules {
        &self.rules
    }

    pub async fn register(&self, discord_id: &str, now: DateTime<Utc>) -> Result<Registration, Error> {
        if self.ledger.register_user(discord_id, now).await? {
            info!("Registered new user {}", discord_id);
            Ok(Registration::Created(LedgerUser::new(discord_id, now)))
        } else {
            debug!("User {} was already registered", discord_id);
            Ok(Registration::AlreadyRegistered)
        }
    }

    pub async fn account(&self, discord_id: &str) -> Result<Option<LedgerUser>, Error> {
        self.ledger.get_user(discord_id).await
    }

    /// The cap is checked before the cooldown, so a capped user never sees a
    /// countdown.
    pub fn eligibility(&self, user: &LedgerUser, now: DateTime<Utc>) -> Eligibility {
        if user.ads_watched_today >= self.rules.daily_cap {
            return Eligibility::DailyCapReached;
        }

        if let Some(last) = user.last_ad_at {
            let elapsed_ms = now.signed_duration_since(last).num_milliseconds();
            let cooldown_ms = self.rules.cooldown_secs.saturating_mul(1000);
            if elapsed_ms < cooldown_ms {
                // Round up so a countdown never reads 0 while still blocked.
                let remaining = (cooldown_ms - elapsed_ms + 999) / 1000;
                return Eligibility::CoolingDown {
                    remaining_secs: remaining.min(self.rules.cooldown_secs),
                };
            }
        }

        let left_today = self.rules.daily_cap - user.ads_watched_today;
        let slots = left_today.min(self.rules.max_offers_per_prompt);
        Eligibility::Ready {
            ad_numbers: (1..=slots).map(|i| user.ads_watched_today + i).collect(),
        }
    }

    /// `None` when the user is not registered.
    pub async fn ad_board(&self, discord_id: &str, now: DateTime<Utc>) -> Result<Option<AdBoard>, Error> {
        let Some(user) = self.ledger.get_user(discord_id).await? else {
            return Ok(None);
        };
        let eligibility = self.eligibility(&user, now);
        Ok(Some(AdBoard { user, eligibility }))
    }

    /// Credits one watched ad. The ledger re-checks cap and cooldown inside
    /// the write.
    pub async fn confirm_watch(
        &self,
        discord_id: &str,
        ad_number: i64,
        now: DateTime<Utc>,
    ) -> Result<CreditOutcome, Error> {
        let credit = AdCredit {
            ad_type: format!("ad_{ad_number}"),
            amount: self.rules.reward_per_ad,
            watched_at: now,
            daily_cap: self.rules.daily_cap,
            cooldown_secs: self.rules.cooldown_secs,
        };

        let outcome = self.ledger.credit_ad_watch(discord_id, &credit).await?;
        match &outcome {
            CreditOutcome::Credited(user) => info!(
                "Credited {} coins to {} for {} (balance={}, today={})",
                credit.amount, discord_id, credit.ad_type, user.money, user.ads_watched_today
            ),
            other => debug!("Credit for {} refused: {:?}", discord_id, other),
        }
        Ok(outcome)
    }

    /// `None` when the user is not registered.
    pub async fn withdraw(&self, discord_id: &str) -> Result<Option<Withdrawal>, Error> {
        let Some(user) = self.ledger.get_user(discord_id).await? else {
            return Ok(None);
        };

        if user.money < self.rules.min_withdrawal {
            return Ok(Some(Withdrawal::BelowMinimum {
                balance: user.money,
                minimum: self.rules.min_withdrawal,
            }));
        }

        info!("Withdrawal requested by {} for {} coins", discord_id, user.money);
        Ok(Some(Withdrawal::Requested {
            amount: user.money,
            cash_value: self.rules.cash_value(user.money),
        }))
    }

    pub async fn stats(&self) -> Result<LedgerStats, Error> {
        self.ledger.stats().await
    }

    pub async fn reset_daily(&self) -> Result<u64, Error> {
        self.ledger.reset_daily_counts().await
    }
}
