use serde::{Deserialize, Serialize};

/// Fixed economy of the bot. Every amount is in coins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EarnRules {
    pub reward_per_ad: i64,
    pub cooldown_secs: i64,
    pub daily_cap: i64,
    pub max_offers_per_prompt: i64,
    pub min_withdrawal: i64,
    pub coins_per_rupee: i64,
    pub reset_interval_secs: u64,
    /// How long a button token stays redeemable. Matches Discord's
    /// interaction token lifetime.
    pub offer_ttl_secs: i64,
}

impl Default for EarnRules {
    fn default() -> Self {
        Self {
            reward_per_ad: 100,
            cooldown_secs: 120,
            daily_cap: 10,
            max_offers_per_prompt: 3,
            min_withdrawal: 1000,
            coins_per_rupee: 10,
            reset_interval_secs: 24 * 3600,
            offer_ttl_secs: 15 * 60,
        }
    }
}

impl EarnRules {
    pub fn cash_value(&self, coins: i64) -> f64 {
        coins as f64 / self.coins_per_rupee as f64
    }

    /// Coins a user can still earn before hitting the daily cap.
    pub fn daily_potential(&self) -> i64 {
        self.reward_per_ad * self.daily_cap
    }
}
