//! Lookup table behind the ad buttons.
//!
//! Each button's `custom_id` carries an opaque token. The token resolves to
//! the ad number and the user who asked for it, so no per-prompt handler has
//! to be built or kept alive.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferStage {
    /// "Watch Ad N" button on the public `!ads` reply.
    Watch,
    /// "I Watched the Ad" button on the ephemeral prompt.
    Verify,
}

impl OfferStage {
    fn prefix(self) -> &'static str {
        match self {
            OfferStage::Watch => "watch",
            OfferStage::Verify => "verify",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOffer {
    pub user_id: String,
    pub ad_number: i64,
    pub stage: OfferStage,
    pub issued_at: DateTime<Utc>,
}

/// A parsed button `custom_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferAction {
    pub stage: OfferStage,
    pub token: Uuid,
}

impl OfferAction {
    pub fn parse(custom_id: &str) -> Option<Self> {
        let (prefix, token) = custom_id.split_once(':')?;
        let stage = match prefix {
            "watch" => OfferStage::Watch,
            "verify" => OfferStage::Verify,
            _ => return None,
        };
        let token = Uuid::parse_str(token).ok()?;
        Some(Self { stage, token })
    }

    pub fn custom_id(&self) -> String {
        format!("{}:{}", self.stage.prefix(), self.token)
    }
}

pub struct OfferRegistry {
    offers: DashMap<Uuid, PendingOffer>,
    ttl: Duration,
}

impl OfferRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            offers: DashMap::new(),
            ttl,
        }
    }

    /// Registers a new offer and returns the action to embed in its button.
    /// Expired offers are swept first, so the table never outlives the TTL.
    pub fn issue(
        &self,
        user_id: &str,
        ad_number: i64,
        stage: OfferStage,
        now: DateTime<Utc>,
    ) -> OfferAction {
        self.prune_expired(now);
        let token = Uuid::new_v4();
        self.offers.insert(
            token,
            PendingOffer {
                user_id: user_id.to_string(),
                ad_number,
                stage,
                issued_at: now,
            },
        );
        OfferAction { stage, token }
    }

    fn is_live(&self, offer: &PendingOffer, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(offer.issued_at) < self.ttl
    }

    /// Looks up a live offer without consuming it. Expired entries are dropped
    /// on sight.
    pub fn get(&self, action: &OfferAction, now: DateTime<Utc>) -> Option<PendingOffer> {
        let offer = self.offers.get(&action.token).map(|e| e.value().clone())?;
        if offer.stage != action.stage {
            return None;
        }
        if !self.is_live(&offer, now) {
            self.offers.remove(&action.token);
            return None;
        }
        Some(offer)
    }

    /// Removes and returns a live offer. Only one caller can win a given token.
    pub fn consume(&self, action: &OfferAction, now: DateTime<Utc>) -> Option<PendingOffer> {
        let (_, offer) = self
            .offers
            .remove_if(&action.token, |_, o| o.stage == action.stage)?;
        self.is_live(&offer, now).then_some(offer)
    }

    /// Drops every expired offer. Returns how many were removed.
    pub fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.offers.len();
        self.offers.retain(|_, o| now.signed_duration_since(o.issued_at) < self.ttl);
        let pruned = before.saturating_sub(self.offers.len());
        if pruned > 0 {
            debug!("Pruned {} expired ad offers", pruned);
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}
