// File: drkearn-core/src/services/discord/interaction.rs
//
// Button flow: "Watch Ad N" -> ephemeral prompt -> "I Watched the Ad" -> credit.

use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use tracing::{debug, warn};
use twilight_model::channel::message::MessageFlags;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_util::builder::InteractionResponseDataBuilder;

use drkearn_common::models::CreditOutcome;

use crate::services::discord::command_service::DiscordCommandService;
use crate::services::discord::{components, embeds};
use crate::services::offer_registry::{OfferAction, OfferStage};
use crate::Error;

const AD_URLS: [&str; 3] = [
    "https://example-ad-network.com/ad1",
    "https://ads-provider.com/watch/video123",
    "https://promotional-content.net/offer456",
];

pub(crate) fn ephemeral(text: impl Into<String>) -> InteractionResponse {
    InteractionResponse {
        kind: InteractionResponseType::ChannelMessageWithSource,
        data: Some(
            InteractionResponseDataBuilder::new()
                .content(text)
                .flags(MessageFlags::EPHEMERAL)
                .build(),
        ),
    }
}

fn random_ad_url() -> &'static str {
    AD_URLS.choose(&mut rand::rng()).copied().unwrap_or(AD_URLS[0])
}

impl DiscordCommandService {
    /// Handles a button click. Returns `None` for components this bot did not
    /// create.
    pub async fn handle_component(
        &self,
        custom_id: &str,
        actor_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<InteractionResponse>, Error> {
        let Some(action) = OfferAction::parse(custom_id) else {
            debug!("Ignoring unknown component id '{}'", custom_id);
            return Ok(None);
        };

        let response = match action.stage {
            OfferStage::Watch => self.open_watch_prompt(&action, actor_id, now),
            OfferStage::Verify => self.verify_watch(&action, actor_id, now).await?,
        };
        Ok(Some(response))
    }

    fn expired(&self) -> InteractionResponse {
        ephemeral(format!(
            "⌛ This ad prompt has expired. Type `{}ads` again.",
            self.prefix()
        ))
    }

    fn open_watch_prompt(
        &self,
        action: &OfferAction,
        actor_id: &str,
        now: DateTime<Utc>,
    ) -> InteractionResponse {
        let Some(offer) = self.offers.get(action, now) else {
            return self.expired();
        };
        if offer.user_id != actor_id {
            return ephemeral("❌ This button is not for you!");
        }

        let verify = self
            .offers
            .issue(&offer.user_id, offer.ad_number, OfferStage::Verify, now);
        debug!("User {} opened ad {}", actor_id, offer.ad_number);

        InteractionResponse {
            kind: InteractionResponseType::ChannelMessageWithSource,
            data: Some(
                InteractionResponseDataBuilder::new()
                    .embeds([embeds::watch_prompt(offer.ad_number, random_ad_url())])
                    .components(components::verify_button(&verify, false))
                    .flags(MessageFlags::EPHEMERAL)
                    .build(),
            ),
        }
    }

    async fn verify_watch(
        &self,
        action: &OfferAction,
        actor_id: &str,
        now: DateTime<Utc>,
    ) -> Result<InteractionResponse, Error> {
        // Peek first so a stranger's click cannot burn the owner's token.
        match self.offers.get(action, now) {
            None => return Ok(self.expired()),
            Some(offer) if offer.user_id != actor_id => {
                return Ok(ephemeral("❌ This is not for you!"));
            }
            Some(_) => {}
        }
        let Some(offer) = self.offers.consume(action, now) else {
            return Ok(self.expired());
        };

        let rules = self.earn.rules();
        let response = match self.earn.confirm_watch(&offer.user_id, offer.ad_number, now).await? {
            CreditOutcome::Credited(user) => InteractionResponse {
                kind: InteractionResponseType::UpdateMessage,
                data: Some(
                    InteractionResponseDataBuilder::new()
                        .embeds([embeds::watch_credited(&user, rules)])
                        .components(components::verify_button(action, true))
                        .build(),
                ),
            },
            CreditOutcome::NotRegistered => {
                warn!("Verify from unregistered user {}", actor_id);
                ephemeral(self.register_first())
            }
            CreditOutcome::DailyCapReached => {
                ephemeral("❌ Daily limit reached!\nCome back tomorrow.")
            }
            CreditOutcome::CoolingDown { remaining_secs } => ephemeral(format!(
                "⏰ Please wait for cooldown\n⏰ Cooldown: {remaining_secs} seconds remaining"
            )),
        };
        Ok(response)
    }
}
