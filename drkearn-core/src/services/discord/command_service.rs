// File: drkearn-core/src/services/discord/command_service.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use twilight_model::channel::message::Embed;

use crate::services::discord::{embeds, components, MessageReply};
use crate::services::earn_service::{EarnService, Eligibility, Registration, Withdrawal};
use crate::services::offer_registry::{OfferRegistry, OfferStage};
use crate::Error;

const REGISTER_FIRST: &str = "❌ Please register first using `{prefix}register`";

/// Text-prefixed commands understood by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarnCommand {
    Register,
    Ads,
    Balance,
    Withdraw,
    Stats,
    Help,
}

impl EarnCommand {
    /// Parses `"<prefix><name> [args...]"`. Names are case-sensitive; trailing
    /// arguments are ignored.
    pub fn parse(prefix: &str, text: &str) -> Option<Self> {
        let rest = text.trim_start().strip_prefix(prefix)?;
        if rest.starts_with(char::is_whitespace) {
            return None;
        }
        let name = rest.split_whitespace().next()?;
        match name {
            "register" => Some(Self::Register),
            "ads" => Some(Self::Ads),
            "balance" => Some(Self::Balance),
            "withdraw" => Some(Self::Withdraw),
            "stats" => Some(Self::Stats),
            "help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Who sent a command and what the gateway knows about them.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub user_id: String,
    pub username: String,
    /// Only resolved for `stats`; `false` otherwise.
    pub is_admin: bool,
    pub guild_count: usize,
    pub now: DateTime<Utc>,
}

/// Turns prefix commands, button clicks and join events into ledger
/// operations plus the reply to render.
pub struct DiscordCommandService {
    pub(crate) earn: Arc<EarnService>,
    pub(crate) offers: Arc<OfferRegistry>,
    prefix: String,
}

impl DiscordCommandService {
    pub fn new(earn: Arc<EarnService>, offers: Arc<OfferRegistry>, prefix: &str) -> Self {
        Self {
            earn,
            offers,
            prefix: prefix.to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn register_first(&self) -> String {
        REGISTER_FIRST.replace("{prefix}", &self.prefix)
    }

    pub async fn handle_command(
        &self,
        command: EarnCommand,
        request: &CommandRequest,
    ) -> Result<MessageReply, Error> {
        debug!("Handling {:?} for user {}", command, request.user_id);
        match command {
            EarnCommand::Register => self.register(request).await,
            EarnCommand::Ads => self.show_ads(request).await,
            EarnCommand::Balance => self.balance(request).await,
            EarnCommand::Withdraw => self.withdraw(request).await,
            EarnCommand::Stats => self.stats(request).await,
            EarnCommand::Help => Ok(MessageReply::embed(embeds::help(&self.prefix))),
        }
    }

    /// Auto-registers a member who just joined and returns the welcome DM.
    pub async fn handle_member_join(&self, user_id: &str, now: DateTime<Utc>) -> Result<Embed, Error> {
        if let Registration::Created(_) = self.earn.register(user_id, now).await? {
            info!("Auto-registered new member {}", user_id);
        }
        Ok(embeds::welcome(&self.prefix))
    }

    async fn register(&self, request: &CommandRequest) -> Result<MessageReply, Error> {
        match self.earn.register(&request.user_id, request.now).await? {
            Registration::Created(user) => Ok(MessageReply::embed(embeds::registered(
                &request.username,
                &user,
                &self.prefix,
            ))),
            Registration::AlreadyRegistered => {
                Ok(MessageReply::text("✅ You are already registered!"))
            }
        }
    }

    async fn show_ads(&self, request: &CommandRequest) -> Result<MessageReply, Error> {
        let Some(board) = self.earn.ad_board(&request.user_id, request.now).await? else {
            return Ok(MessageReply::text(self.register_first()));
        };

        let embed = embeds::ad_board(&board, self.earn.rules());
        let Eligibility::Ready { ad_numbers } = &board.eligibility else {
            return Ok(MessageReply::embed(embed));
        };

        let offers: Vec<_> = ad_numbers
            .iter()
            .map(|&n| {
                let action = self.offers.issue(&request.user_id, n, OfferStage::Watch, request.now);
                (n, action)
            })
            .collect();

        Ok(MessageReply::embed(embed).with_components(components::watch_buttons(&offers)))
    }

    async fn balance(&self, request: &CommandRequest) -> Result<MessageReply, Error> {
        match self.earn.account(&request.user_id).await? {
            Some(user) => Ok(MessageReply::embed(embeds::balance(
                &request.username,
                &user,
                self.earn.rules(),
            ))),
            None => Ok(MessageReply::text(self.register_first())),
        }
    }

    async fn withdraw(&self, request: &CommandRequest) -> Result<MessageReply, Error> {
        match self.earn.withdraw(&request.user_id).await? {
            None => Ok(MessageReply::text(self.register_first())),
            Some(Withdrawal::BelowMinimum { balance, minimum }) => Ok(MessageReply::text(format!(
                "❌ Minimum withdrawal is {minimum} coins. You have {balance} coins."
            ))),
            Some(Withdrawal::Requested { amount, cash_value }) => {
                Ok(MessageReply::embed(embeds::withdrawal_request(amount, cash_value)))
            }
        }
    }

    async fn stats(&self, request: &CommandRequest) -> Result<MessageReply, Error> {
        if !request.is_admin {
            debug!("Refused stats for non-admin {}", request.user_id);
            return Ok(MessageReply::text(
                "❌ You need administrator permission to use this command.",
            ));
        }
        let stats = self.earn.stats().await?;
        Ok(MessageReply::embed(embeds::stats(&stats, request.guild_count, request.now)))
    }
}
