use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use twilight_cache_inmemory::{InMemoryCache, ResourceType};
use twilight_gateway::{
    self as gateway,
    CloseFrame,
    Config,
    Event,
    EventTypeFlags,
    Intents,
    Shard,
    MessageSender,
    StreamExt,
};
use twilight_http::Client as HttpClient;
use twilight_http::client::ClientBuilder;
use twilight_model::application::interaction::InteractionData;
use twilight_model::channel::message::Embed;
use twilight_model::gateway::payload::incoming::{
    InteractionCreate, MemberAdd, MessageCreate, Ready as ReadyPayload,
};
use twilight_model::id::marker::{ApplicationMarker, ChannelMarker, UserMarker};
use twilight_model::id::Id;

use crate::platforms::{ConnectionStatus, PlatformAuth, PlatformIntegration};
use crate::services::discord::permissions::is_administrator;
use crate::services::discord::{CommandRequest, DiscordCommandService, EarnCommand, MessageReply};
use crate::Error;

/// Everything a shard needs to answer events. Shared by every spawned
/// per-event task.
struct ShardContext {
    http: Arc<HttpClient>,
    cache: Arc<InMemoryCache>,
    application_id: Id<ApplicationMarker>,
    commands: Arc<DiscordCommandService>,
}

/// The shard runner:
///   - calls `shard.next_event(...)`
///   - updates the in-memory cache
///   - hands each relevant event to its own task so a slow ledger write never
///     stalls the gateway.
async fn shard_runner(mut shard: Shard, ctx: Arc<ShardContext>) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        let event = match item {
            Ok(event) => event,
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
                continue;
            }
        };
        ctx.cache.update(&event);

        match event {
            Event::Ready(ready) => {
                let data: &ReadyPayload = ready.as_ref();
                info!(
                    "Shard {shard_id} => READY as {}#{} (ID={}) in {} guilds",
                    data.user.name, data.user.discriminator, data.user.id, data.guilds.len()
                );
            }
            Event::MessageCreate(msg) => {
                if msg.author.bot {
                    trace!("Ignoring bot message from {}", msg.author.name);
                    continue;
                }
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_message(&ctx, &msg).await {
                        error!("Command from {} failed => {e:?}", msg.author.id);
                    }
                });
            }
            Event::InteractionCreate(interaction) => {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_interaction(&ctx, &interaction).await {
                        error!("Interaction {} failed => {e:?}", interaction.id);
                    }
                });
            }
            Event::MemberAdd(member) => {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_member_add(&ctx, &member).await {
                        error!("Member join for {} failed => {e:?}", member.member.user.id);
                    }
                });
            }
            other => {
                trace!("Shard {shard_id} => unhandled event: {:?}", other.kind());
            }
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

async fn handle_message(ctx: &ShardContext, msg: &MessageCreate) -> Result<(), Error> {
    let Some(command) = EarnCommand::parse(ctx.commands.prefix(), &msg.content) else {
        return Ok(());
    };

    let is_admin = if command == EarnCommand::Stats {
        resolve_admin(ctx, msg).await?
    } else {
        false
    };

    let request = CommandRequest {
        user_id: msg.author.id.to_string(),
        username: msg.author.name.clone(),
        is_admin,
        guild_count: ctx.cache.stats().guilds(),
        now: Utc::now(),
    };

    let reply = ctx.commands.handle_command(command, &request).await?;
    send_reply(&ctx.http, msg.channel_id, &reply).await
}

/// `ADMINISTRATOR` in the guild the message was sent from. DMs never qualify.
async fn resolve_admin(ctx: &ShardContext, msg: &MessageCreate) -> Result<bool, Error> {
    let Some(guild_id) = msg.guild_id else {
        return Ok(false);
    };

    let guild = ctx
        .http
        .guild(guild_id)
        .await
        .map_err(|e| Error::Platform(format!("Error fetching guild {guild_id}: {e:?}")))?
        .model()
        .await
        .map_err(|e| Error::Platform(format!("Error parsing guild {guild_id}: {e:?}")))?;

    let member_roles = msg
        .member
        .as_ref()
        .map(|m| m.roles.clone())
        .unwrap_or_default();
    let guild_roles: Vec<_> = guild.roles.iter().map(|r| (r.id, r.permissions)).collect();

    Ok(is_administrator(
        msg.author.id,
        guild_id,
        guild.owner_id,
        &member_roles,
        &guild_roles,
    ))
}

async fn handle_interaction(ctx: &ShardContext, event: &InteractionCreate) -> Result<(), Error> {
    let interaction = &event.0;
    let Some(InteractionData::MessageComponent(data)) = &interaction.data else {
        return Ok(());
    };
    let Some(actor) = interaction.author_id() else {
        return Ok(());
    };

    let Some(response) = ctx
        .commands
        .handle_component(&data.custom_id, &actor.to_string(), Utc::now())
        .await?
    else {
        return Ok(());
    };

    ctx.http
        .interaction(ctx.application_id)
        .create_response(interaction.id, &interaction.token, &response)
        .await
        .map_err(|e| Error::Platform(format!("Error responding to interaction: {e:?}")))?;
    Ok(())
}

async fn handle_member_add(ctx: &ShardContext, event: &MemberAdd) -> Result<(), Error> {
    let user = &event.member.user;
    if user.bot {
        return Ok(());
    }

    let welcome = ctx
        .commands
        .handle_member_join(&user.id.to_string(), Utc::now())
        .await?;

    // Best effort: plenty of users keep DMs closed.
    if let Err(e) = send_direct_embed(&ctx.http, user.id, welcome).await {
        debug!("Couldn't DM welcome to {} => {e}", user.id);
    }
    Ok(())
}

async fn send_reply(
    http: &HttpClient,
    channel_id: Id<ChannelMarker>,
    reply: &MessageReply,
) -> Result<(), Error> {
    let mut request = http.create_message(channel_id);
    if let Some(content) = &reply.content {
        request = request.content(content);
    }
    if !reply.embeds.is_empty() {
        request = request.embeds(&reply.embeds);
    }
    if !reply.components.is_empty() {
        request = request.components(&reply.components);
    }
    request
        .await
        .map_err(|e| Error::Platform(format!("Error sending Discord message: {e:?}")))?;
    Ok(())
}

async fn send_direct_embed(
    http: &HttpClient,
    user_id: Id<UserMarker>,
    embed: Embed,
) -> Result<(), Error> {
    let channel = http
        .create_private_channel(user_id)
        .await
        .map_err(|e| Error::Platform(format!("Error opening DM channel: {e:?}")))?
        .model()
        .await
        .map_err(|e| Error::Platform(format!("Error parsing DM channel: {e:?}")))?;

    send_reply(http, channel.id, &MessageReply::embed(embed)).await
}

/// Discord gateway + HTTP connection for the earn bot.
pub struct DiscordPlatform {
    pub token: String,
    pub connection_status: ConnectionStatus,

    pub shard_tasks: Vec<JoinHandle<()>>,
    pub shard_senders: Vec<MessageSender>,

    pub http: Option<Arc<HttpClient>>,
    pub cache: Option<Arc<InMemoryCache>>,
    commands: Arc<DiscordCommandService>,
}

impl DiscordPlatform {
    pub fn new(token: String, commands: Arc<DiscordCommandService>) -> Self {
        Self {
            token,
            connection_status: ConnectionStatus::Disconnected,
            shard_tasks: Vec::new(),
            shard_senders: Vec::new(),
            http: None,
            cache: None,
            commands,
        }
    }
}

#[async_trait]
impl PlatformAuth for DiscordPlatform {
    async fn authenticate(&mut self) -> Result<(), Error> {
        if self.token.trim().is_empty() {
            return Err(Error::Auth("Discord token is empty".into()));
        }
        Ok(())
    }
}

/// Connect and spawn one runner per recommended shard.
#[async_trait]
impl PlatformIntegration for DiscordPlatform {
    async fn connect(&mut self) -> Result<(), Error> {
        if matches!(self.connection_status, ConnectionStatus::Connected) {
            info!("(DiscordPlatform) Already connected => skipping");
            return Ok(());
        }
        self.authenticate().await?;

        // Prepare the Twilight client:
        let http_client = Arc::new(
            ClientBuilder::new()
                .token(self.token.clone())
                .timeout(Duration::from_secs(30))
                .build()
        );
        self.http = Some(http_client.clone());

        let application_id = http_client
            .current_user_application()
            .await
            .map_err(|e| Error::Platform(format!("Error fetching application info: {e:?}")))?
            .model()
            .await
            .map_err(|e| Error::Platform(format!("Error parsing application info: {e:?}")))?
            .id;

        // GUILD is enough for the server count shown by `stats`.
        let cache = Arc::new(
            InMemoryCache::builder()
                .resource_types(ResourceType::GUILD)
                .build(),
        );
        self.cache = Some(cache.clone());

        let config = Config::new(
            self.token.clone(),
            Intents::GUILDS
                | Intents::GUILD_MESSAGES
                | Intents::DIRECT_MESSAGES
                | Intents::MESSAGE_CONTENT
                | Intents::GUILD_MEMBERS,
        );

        let shards = match gateway::create_recommended(&http_client, config, |_, b| b.build()).await {
            Ok(shards) => shards,
            Err(e) => {
                self.connection_status = ConnectionStatus::Error(e.to_string());
                return Err(Error::Platform(format!("create_recommended error: {e}")));
            }
        };

        let ctx = Arc::new(ShardContext {
            http: http_client,
            cache,
            application_id,
            commands: self.commands.clone(),
        });

        for shard in shards {
            self.shard_senders.push(shard.sender());
            let ctx_for_shard = ctx.clone();
            self.shard_tasks.push(tokio::spawn(shard_runner(shard, ctx_for_shard)));
        }

        info!("(DiscordPlatform) Connected with {} shard(s)", self.shard_tasks.len());
        self.connection_status = ConnectionStatus::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.connection_status = ConnectionStatus::Disconnected;

        // Gracefully close shards
        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        // Wait for them
        for task in self.shard_tasks.drain(..) {
            let _ = task.await;
        }
        self.shard_senders.clear();

        info!("(DiscordPlatform) Disconnected.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use drkearn_common::models::EarnRules;

    use crate::db::Database;
    use crate::repositories::SqliteLedgerRepository;
    use crate::services::{EarnService, OfferRegistry};

    async fn platform(token: &str) -> DiscordPlatform {
        let db = Database::new(":memory:").await.unwrap();
        let earn = Arc::new(EarnService::new(
            Arc::new(SqliteLedgerRepository::new(db.pool().clone())),
            EarnRules::default(),
        ));
        let offers = Arc::new(OfferRegistry::new(ChronoDuration::minutes(15)));
        DiscordPlatform::new(
            token.to_string(),
            Arc::new(DiscordCommandService::new(earn, offers, "!")),
        )
    }

    #[tokio::test]
    async fn empty_token_is_rejected_before_connecting() {
        let mut p = platform("   ").await;
        assert!(matches!(p.authenticate().await, Err(Error::Auth(_))));
        assert!(matches!(p.connect().await, Err(Error::Auth(_))));
        assert_eq!(p.connection_status, ConnectionStatus::Disconnected);
        assert!(p.http.is_none());
    }

    #[tokio::test]
    async fn disconnect_without_connect_is_a_no_op() {
        let mut p = platform("token").await;
        p.disconnect().await.unwrap();
        assert_eq!(p.connection_status, ConnectionStatus::Disconnected);
        assert!(p.shard_tasks.is_empty());
    }
}
