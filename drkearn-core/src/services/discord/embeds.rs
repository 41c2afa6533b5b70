// File: drkearn-core/src/services/discord/embeds.rs
//
// Embed renderers for every reply the bot sends.

use chrono::{DateTime, Utc};
use twilight_model::channel::message::Embed;
use twilight_model::util::Timestamp;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder};

use drkearn_common::models::{EarnRules, LedgerStats, LedgerUser};

use crate::services::earn_service::{AdBoard, Eligibility};

pub const GREEN: u32 = 0x2ECC71;
pub const BLUE: u32 = 0x3498DB;
pub const YELLOW: u32 = 0xFEE75C;
pub const GOLD: u32 = 0xF1C40F;
pub const ORANGE: u32 = 0xE67E22;
pub const PURPLE: u32 = 0x9B59B6;

fn field(name: &str, value: impl Into<String>) -> EmbedFieldBuilder {
    EmbedFieldBuilder::new(name, value)
}

pub fn welcome(prefix: &str) -> Embed {
    EmbedBuilder::new()
        .title("🎉 Welcome to DrkEarn! 🎉")
        .description("Earn money by watching ads on Discord!")
        .color(GREEN)
        .field(field("Get Started", format!("Type `{prefix}register` to start earning")))
        .field(field("Watch Ads", format!("Type `{prefix}ads` to view available ads")))
        .build()
}

pub fn registered(username: &str, user: &LedgerUser, prefix: &str) -> Embed {
    EmbedBuilder::new()
        .title("✅ Registration Successful!")
        .description(format!("Welcome {username}!"))
        .color(GREEN)
        .field(field("Your Discord ID", user.discord_id.as_str()))
        .field(field("Starting Balance", format!("💰 {}", user.money)))
        .field(field(
            "Next Step",
            format!("Type `{prefix}ads` to start watching ads and earn money!"),
        ))
        .build()
}

pub fn ad_board(board: &AdBoard, rules: &EarnRules) -> Embed {
    let status = match &board.eligibility {
        Eligibility::Ready { .. } => "✅ Ready to watch ads!".to_string(),
        Eligibility::DailyCapReached => "❌ Daily limit reached!\nCome back tomorrow.".to_string(),
        Eligibility::CoolingDown { remaining_secs } => format!(
            "⏰ Please wait for cooldown\n⏰ Cooldown: {remaining_secs} seconds remaining"
        ),
    };

    let mut embed = EmbedBuilder::new()
        .title("📺 Available Ads")
        .description("Watch ads to earn money!")
        .color(BLUE)
        .field(
            field(
                "Ads Watched Today",
                format!("📊 {}/{}", board.user.ads_watched_today, rules.daily_cap),
            )
            .inline(),
        )
        .field(field("Earnings per Ad", format!("💰 {} Coins", rules.reward_per_ad)).inline())
        .field(
            field(
                "Total Value",
                format!(
                    "🪙 {} Coins for {} ads",
                    group_thousands(rules.daily_potential()),
                    rules.daily_cap
                ),
            )
            .inline(),
        )
        .field(field("Status", status));

    if matches!(board.eligibility, Eligibility::Ready { .. }) {
        embed = embed.field(field("Action", "Click a button below to watch an ad:"));
    }
    embed.build()
}

pub fn watch_prompt(ad_number: i64, ad_url: &str) -> Embed {
    EmbedBuilder::new()
        .title(format!("📺 Watching Ad {ad_number}"))
        .description("Please visit the link below and watch the ad for 30 seconds:")
        .color(YELLOW)
        .field(field("Ad Link", format!("[Click Here]({ad_url})")))
        .field(field(
            "Instructions",
            "1. Click the link\n2. Watch the ad completely\n3. Return here and click Verify",
        ))
        .build()
}

pub fn watch_credited(user: &LedgerUser, rules: &EarnRules) -> Embed {
    EmbedBuilder::new()
        .title("✅ Ad Watched Successfully!")
        .description(format!("You've earned {} coins!", rules.reward_per_ad))
        .color(GREEN)
        .field(field("Earned", format!("💰 +{} Coins", rules.reward_per_ad)).inline())
        .field(field("New Balance", format!("🪙 {} Coins", user.money)).inline())
        .field(field(
            "Next Ad",
            format!("⏰ Available in {}", humanize_secs(rules.cooldown_secs)),
        ))
        .build()
}

pub fn balance(username: &str, user: &LedgerUser, rules: &EarnRules) -> Embed {
    EmbedBuilder::new()
        .title("💰 Your Balance")
        .description(format!("Earnings for {username}"))
        .color(GOLD)
        .field(field("Current Balance", format!("🪙 {} Coins", user.money)).inline())
        .field(field("Total Ads Watched", format!("📊 {} ads", user.total_ads_watched)).inline())
        .field(field("Total Value", format!("💵 ₹{:.2}", rules.cash_value(user.money))).inline())
        .build()
}

pub fn withdrawal_request(amount: i64, cash_value: f64) -> Embed {
    EmbedBuilder::new()
        .title("🔄 Withdrawal Request")
        .description("Withdrawal functionality example")
        .color(ORANGE)
        .field(field("Requested Amount", format!("🪙 {amount} Coins")).inline())
        .field(field("Cash Value", format!("💵 ₹{cash_value:.2}")).inline())
        .field(field(
            "Note",
            "This is a demo. Real implementation would connect to payment gateway.",
        ))
        .build()
}

pub fn stats(stats: &LedgerStats, guild_count: usize, now: DateTime<Utc>) -> Embed {
    let mut embed = EmbedBuilder::new()
        .title("📊 Bot Statistics")
        .description("DrkEarn System Overview")
        .color(PURPLE)
        .field(field("Total Users", format!("👥 {}", stats.total_users)).inline())
        .field(field("Total Money Distributed", format!("🪙 {} Coins", stats.total_money)).inline())
        .field(field("Total Ads Watched", format!("📺 {}", stats.total_ads_watched)).inline())
        .field(field("Server Count", format!("🌐 {guild_count}")).inline());

    if let Ok(ts) = Timestamp::from_secs(now.timestamp()) {
        embed = embed.timestamp(ts);
    }
    embed.build()
}

pub fn help(prefix: &str) -> Embed {
    EmbedBuilder::new()
        .title("📖 DrkEarn Commands")
        .color(BLUE)
        .field(field(format!("{prefix}register").as_str(), "Create your earning account"))
        .field(field(format!("{prefix}ads").as_str(), "Show ads you can watch right now"))
        .field(field(format!("{prefix}balance").as_str(), "Show your coins and ad count"))
        .field(field(format!("{prefix}withdraw").as_str(), "Request a withdrawal"))
        .field(field(format!("{prefix}stats").as_str(), "Bot statistics (administrators)"))
        .build()
}

/// `1000` -> `1,000`
fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

fn humanize_secs(secs: i64) -> String {
    match secs {
        s if s % 60 == 0 && s >= 120 => format!("{} minutes", s / 60),
        60 => "1 minute".to_string(),
        s => format!("{s} seconds"),
    }
}
