use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use drkearn_core::platforms::PlatformIntegration;
use drkearn_core::tasks::daily_reset::spawn_daily_reset_task;
use drkearn_core::Error;

mod context;
use context::ServerContext;

#[derive(Parser, Debug, Clone)]
#[command(name = "drkearn")]
#[command(author, version, about = "DrkEarn - earn coins by watching ads on Discord")]
pub struct Args {
    /// Path to the SQLite ledger (or ":memory:")
    #[arg(long, default_value = "data/drkearn.db")]
    pub db_path: String,

    /// Prefix for text commands
    #[arg(long, default_value = "!")]
    pub prefix: String,

    /// Hours between daily ad counter resets
    #[arg(long, default_value_t = 24)]
    pub reset_interval_hours: u64,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("drkearn=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!(
        "DrkEarn starting. db_path={}, prefix='{}', reset_interval_hours={}",
        args.db_path, args.prefix, args.reset_interval_hours
    );

    let token = match std::env::var("DISCORD_BOT_TOKEN") {
        Ok(t) if !t.trim().is_empty() => t,
        _ => {
            error!("DISCORD_BOT_TOKEN not found in environment variables");
            return Ok(());
        }
    };

    if let Err(e) = run_server(args, token).await {
        error!("Server error: {:?}", e);
        return Err(e.into());
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

async fn run_server(args: Args, token: String) -> Result<(), Error> {
    let ctx = ServerContext::new(&args, token).await?;

    ctx.discord.lock().await.connect().await?;

    let reset_handle = spawn_daily_reset_task(
        ctx.earn_service.clone(),
        ctx.offers.clone(),
        Duration::from_secs(ctx.rules.reset_interval_secs),
        ctx.shutdown_rx.clone(),
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {:?}", e);
    }
    info!("Ctrl-C detected, shutting down...");

    ctx.shutdown();
    let _ = reset_handle.await;
    ctx.discord.lock().await.disconnect().await?;
    ctx.db.pool().close().await;

    Ok(())
}
