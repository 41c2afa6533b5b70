//! drkearn-server/src/context.rs
//!
//! Defines the process-wide context (ServerContext) for the bot server.

use std::sync::Arc;

use chrono::Duration;
use tokio::sync::{watch, Mutex};
use tracing::info;

use drkearn_common::models::EarnRules;
use drkearn_core::platforms::discord::DiscordPlatform;
use drkearn_core::repositories::SqliteLedgerRepository;
use drkearn_core::services::{DiscordCommandService, EarnService, OfferRegistry};
use drkearn_core::{Database, Error};

use crate::Args;

/// One year.
const MAX_RESET_INTERVAL_HOURS: u64 = 24 * 365;

/// Everything the bot shares between handlers, built once at start-up and
/// dropped at shutdown.
pub struct ServerContext {
    pub db: Database,
    pub rules: EarnRules,
    pub earn_service: Arc<EarnService>,
    pub offers: Arc<OfferRegistry>,
    pub discord: Arc<Mutex<DiscordPlatform>>,

    shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

impl ServerContext {
    pub async fn new(args: &Args, token: String) -> Result<Self, Error> {
        if args.reset_interval_hours == 0 {
            return Err(Error::Config("--reset-interval-hours must be at least 1".into()));
        }
        let reset_interval_secs = args
            .reset_interval_hours
            .checked_mul(3600)
            .filter(|_| args.reset_interval_hours <= MAX_RESET_INTERVAL_HOURS)
            .ok_or_else(|| {
                Error::Config(format!(
                    "--reset-interval-hours must be at most {MAX_RESET_INTERVAL_HOURS}, got {}",
                    args.reset_interval_hours
                ))
            })?;

        // 1) Ledger
        let db = Database::new(&args.db_path).await?;
        db.migrate().await?;
        let ledger = Arc::new(SqliteLedgerRepository::new(db.pool().clone()));

        // 2) Services
        let rules = EarnRules {
            reset_interval_secs,
            ..EarnRules::default()
        };
        let earn_service = Arc::new(EarnService::new(ledger, rules.clone()));
        let offers = Arc::new(OfferRegistry::new(Duration::seconds(rules.offer_ttl_secs)));
        let command_service = Arc::new(DiscordCommandService::new(
            earn_service.clone(),
            offers.clone(),
            &args.prefix,
        ));

        // 3) Discord
        let discord = Arc::new(Mutex::new(DiscordPlatform::new(token, command_service)));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        info!("Server context ready (db={}, prefix='{}')", args.db_path, args.prefix);

        Ok(Self {
            db,
            rules,
            earn_service,
            offers,
            discord,
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
