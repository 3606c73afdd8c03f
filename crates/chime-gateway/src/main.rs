use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use clap::Parser;
use tracing::{info, warn};

use chime_core::{ChimeConfig, Clock, SystemClock};
use chime_discord::{DiscordAdapter, DiscordNotifier};
use chime_scheduler::ReminderScheduler;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_LOG_FILTER: &str = "chime=info,chime_scheduler=info,chime_discord=info";

#[derive(Parser)]
#[command(version = VERSION, about = "Discord reminder bot")]
struct Args {
    /// Config file (default: ~/.chime/chime.toml).
    #[arg(long, env = "CHIME_CONFIG")]
    config: Option<String>,

    /// Log filter, overrides RUST_LOG.
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match args.log.as_deref() {
        Some(directives) => tracing_subscriber::EnvFilter::new(directives),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    info!(version = VERSION, "chime starting");

    let config =
        ChimeConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let Some(discord_cfg) = config.discord.clone() else {
        bail!("no [discord] section configured; set discord.bot_token or CHIME_DISCORD__BOT_TOKEN");
    };

    let limits = &config.reminders;
    info!(
        max_active = limits.max_active,
        max_recurring = limits.max_recurring,
        utc_offset_hours = limits.utc_offset_hours,
        "configuration loaded"
    );
    warn!("reminders are kept in memory only; all active reminders are lost on restart");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let notifier = Arc::new(DiscordNotifier::from_token(
        &discord_cfg.bot_token,
        Arc::clone(&clock),
    ));
    let scheduler = ReminderScheduler::new(config.reminders.clone(), notifier, clock)?;

    let adapter = DiscordAdapter::new(&discord_cfg, scheduler.clone())?;
    let gateway = tokio::spawn(adapter.run());
    info!("Discord bot started");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("shutdown requested");

    gateway.abort();
    let dropped = scheduler.shutdown().await;
    if dropped > 0 {
        warn!(dropped, "active reminders discarded at shutdown");
    }
    Ok(())
}
