use std::time::Duration;

use serenity::model::gateway::GatewayIntents;
use serenity::Client;
use tracing::{error, info, warn};

use chime_core::DiscordConfig;
use chime_scheduler::ReminderScheduler;

use crate::error::{DiscordError, Result};
use crate::handler::ReminderHandler;

/// Discord gateway adapter.
///
/// Wraps a serenity `Client` and drives the event loop until the task is
/// aborted. Reconnects whenever the gateway drops.
pub struct DiscordAdapter {
    scheduler: ReminderScheduler,
    config: DiscordConfig,
}

impl DiscordAdapter {
    pub fn new(config: &DiscordConfig, scheduler: ReminderScheduler) -> Result<Self> {
        if config.bot_token.trim().is_empty() {
            return Err(DiscordError::NoToken);
        }
        Ok(Self {
            scheduler,
            config: config.clone(),
        })
    }

    /// Connect to Discord and keep reconnecting whenever the gateway drops.
    ///
    /// Never returns. Reminder delivery does not depend on this loop: the
    /// notifier talks to the REST API directly.
    pub async fn run(self) {
        // Slash commands arrive as interactions; no message intents needed.
        let intents = GatewayIntents::GUILDS;

        loop {
            let mut client = loop {
                match self.build_client(intents).await {
                    Ok(c) => break c,
                    Err(e) => {
                        error!("Discord: connect failed ({e}), retrying in 30s");
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                }
            };

            info!("Discord: gateway connecting");
            if let Err(e) = client.start().await {
                warn!("Discord: gateway error ({e}), reconnecting in 5s");
            } else {
                info!("Discord: gateway stopped cleanly, reconnecting in 5s");
            }
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    }

    async fn build_client(&self, intents: GatewayIntents) -> Result<Client> {
        let handler = ReminderHandler::new(self.scheduler.clone(), self.config.clone());
        Ok(Client::builder(&self.config.bot_token, intents)
            .event_handler(handler)
            .await?)
    }
}
