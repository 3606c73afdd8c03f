use std::sync::OnceLock;

use serenity::async_trait;
use serenity::model::application::Interaction;
use serenity::model::gateway::Ready;
use serenity::model::id::GuildId;
use serenity::prelude::{Context, EventHandler};
use tracing::{info, warn};

use chime_core::DiscordConfig;
use chime_scheduler::ReminderScheduler;

/// Serenity event handler wired to the reminder scheduler.
pub struct ReminderHandler {
    pub scheduler: ReminderScheduler,
    pub config: DiscordConfig,
    /// Configured owner, or the application owner looked up on first ready.
    pub bot_owner: OnceLock<u64>,
}

impl ReminderHandler {
    pub fn new(scheduler: ReminderScheduler, config: DiscordConfig) -> Self {
        let bot_owner = OnceLock::new();
        if let Some(id) = config.owner_id {
            bot_owner.set(id).ok();
        }
        Self {
            scheduler,
            config,
            bot_owner,
        }
    }
}

#[async_trait]
impl EventHandler for ReminderHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(name = %ready.user.name, "Discord bot connected");

        if self.bot_owner.get().is_none() {
            match ctx.http.get_current_application_info().await {
                Ok(app) => {
                    if let Some(owner) = app.owner {
                        self.bot_owner.set(owner.id.get()).ok();
                        info!(owner = %owner.id, "resolved bot owner from application info");
                    }
                }
                Err(e) => warn!(error = %e, "could not fetch application info; test action disabled"),
            }
        }

        let guild = self.config.guild_id.filter(|id| *id != 0).map(GuildId::new);
        crate::commands::register_commands(&ctx, guild).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            crate::commands::handle_interaction(
                &self.scheduler,
                self.bot_owner.get().copied(),
                &ctx,
                &command,
            )
            .await;
        }
    }
}
