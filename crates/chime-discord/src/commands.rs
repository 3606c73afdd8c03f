//! Discord slash commands: `/remind`, `/remind-recurring`,
//! `/remind-scheduled`, `/remind-manage`.
//!
//! Registration happens in `ready()`. Interactions are dispatched from
//! `interaction_create` in the event handler. Command logic lives in
//! [`execute`], which works on plain values so it can be tested without a
//! gateway connection.

use std::collections::HashMap;

use serenity::builder::{
    CreateCommand, CreateCommandOption, CreateInteractionResponse,
    CreateInteractionResponseMessage,
};
use serenity::model::application::{CommandInteraction, CommandOptionType};
use serenity::model::id::GuildId;
use serenity::prelude::Context;
use tracing::{info, warn};

use chime_core::{DestinationId, OwnerId, ReminderKind};
use chime_scheduler::{CreatedReminder, NewReminder, ReminderScheduler};

use crate::embed::ReminderEmbed;
use crate::reply;

pub const REMIND: &str = "remind";
pub const REMIND_RECURRING: &str = "remind-recurring";
pub const REMIND_SCHEDULED: &str = "remind-scheduled";
pub const REMIND_MANAGE: &str = "remind-manage";

const TEST_DELAY_SECS: u64 = 10;
const TEST_MESSAGE: &str = "This is a test reminder!";

/// Actions accepted by `/remind-manage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManageAction {
    List,
    Stop,
    StopRecurring,
    StopScheduled,
    Stats,
    Test,
    Help,
}

impl ManageAction {
    pub const ALL: [ManageAction; 7] = [
        ManageAction::List,
        ManageAction::Stop,
        ManageAction::StopRecurring,
        ManageAction::StopScheduled,
        ManageAction::Stats,
        ManageAction::Test,
        ManageAction::Help,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ManageAction::List => "list",
            ManageAction::Stop => "stop",
            ManageAction::StopRecurring => "stop-recurring",
            ManageAction::StopScheduled => "stop-scheduled",
            ManageAction::Stats => "stats",
            ManageAction::Test => "test",
            ManageAction::Help => "help",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }
}

fn string_option(name: &str, description: &str, required: bool) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::String, name, description).required(required)
}

/// The command set, as sent to Discord on registration.
pub fn definitions() -> Vec<CreateCommand> {
    let action = ManageAction::ALL.into_iter().fold(
        string_option(
            "action",
            "Action to perform (list, stop, stop-recurring, stop-scheduled, stats, test, help)",
            true,
        ),
        |opt, a| opt.add_string_choice(a.as_str(), a.as_str()),
    );

    vec![
        CreateCommand::new(REMIND)
            .description("Set a one-time reminder")
            .add_option(string_option("time", "When to remind you (e.g. 5m, 2h, 1d)", true))
            .add_option(string_option("message", "What to remind you of", true)),
        CreateCommand::new(REMIND_RECURRING)
            .description("Set a recurring reminder")
            .add_option(string_option("interval", "How often (e.g. 30m, 1h, 1d)", true))
            .add_option(string_option("message", "What to remind you of", true)),
        CreateCommand::new(REMIND_SCHEDULED)
            .description("Set a scheduled reminder")
            .add_option(string_option(
                "pattern",
                "daily, weekdays, weekends, monday…sunday, monthly",
                true,
            ))
            .add_option(string_option("time", "Time of day (e.g. 9:00 AM, 14:30)", true))
            .add_option(string_option("message", "What to remind you of", true)),
        CreateCommand::new(REMIND_MANAGE)
            .description("Manage your reminders")
            .add_option(action)
            .add_option(string_option(
                "message_part",
                "(For 'stop') Part of the reminder message to search for",
                false,
            )),
    ]
}

/// Register slash commands on one guild, or globally. Call from `ready()`.
pub async fn register_commands(ctx: &Context, guild_id: Option<GuildId>) {
    let commands = definitions();

    match guild_id {
        Some(gid) => match gid.set_commands(&ctx.http, commands).await {
            Ok(cmds) => info!(guild = %gid, count = cmds.len(), "registered guild slash commands"),
            Err(e) => warn!(guild = %gid, error = %e, "failed to register guild commands"),
        },
        None => {
            match serenity::model::application::Command::set_global_commands(&ctx.http, commands)
                .await
            {
                Ok(cmds) => info!(count = cmds.len(), "registered global slash commands"),
                Err(e) => warn!(error = %e, "failed to register global slash commands"),
            }
        }
    }
}

/// A slash command reduced to plain values.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub name: String,
    pub user: OwnerId,
    pub channel: DestinationId,
    pub args: HashMap<String, String>,
    /// The only user allowed to run `/remind-manage test`.
    pub bot_owner: Option<u64>,
}

impl Invocation {
    fn arg(&self, name: &str) -> Option<&str> {
        self.args
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Like [`Invocation::arg`], but keeps surrounding whitespace.
    fn raw_arg(&self, name: &str) -> Option<&str> {
        self.args
            .get(name)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

/// Embed to send back, and whether only the invoking user should see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub embed: ReminderEmbed,
    pub ephemeral: bool,
}

impl Reply {
    fn public(embed: ReminderEmbed) -> Self {
        Self {
            embed,
            ephemeral: false,
        }
    }

    fn private(embed: ReminderEmbed) -> Self {
        Self {
            embed,
            ephemeral: true,
        }
    }
}

/// Run a command against the scheduler. `None` for commands not ours.
pub fn execute(scheduler: &ReminderScheduler, inv: &Invocation) -> Option<Reply> {
    let message = inv.arg("message").unwrap_or_default();

    let created = match inv.name.as_str() {
        REMIND => scheduler.create_one_shot(
            inv.user,
            inv.channel,
            inv.arg("time").unwrap_or_default(),
            message,
        ),
        REMIND_RECURRING => scheduler.create_recurring(
            inv.user,
            inv.channel,
            inv.arg("interval").unwrap_or_default(),
            message,
        ),
        REMIND_SCHEDULED => scheduler.create_scheduled(
            inv.user,
            inv.channel,
            inv.arg("pattern").unwrap_or_default(),
            inv.arg("time").unwrap_or_default(),
            message,
        ),
        REMIND_MANAGE => return Some(manage(scheduler, inv)),
        _ => return None,
    };

    Some(created_reply(scheduler, message, created))
}

fn created_reply(
    scheduler: &ReminderScheduler,
    message: &str,
    created: chime_scheduler::Result<CreatedReminder>,
) -> Reply {
    match created {
        Ok(created) => Reply::public(reply::created(
            message,
            created.kind,
            created.first_fire,
            scheduler.registry().offset(),
            scheduler.registry().now(),
        )),
        Err(e) => {
            info!(code = e.code(), error = %e, "reminder request rejected");
            Reply::private(reply::scheduler_error(&e))
        }
    }
}

fn manage(scheduler: &ReminderScheduler, inv: &Invocation) -> Reply {
    let Some(action) = inv.arg("action").and_then(ManageAction::parse) else {
        return Reply::private(reply::invalid_action());
    };
    let now = scheduler.registry().now();

    match action {
        ManageAction::List => Reply::private(reply::listing(
            &scheduler.list(inv.user),
            scheduler.registry().offset(),
            now,
        )),
        ManageAction::Stop => match inv.raw_arg("message_part") {
            Some(needle) => Reply::public(reply::stopped_by_content(
                scheduler.cancel_by_content(inv.user, needle),
                needle,
            )),
            None => Reply::private(reply::missing_message()),
        },
        ManageAction::StopRecurring => {
            Reply::public(reply::stopped_recurring(scheduler.cancel_all_recurring(inv.user)))
        }
        ManageAction::StopScheduled => {
            Reply::public(reply::stopped_scheduled(scheduler.cancel_all_scheduled(inv.user)))
        }
        ManageAction::Stats => Reply::public(reply::stats(&scheduler.stats())),
        ManageAction::Test => {
            if inv.bot_owner != Some(inv.user.0) {
                return Reply::private(reply::permission_denied());
            }
            // Bypasses the configured delay range, not the quota.
            let created = scheduler.registry().create(NewReminder {
                owner: inv.user,
                destination: inv.channel,
                message: TEST_MESSAGE.to_string(),
                kind: ReminderKind::OneShot {
                    delay_secs: TEST_DELAY_SECS,
                },
            });
            created_reply(scheduler, TEST_MESSAGE, created)
        }
        ManageAction::Help => Reply::private(reply::help(scheduler.limits(), now)),
    }
}

/// Dispatch a slash command interaction.
pub async fn handle_interaction(
    scheduler: &ReminderScheduler,
    bot_owner: Option<u64>,
    ctx: &Context,
    command: &CommandInteraction,
) {
    let args = command
        .data
        .options
        .iter()
        .filter_map(|o| Some((o.name.clone(), o.value.as_str()?.to_string())))
        .collect();
    let inv = Invocation {
        name: command.data.name.clone(),
        user: OwnerId(command.user.id.get()),
        channel: DestinationId(command.channel_id.get()),
        args,
        bot_owner,
    };

    let Some(reply) = execute(scheduler, &inv) else {
        respond_ephemeral(ctx, command, "Unknown command.").await;
        return;
    };

    let message = CreateInteractionResponseMessage::new()
        .embed(reply.embed.to_create_embed())
        .ephemeral(reply.ephemeral);
    if let Err(e) = command
        .create_response(&ctx.http, CreateInteractionResponse::Message(message))
        .await
    {
        warn!(command = %command.data.name, error = %e, "slash command response failed");
    }
}

/// Send a short ephemeral text reply.
async fn respond_ephemeral(ctx: &Context, command: &CommandInteraction, text: &str) {
    let _ = command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(text)
                    .ephemeral(true),
            ),
        )
        .await;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chime_core::{
        DeliveryError, Notification, Notifier, ReminderConfig, SystemClock,
    };

    use super::*;

    struct NullNotifier;

    #[async_trait]
    impl Notifier for NullNotifier {
        async fn deliver(&self, _: &Notification) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    const USER: u64 = 111;
    const OWNER: u64 = 222;

    fn scheduler() -> ReminderScheduler {
        ReminderScheduler::new(
            ReminderConfig::default(),
            Arc::new(NullNotifier),
            Arc::new(SystemClock),
        )
        .unwrap()
    }

    fn invoke(name: &str, user: u64, args: &[(&str, &str)]) -> Invocation {
        Invocation {
            name: name.to_string(),
            user: OwnerId(user),
            channel: DestinationId(333),
            args: args
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            bot_owner: Some(OWNER),
        }
    }

    #[test]
    fn manage_action_parsing() {
        assert_eq!(ManageAction::parse(" LIST "), Some(ManageAction::List));
        assert_eq!(
            ManageAction::parse("stop-recurring"),
            Some(ManageAction::StopRecurring)
        );
        assert_eq!(ManageAction::parse("delete"), None);
        for action in ManageAction::ALL {
            assert_eq!(ManageAction::parse(action.as_str()), Some(action));
        }
    }

    #[test]
    fn four_commands_are_defined() {
        assert_eq!(definitions().len(), 4);
    }

    #[tokio::test]
    async fn remind_creates_and_confirms() {
        let s = scheduler();
        let reply = execute(
            &s,
            &invoke(REMIND, USER, &[("time", "5m"), ("message", "stand up")]),
        )
        .unwrap();
        assert!(!reply.ephemeral);
        assert_eq!(reply.embed.title, "✅ Reminder Set");
        assert_eq!(s.active_count(OwnerId(USER)), 1);
    }

    #[tokio::test]
    async fn rejection_is_private() {
        let s = scheduler();
        let reply = execute(
            &s,
            &invoke(REMIND_RECURRING, USER, &[("interval", "10s"), ("message", "x")]),
        )
        .unwrap();
        assert!(reply.ephemeral);
        assert_eq!(reply.embed.title, "❌ Time Too Short");
        assert_eq!(s.active_count(OwnerId(USER)), 0);
    }

    #[tokio::test]
    async fn scheduled_and_list() {
        let s = scheduler();
        execute(
            &s,
            &invoke(
                REMIND_SCHEDULED,
                USER,
                &[("pattern", "weekdays"), ("time", "9am"), ("message", "standup")],
            ),
        )
        .unwrap();

        let reply = execute(&s, &invoke(REMIND_MANAGE, USER, &[("action", "list")])).unwrap();
        assert!(reply.ephemeral);
        assert_eq!(reply.embed.fields[0].0, "📅 Scheduled Reminders");
    }

    #[tokio::test]
    async fn stop_requires_message_part() {
        let s = scheduler();
        let reply = execute(
            &s,
            &invoke(REMIND_MANAGE, USER, &[("action", "stop"), ("message_part", "  ")]),
        )
        .unwrap();
        assert_eq!(reply.embed.title, "❌ Missing Message");
    }

    #[tokio::test]
    async fn stop_by_content() {
        let s = scheduler();
        execute(&s, &invoke(REMIND, USER, &[("time", "1h"), ("message", "Call mom")])).unwrap();
        let reply = execute(
            &s,
            &invoke(REMIND_MANAGE, USER, &[("action", "stop"), ("message_part", "MOM")]),
        )
        .unwrap();
        assert_eq!(reply.embed.title, "✅ Reminders Stopped");
        assert_eq!(s.active_count(OwnerId(USER)), 0);
    }

    #[tokio::test]
    async fn test_action_is_owner_only() {
        let s = scheduler();
        let denied = execute(&s, &invoke(REMIND_MANAGE, USER, &[("action", "test")])).unwrap();
        assert_eq!(denied.embed.title, "❌ Permission Denied");
        assert_eq!(s.active_count(OwnerId(USER)), 0);

        let ok = execute(&s, &invoke(REMIND_MANAGE, OWNER, &[("action", "test")])).unwrap();
        assert_eq!(ok.embed.title, "✅ Reminder Set");
        assert_eq!(
            ok.embed.description.as_deref(),
            Some("I'll remind you in **10 seconds**:\n\n*This is a test reminder!*")
        );
        assert_eq!(s.active_count(OwnerId(OWNER)), 1);
    }

    #[tokio::test]
    async fn unknown_action_and_command() {
        let s = scheduler();
        let reply = execute(&s, &invoke(REMIND_MANAGE, USER, &[("action", "purge")])).unwrap();
        assert_eq!(reply.embed.title, "❌ Invalid Action");
        assert!(execute(&s, &invoke("ask", USER, &[])).is_none());
    }
}
