//! Embed model: a plain description of a Discord embed that the reply and
//! notification builders produce, converted to serenity's builder only at
//! the send site.

use chrono::{DateTime, Utc};
use serenity::builder::{CreateEmbed, CreateEmbedFooter};
use serenity::model::Timestamp;

use chime_core::{Notification, NotificationKind};
use chime_scheduler::format::{format_duration, format_naive};

pub const COLOR_REMINDER: u32 = 0x3498db;
pub const COLOR_SCHEDULED: u32 = 0x9b59b6;
pub const COLOR_SUCCESS: u32 = 0x2ecc71;
pub const COLOR_ERROR: u32 = 0xe74c3c;

/// A rendered embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderEmbed {
    pub title: String,
    pub description: Option<String>,
    pub color: u32,
    /// `(name, value, inline)`
    pub fields: Vec<(String, String, bool)>,
    pub footer: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl ReminderEmbed {
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: None,
            color,
            fields: Vec::new(),
            footer: None,
            timestamp: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push((name.into(), value.into(), inline));
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    /// Convert to a serenity `CreateEmbed` builder.
    pub fn to_create_embed(&self) -> CreateEmbed {
        let mut e = CreateEmbed::new().title(&self.title).colour(self.color);
        if let Some(ref d) = self.description {
            e = e.description(d);
        }
        for (name, value, inline) in &self.fields {
            e = e.field(name, value, *inline);
        }
        if let Some(ref f) = self.footer {
            e = e.footer(CreateEmbedFooter::new(f));
        }
        if let Some(ts) = self
            .timestamp
            .and_then(|at| Timestamp::from_unix_timestamp(at.timestamp()).ok())
        {
            e = e.timestamp(ts);
        }
        e
    }
}

/// Embed sent into the destination channel when a reminder fires.
pub fn notification_embed(notification: &Notification, sent_at: DateTime<Utc>) -> ReminderEmbed {
    let mention = format!("<@{}>", notification.owner);
    match &notification.kind {
        NotificationKind::OneShot { delay_secs } => ReminderEmbed::new("⏰ Reminder", COLOR_REMINDER)
            .description(format!(
                "**{mention}**, you asked me to remind you:\n\n*{}*",
                notification.message
            ))
            .footer(format!("Set {} ago", format_duration(*delay_secs))),

        NotificationKind::Recurring { interval_secs } => {
            ReminderEmbed::new("⏰ Reminder (Recurring)", COLOR_REMINDER)
                .description(format!(
                    "**{mention}**, you asked me to remind you:\n\n*{}*",
                    notification.message
                ))
                .footer(format!(
                    "Set to repeat every {}",
                    format_duration(*interval_secs)
                ))
        }

        NotificationKind::Scheduled { pattern, next, .. } => {
            let embed = ReminderEmbed::new("📅 Scheduled Reminder", COLOR_SCHEDULED).description(
                format!(
                    "**{mention}**, your {} reminder:\n\n*{}*",
                    pattern.description(),
                    notification.message
                ),
            );
            match next {
                Some(next) => embed.footer(format!("Next: {}", format_naive(*next))),
                None => embed,
            }
        }
    }
    .timestamp(sent_at)
}
