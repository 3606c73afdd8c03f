//! Reply embeds for the slash commands.

use chrono::{DateTime, FixedOffset, Utc};

use chime_core::{ClockTime, ReminderConfig, ReminderKind, SchedulePattern};
use chime_scheduler::format::{format_duration, format_occurrence};
use chime_scheduler::{
    InputKind, QuotaScope, RegistryStats, ReminderListing, ReminderRecord, SchedulerError,
};

use crate::embed::{ReminderEmbed, COLOR_ERROR, COLOR_REMINDER, COLOR_SCHEDULED, COLOR_SUCCESS};

const DURATION_FORMATS: &str =
    "• `5s` - 5 seconds\n• `10m` - 10 minutes\n• `2h` - 2 hours\n• `1d` - 1 day\n• `1w` - 1 week";
const CLOCK_FORMATS: &str = "• `9:00 AM` or `9am`\n• `2:30 PM` or `2:30pm`\n• `14:30` (24-hour format)\n• `09:00` (24-hour format)";
const PATTERN_FORMATS: &str = "• `daily` - Every day\n• `weekdays` - Monday through Friday\n• `weekends` - Saturday and Sunday\n• `monday`, `tuesday`, etc. - Specific weekday\n• `monthly` - First day of each month";
const ACTIONS: &str = "• `list` - List all your reminders\n• `stop <message>` - Stop specific reminder\n• `stop-recurring` - Stop all recurring reminders\n• `stop-scheduled` - Stop all scheduled reminders\n• `stats` - Show system statistics\n• `test` - Test reminder (10 seconds)\n• `help` - Show detailed help";

const ONE_SHOT_PREVIEW: usize = 30;
const SCHEDULED_PREVIEW: usize = 25;

fn error(title: &str, description: impl Into<String>) -> ReminderEmbed {
    ReminderEmbed::new(format!("❌ {title}"), COLOR_ERROR).description(description)
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// First `max` characters of `message`, with an ellipsis if anything was cut.
pub fn preview(message: &str, max: usize) -> String {
    let mut chars = message.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// User-facing rendering of every rejection the scheduler can produce.
pub fn scheduler_error(err: &SchedulerError) -> ReminderEmbed {
    match err {
        SchedulerError::Parse { input_kind, .. } => match input_kind {
            InputKind::Delay | InputKind::Interval => error(
                "Invalid Time Format",
                format!("Please use a valid time format:\n{DURATION_FORMATS}"),
            ),
            InputKind::ClockTime => error(
                "Invalid Time Format",
                format!("Please use a valid time format:\n{CLOCK_FORMATS}"),
            ),
            InputKind::Pattern => error(
                "Invalid Schedule Pattern",
                format!("Please use a valid schedule pattern:\n{PATTERN_FORMATS}"),
            ),
        },

        SchedulerError::OutOfRange {
            input_kind,
            value,
            min,
            max,
        } => {
            let recurring = matches!(input_kind, InputKind::Interval);
            if value < min {
                let text = if recurring {
                    format!("Recurring reminders need at least {}.", format_duration(*min))
                } else {
                    format!("Please set a reminder for at least {}.", format_duration(*min))
                };
                error("Time Too Short", text)
            } else {
                let text = if recurring {
                    format!(
                        "Please set a recurring reminder for at most {}.",
                        format_duration(*max)
                    )
                } else {
                    format!("Please set a reminder for at most {}.", format_duration(*max))
                };
                error("Time Too Long", text)
            }
        }

        SchedulerError::MessageTooLong { max, .. } => error(
            "Message Too Long",
            format!("Please keep your reminder message under {max} characters."),
        ),

        SchedulerError::QuotaExceeded { scope, limit, .. } => match scope {
            QuotaScope::Total => error(
                "Too Many Reminders",
                format!(
                    "You can only have {limit} active reminders at a time (including recurring and scheduled ones)."
                ),
            ),
            QuotaScope::Recurring => error(
                "Too Many Recurring Reminders",
                format!("You can only have {limit} active recurring reminders at a time."),
            ),
            QuotaScope::Scheduled => error(
                "Too Many Scheduled Reminders",
                format!("You can only have {limit} active scheduled reminders at a time."),
            ),
        },

        SchedulerError::Calculation(_) => error(
            "Error Calculating Schedule",
            "Could not calculate the next occurrence for this schedule.",
        ),

        SchedulerError::NotFound { .. } | SchedulerError::Config(_) => {
            error("Something Went Wrong", err.to_string())
        }
    }
}

pub fn one_shot_created(message: &str, delay_secs: u64, now: DateTime<Utc>) -> ReminderEmbed {
    ReminderEmbed::new("✅ Reminder Set", COLOR_SUCCESS)
        .description(format!(
            "I'll remind you in **{}**:\n\n*{message}*",
            format_duration(delay_secs)
        ))
        .timestamp(now)
}

pub fn recurring_created(message: &str, interval_secs: u64, now: DateTime<Utc>) -> ReminderEmbed {
    ReminderEmbed::new("✅ Reminder Set", COLOR_SUCCESS)
        .description(format!(
            "I'll remind you every **{}**:\n\n*{message}*",
            format_duration(interval_secs)
        ))
        .field("🔄 Recurring", "This reminder will repeat until cancelled", false)
        .timestamp(now)
}

pub fn scheduled_created(
    message: &str,
    pattern: SchedulePattern,
    time: ClockTime,
    first_fire: DateTime<Utc>,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> ReminderEmbed {
    let first_local = first_fire.with_timezone(&offset).naive_local();
    ReminderEmbed::new("✅ Scheduled Reminder Set", COLOR_SCHEDULED)
        .description(format!(
            "I'll remind you **{}** at **{}**:\n\n*{message}*",
            pattern.description(),
            time.to_12h_string()
        ))
        .field("📅 Next Occurrence", format_occurrence(first_local), false)
        .field(
            "🔄 Repeating",
            "This reminder will repeat according to your schedule",
            false,
        )
        .timestamp(now)
}

/// Confirmation for whatever kind of reminder was just created.
pub fn created(
    message: &str,
    kind: ReminderKind,
    first_fire: DateTime<Utc>,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> ReminderEmbed {
    match kind {
        ReminderKind::OneShot { delay_secs } => one_shot_created(message, delay_secs, now),
        ReminderKind::Recurring { interval_secs } => {
            recurring_created(message, interval_secs, now)
        }
        ReminderKind::Scheduled { pattern, time } => {
            scheduled_created(message, pattern, time, first_fire, offset, now)
        }
    }
}

fn list_line(index: usize, record: &ReminderRecord, offset: FixedOffset) -> String {
    match record.kind {
        ReminderKind::OneShot { delay_secs: secs }
        | ReminderKind::Recurring {
            interval_secs: secs,
        } => format!(
            "**{index}.** {} *({})*",
            preview(&record.message, ONE_SHOT_PREVIEW),
            format_duration(secs)
        ),
        ReminderKind::Scheduled { pattern, time } => {
            let next = record
                .next_fire
                .map(|at| {
                    at.with_timezone(&offset)
                        .naive_local()
                        .format("%m/%d %-I:%M %p")
                        .to_string()
                })
                .unwrap_or_else(|| "Unknown".to_string());
            format!(
                "**{index}.** {}\n*{} at {} (next: {next})*",
                preview(&record.message, SCHEDULED_PREVIEW),
                pattern.description(),
                time.to_12h_string()
            )
        }
    }
}

fn list_field(records: &[ReminderRecord], offset: FixedOffset) -> String {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| list_line(i + 1, r, offset))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn listing(listing: &ReminderListing, offset: FixedOffset, now: DateTime<Utc>) -> ReminderEmbed {
    if listing.is_empty() {
        return ReminderEmbed::new("📝 Your Reminders", COLOR_REMINDER)
            .description("You don't have any active reminders.");
    }

    let mut embed = ReminderEmbed::new("📝 Your Active Reminders", COLOR_REMINDER).timestamp(now);
    if !listing.one_shot.is_empty() {
        embed = embed.field(
            "⏰ One-time Reminders",
            list_field(&listing.one_shot, offset),
            false,
        );
    }
    if !listing.recurring.is_empty() {
        embed = embed.field(
            "🔄 Recurring Reminders",
            list_field(&listing.recurring, offset),
            false,
        );
    }
    if !listing.scheduled.is_empty() {
        embed = embed.field(
            "📅 Scheduled Reminders",
            list_field(&listing.scheduled, offset),
            false,
        );
    }
    embed.footer("Use /remind-manage to cancel reminders")
}

pub fn stopped_by_content(count: usize, needle: &str) -> ReminderEmbed {
    if count == 0 {
        return error(
            "No Matching Reminders",
            format!("No active reminders found containing: *{needle}*"),
        );
    }
    ReminderEmbed::new("✅ Reminders Stopped", COLOR_SUCCESS).description(format!(
        "Stopped {count} reminder{} matching: *{needle}*",
        plural(count)
    ))
}

pub fn stopped_recurring(count: usize) -> ReminderEmbed {
    if count == 0 {
        return ReminderEmbed::new("📝 No Recurring Reminders", COLOR_REMINDER)
            .description("You don't have any active recurring reminders to stop.");
    }
    ReminderEmbed::new("✅ Recurring Reminders Stopped", COLOR_SUCCESS).description(format!(
        "Stopped {count} recurring reminder{}.",
        plural(count)
    ))
}

pub fn stopped_scheduled(count: usize) -> ReminderEmbed {
    if count == 0 {
        return ReminderEmbed::new("📅 No Scheduled Reminders", COLOR_SCHEDULED)
            .description("You don't have any active scheduled reminders to stop.");
    }
    ReminderEmbed::new("✅ Scheduled Reminders Stopped", COLOR_SUCCESS).description(format!(
        "Stopped {count} scheduled reminder{}.",
        plural(count)
    ))
}

pub fn stats(stats: &RegistryStats) -> ReminderEmbed {
    ReminderEmbed::new("📊 Reminder System Status", COLOR_REMINDER)
        .field("Total Reminders", stats.created.to_string(), true)
        .field("Active Reminders", stats.active.to_string(), true)
        .field("Completed", stats.completed.to_string(), true)
        .field("⏰ One-time", stats.active_one_shot.to_string(), true)
        .field("🔄 Recurring", stats.active_recurring.to_string(), true)
        .field("📅 Scheduled", stats.active_scheduled.to_string(), true)
        .field("Cancelled", stats.cancelled.to_string(), true)
        .field("Delivered", stats.delivered.to_string(), true)
        .field("Failed Deliveries", stats.failed_deliveries.to_string(), true)
}

pub fn help(limits: &ReminderConfig, now: DateTime<Utc>) -> ReminderEmbed {
    let mut limit_lines = vec![
        format!("• Max {} total reminders per user", limits.max_active),
        format!("• Max {} recurring reminders per user", limits.max_recurring),
    ];
    if let Some(max) = limits.max_scheduled {
        limit_lines.push(format!("• Max {max} scheduled reminders per user"));
    }
    limit_lines.push(format!(
        "• Recurring: {} - {} intervals",
        format_duration(limits.recurring_min_secs),
        format_duration(limits.recurring_max_secs)
    ));
    limit_lines.push(format!(
        "• One-time: {} - {}",
        format_duration(limits.one_shot_min_secs),
        format_duration(limits.one_shot_max_secs)
    ));
    limit_lines.push(format!(
        "• Messages up to {} characters",
        limits.max_message_chars
    ));

    ReminderEmbed::new("📚 Reminder Commands Help", COLOR_REMINDER)
        .description("Complete guide to using the reminder system")
        .field(
            "⏰ Basic Reminders",
            "`/remind <time> <message>` - Set a one-time reminder\n`/remind 5m Take a break` - Reminds you in 5 minutes\n`/remind 2h Meeting with team` - Reminds you in 2 hours",
            false,
        )
        .field(
            "🔄 Recurring Reminders",
            "`/remind-recurring <interval> <message>` - Set recurring reminder\n`/remind-recurring 30m Stretch break` - Every 30 minutes\n`/remind-recurring 1d Daily standup` - Every day",
            false,
        )
        .field(
            "📅 Scheduled Reminders",
            format!(
                "`/remind-scheduled <pattern> <time> <message>` - Set scheduled reminder\n`/remind-scheduled daily 9:00am Morning coffee` - Every day at 9 AM\n`/remind-scheduled monday 2:30pm Weekly meeting` - Every Monday at 2:30 PM\n`/remind-scheduled weekdays 8am Wake up call` - Weekdays at 8 AM\nTimes are evaluated at UTC{:+}.",
                limits.utc_offset_hours
            ),
            false,
        )
        .field(
            "📝 Managing Reminders",
            "`/remind-manage list` - List all your active reminders\n`/remind-manage stop <text>` - Stop reminders containing text\n`/remind-manage stop-recurring` - Stop all recurring reminders\n`/remind-manage stop-scheduled` - Stop all scheduled reminders\n`/remind-manage stats` - Show system status\n`/remind-manage test` - Test reminder (owner only)\n`/remind-manage help` - Show this help",
            false,
        )
        .field(
            "⏱️ Time Formats",
            "**Intervals:** `5s`, `10m`, `2h`, `3d`, `1w`\n**Times:** `9:00 AM`, `2:30 PM`, `14:30`, `9am`",
            true,
        )
        .field(
            "📊 Schedule Patterns",
            "`daily` - Every day\n`weekdays` - Mon-Fri\n`weekends` - Sat-Sun\n`monday`, `tuesday`, etc.\n`monthly` - 1st of month",
            true,
        )
        .field("📊 Limits", limit_lines.join("\n"), false)
        .footer("Reminders are kept in memory only and are lost when the bot restarts.")
        .timestamp(now)
}

pub fn permission_denied() -> ReminderEmbed {
    error(
        "Permission Denied",
        "Only the bot owner can use the test command.",
    )
}

pub fn missing_message() -> ReminderEmbed {
    error(
        "Missing Message",
        "Please provide part of the reminder message to stop.\n\nUsage: `/remind-manage stop <message part>`",
    )
}

pub fn invalid_action() -> ReminderEmbed {
    error(
        "Invalid Action",
        format!("Please use a valid action:\n{ACTIONS}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chime_core::{DestinationId, OwnerId, ReminderId, ReminderState};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn record(message: &str, kind: ReminderKind, next_fire: Option<DateTime<Utc>>) -> ReminderRecord {
        ReminderRecord {
            id: ReminderId::from("r"),
            owner: OwnerId(1),
            destination: DestinationId(2),
            message: message.to_string(),
            kind,
            state: ReminderState::Armed,
            created_at: now(),
            next_fire,
            fire_count: 0,
        }
    }

    #[test]
    fn preview_truncates_on_characters() {
        assert_eq!(preview("short", 30), "short");
        assert_eq!(preview(&"a".repeat(30), 30), "a".repeat(30));
        assert_eq!(preview(&"a".repeat(31), 30), format!("{}...", "a".repeat(30)));
        assert_eq!(preview("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn parse_errors_point_at_the_right_format() {
        let embed = scheduler_error(&SchedulerError::Parse {
            input_kind: InputKind::Delay,
            input: "5x".into(),
        });
        assert_eq!(embed.title, "❌ Invalid Time Format");
        assert!(embed.description.unwrap().contains("`1w` - 1 week"));

        let embed = scheduler_error(&SchedulerError::Parse {
            input_kind: InputKind::ClockTime,
            input: "25:00".into(),
        });
        assert!(embed.description.unwrap().contains("24-hour format"));

        let embed = scheduler_error(&SchedulerError::Parse {
            input_kind: InputKind::Pattern,
            input: "sometimes".into(),
        });
        assert_eq!(embed.title, "❌ Invalid Schedule Pattern");
        assert_eq!(embed.color, COLOR_ERROR);
    }

    #[test]
    fn range_errors() {
        let short = scheduler_error(&SchedulerError::OutOfRange {
            input_kind: InputKind::Interval,
            value: 30,
            min: 60,
            max: 86_400,
        });
        assert_eq!(short.title, "❌ Time Too Short");
        assert_eq!(
            short.description.as_deref(),
            Some("Recurring reminders need at least 1 minute.")
        );

        let long = scheduler_error(&SchedulerError::OutOfRange {
            input_kind: InputKind::Delay,
            value: 40_000_000,
            min: 10,
            max: 31_536_000,
        });
        assert_eq!(long.title, "❌ Time Too Long");
        assert_eq!(
            long.description.as_deref(),
            Some("Please set a reminder for at most 52 weeks.")
        );
    }

    #[test]
    fn quota_errors_name_their_scope() {
        let total = scheduler_error(&SchedulerError::QuotaExceeded {
            owner: OwnerId(1),
            scope: QuotaScope::Total,
            limit: 5,
        });
        assert_eq!(total.title, "❌ Too Many Reminders");
        assert!(total.description.unwrap().starts_with("You can only have 5 active"));

        let recurring = scheduler_error(&SchedulerError::QuotaExceeded {
            owner: OwnerId(1),
            scope: QuotaScope::Recurring,
            limit: 3,
        });
        assert_eq!(recurring.title, "❌ Too Many Recurring Reminders");
    }

    #[test]
    fn scheduled_confirmation() {
        let first = Utc.with_ymd_and_hms(2025, 3, 17, 9, 0, 0).unwrap();
        let embed = scheduled_created(
            "standup",
            SchedulePattern::Weekdays,
            ClockTime::new(9, 0).unwrap(),
            first,
            utc(),
            now(),
        );
        assert_eq!(
            embed.description.as_deref(),
            Some("I'll remind you **weekdays** at **9:00 AM**:\n\n*standup*")
        );
        assert_eq!(embed.fields[0].1, "Monday, March 17 at 9:00 AM");
    }

    #[test]
    fn one_shot_confirmation() {
        let embed = created(
            "stand up",
            ReminderKind::OneShot { delay_secs: 300 },
            now(),
            utc(),
            now(),
        );
        assert_eq!(embed.title, "✅ Reminder Set");
        assert_eq!(
            embed.description.as_deref(),
            Some("I'll remind you in **5 minutes**:\n\n*stand up*")
        );
    }

    #[test]
    fn empty_listing() {
        let embed = listing(&ReminderListing::default(), utc(), now());
        assert_eq!(embed.title, "📝 Your Reminders");
        assert!(embed.fields.is_empty());
    }

    #[test]
    fn listing_groups_by_kind() {
        let long = "a reminder message that is much too long to show";
        let listing_data = ReminderListing {
            one_shot: vec![
                record("stand up", ReminderKind::OneShot { delay_secs: 300 }, None),
                record(long, ReminderKind::OneShot { delay_secs: 7_200 }, None),
            ],
            recurring: vec![],
            scheduled: vec![record(
                long,
                ReminderKind::Scheduled {
                    pattern: SchedulePattern::Daily,
                    time: ClockTime::new(14, 30).unwrap(),
                },
                Some(Utc.with_ymd_and_hms(2025, 3, 14, 14, 30, 0).unwrap()),
            )],
        };
        let embed = listing(&listing_data, utc(), now());
        assert_eq!(embed.title, "📝 Your Active Reminders");
        assert_eq!(embed.fields.len(), 2);
        assert_eq!(embed.fields[0].0, "⏰ One-time Reminders");
        assert_eq!(
            embed.fields[0].1,
            "**1.** stand up *(5 minutes)*\n**2.** a reminder message that is muc... *(2 hours)*"
        );
        assert_eq!(embed.fields[1].0, "📅 Scheduled Reminders");
        assert_eq!(
            embed.fields[1].1,
            "**1.** a reminder message that i...\n*daily at 2:30 PM (next: 03/14 2:30 PM)*"
        );
        assert_eq!(
            embed.footer.as_deref(),
            Some("Use /remind-manage to cancel reminders")
        );
    }

    #[test]
    fn stop_replies() {
        assert_eq!(stopped_by_content(0, "gym").title, "❌ No Matching Reminders");
        assert_eq!(
            stopped_by_content(1, "gym").description.as_deref(),
            Some("Stopped 1 reminder matching: *gym*")
        );
        assert_eq!(
            stopped_recurring(2).description.as_deref(),
            Some("Stopped 2 recurring reminders.")
        );
        assert_eq!(stopped_scheduled(0).title, "📅 No Scheduled Reminders");
    }

    #[test]
    fn help_reflects_configured_limits() {
        let limits = ReminderConfig {
            max_active: 8,
            utc_offset_hours: -5,
            ..ReminderConfig::default()
        };
        let embed = help(&limits, now());
        let limits_field = &embed.fields.iter().find(|f| f.0 == "📊 Limits").unwrap().1;
        assert!(limits_field.contains("Max 8 total reminders"));
        assert!(limits_field.contains("One-time: 10 seconds - 52 weeks"));
        assert!(embed.fields[2].1.contains("UTC-5"));
        assert!(embed.footer.unwrap().contains("lost when the bot restarts"));
    }
}
