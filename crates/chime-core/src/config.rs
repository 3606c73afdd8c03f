use chrono::FixedOffset;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{ChimeError, Result};

// Reminder limits enforced at the command surface.
pub const DEFAULT_MAX_ACTIVE: usize = 5;
pub const DEFAULT_MAX_RECURRING: usize = 3;
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 500;
pub const DEFAULT_ONE_SHOT_MIN_SECS: u64 = 10;
pub const DEFAULT_ONE_SHOT_MAX_SECS: u64 = 31_536_000; // 365 days
pub const DEFAULT_RECURRING_MIN_SECS: u64 = 60;
pub const DEFAULT_RECURRING_MAX_SECS: u64 = 86_400; // 1 day
pub const MIN_UTC_OFFSET_HOURS: i32 = -12;
pub const MAX_UTC_OFFSET_HOURS: i32 = 14;

/// Top-level config (chime.toml + CHIME_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChimeConfig {
    #[serde(default)]
    pub discord: Option<DiscordConfig>,
    #[serde(default)]
    pub reminders: ReminderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub bot_token: String,
    /// When set, slash commands are registered on this guild only (instant
    /// propagation); otherwise they are registered globally.
    #[serde(default)]
    pub guild_id: Option<u64>,
    /// Discord user allowed to run `/remind-manage test`.
    #[serde(default)]
    pub owner_id: Option<u64>,
}

/// Quotas, ranges and the wall-clock offset for the reminder engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Active reminders per owner, all kinds together.
    #[serde(default = "default_max_active")]
    pub max_active: usize,
    /// Active recurring reminders per owner.
    #[serde(default = "default_max_recurring")]
    pub max_recurring: usize,
    /// Active scheduled reminders per owner. Unset means only `max_active` applies.
    #[serde(default)]
    pub max_scheduled: Option<usize>,
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
    #[serde(default = "default_one_shot_min_secs")]
    pub one_shot_min_secs: u64,
    #[serde(default = "default_one_shot_max_secs")]
    pub one_shot_max_secs: u64,
    #[serde(default = "default_recurring_min_secs")]
    pub recurring_min_secs: u64,
    #[serde(default = "default_recurring_max_secs")]
    pub recurring_max_secs: u64,
    /// Whole-hour offset from UTC in which scheduled reminders are evaluated.
    #[serde(default)]
    pub utc_offset_hours: i32,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            max_active: DEFAULT_MAX_ACTIVE,
            max_recurring: DEFAULT_MAX_RECURRING,
            max_scheduled: None,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
            one_shot_min_secs: DEFAULT_ONE_SHOT_MIN_SECS,
            one_shot_max_secs: DEFAULT_ONE_SHOT_MAX_SECS,
            recurring_min_secs: DEFAULT_RECURRING_MIN_SECS,
            recurring_max_secs: DEFAULT_RECURRING_MAX_SECS,
            utc_offset_hours: 0,
        }
    }
}

impl ReminderConfig {
    /// Reject limits that would make every request fail or make no sense.
    pub fn validate(&self) -> Result<()> {
        if self.max_active == 0 {
            return Err(invalid("max_active", "must be at least 1"));
        }
        if self.max_recurring > self.max_active {
            return Err(invalid("max_recurring", "must not exceed max_active"));
        }
        if let Some(max) = self.max_scheduled {
            if max > self.max_active {
                return Err(invalid("max_scheduled", "must not exceed max_active"));
            }
        }
        if self.max_message_chars == 0 {
            return Err(invalid("max_message_chars", "must be at least 1"));
        }
        if self.one_shot_min_secs == 0 || self.one_shot_min_secs > self.one_shot_max_secs {
            return Err(invalid(
                "one_shot_min_secs",
                "must be positive and not above one_shot_max_secs",
            ));
        }
        if self.recurring_min_secs == 0 || self.recurring_min_secs > self.recurring_max_secs {
            return Err(invalid(
                "recurring_min_secs",
                "must be positive and not above recurring_max_secs",
            ));
        }
        if !(MIN_UTC_OFFSET_HOURS..=MAX_UTC_OFFSET_HOURS).contains(&self.utc_offset_hours) {
            return Err(invalid(
                "utc_offset_hours",
                &format!("must be within {MIN_UTC_OFFSET_HOURS}..={MAX_UTC_OFFSET_HOURS}"),
            ));
        }
        Ok(())
    }

    /// The configured offset as a chrono [`FixedOffset`].
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .ok_or_else(|| invalid("utc_offset_hours", "not a representable offset"))
    }
}

fn invalid(field: &'static str, reason: &str) -> ChimeError {
    ChimeError::InvalidLimit {
        field,
        reason: reason.to_string(),
    }
}

fn default_max_active() -> usize {
    DEFAULT_MAX_ACTIVE
}
fn default_max_recurring() -> usize {
    DEFAULT_MAX_RECURRING
}
fn default_max_message_chars() -> usize {
    DEFAULT_MAX_MESSAGE_CHARS
}
fn default_one_shot_min_secs() -> u64 {
    DEFAULT_ONE_SHOT_MIN_SECS
}
fn default_one_shot_max_secs() -> u64 {
    DEFAULT_ONE_SHOT_MAX_SECS
}
fn default_recurring_min_secs() -> u64 {
    DEFAULT_RECURRING_MIN_SECS
}
fn default_recurring_max_secs() -> u64 {
    DEFAULT_RECURRING_MAX_SECS
}

impl ChimeConfig {
    /// Load config from a TOML file with CHIME_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.chime/chime.toml
    ///
    /// A missing file is not an error; defaults and env vars still apply.
    /// Nested keys use a double underscore: `CHIME_REMINDERS__MAX_ACTIVE=10`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Self::from_figment(
            Figment::from(Serialized::defaults(ChimeConfig::default()))
                .merge(Toml::file(&path))
                .merge(Env::prefixed("CHIME_").split("__")),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: ChimeConfig = figment
            .extract()
            .map_err(|e| ChimeError::Config(e.to_string()))?;
        config.reminders.validate()?;
        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.chime/chime.toml", home)
}
