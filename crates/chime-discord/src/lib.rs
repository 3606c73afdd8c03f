//! `chime-discord`: Discord surface for the reminder engine: slash
//! commands, reply embeds and the notifier that posts fired reminders.

pub mod adapter;
pub mod commands;
pub mod embed;
pub mod error;
pub mod handler;
pub mod notifier;
pub mod reply;

pub use adapter::DiscordAdapter;
pub use error::DiscordError;
pub use notifier::DiscordNotifier;
