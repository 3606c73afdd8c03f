/// Errors produced by the Discord adapter.
#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("serenity error: {0}")]
    Serenity(#[from] serenity::Error),

    /// `[discord] bot_token` is missing or blank.
    #[error("no bot token configured")]
    NoToken,
}

impl DiscordError {
    pub fn code(&self) -> &'static str {
        match self {
            DiscordError::Serenity(_) => "DISCORD_ERROR",
            DiscordError::NoToken => "NO_TOKEN",
        }
    }
}

pub type Result<T> = std::result::Result<T, DiscordError>;
