use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChimeError {
    /// The figment layers could not be merged or extracted.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid limit `{field}`: {reason}")]
    InvalidLimit { field: &'static str, reason: String },
}

impl ChimeError {
    /// Short error code string used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            ChimeError::Config(_) => "CONFIG_ERROR",
            ChimeError::InvalidLimit { .. } => "INVALID_LIMIT",
        }
    }
}

pub type Result<T> = std::result::Result<T, ChimeError>;
