//! Error types for bot domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing bot domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BotDomainError {
    /// The bot name is empty after trimming.
    #[error("bot name must not be empty")]
    EmptyBotName,

    /// The bot name exceeds the 100-character storage limit.
    #[error("bot name exceeds 100 character limit: {0}")]
    BotNameTooLong(String),

    /// The redirect URL is empty after trimming.
    #[error("redirect URL must not be empty")]
    EmptyRedirectUrl,

    /// The redirect URL does not have an `http://` or `https://` prefix.
    #[error("redirect URL '{0}' must start with 'http://' or 'https://'")]
    InvalidRedirectUrl(String),

    /// The redirect URL exceeds the 500-character storage limit.
    #[error("redirect URL exceeds 500 character limit: {0}")]
    RedirectUrlTooLong(String),

    /// A persisted failure counter is negative.
    #[error("failure counter must not be negative: {0}")]
    NegativeFailureCount(i32),

    /// A persisted HTTP status code is outside the valid range.
    #[error("HTTP status code out of range: {0}")]
    InvalidHttpStatus(i32),
}

/// Error returned while parsing bot status from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown bot status: {0}")]
pub struct ParseBotStatusError(pub String);
