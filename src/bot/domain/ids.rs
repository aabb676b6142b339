//! Identifier and validated-value types for bots.

use super::BotDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length for a bot name, matching `VARCHAR(100)`.
const MAX_BOT_NAME_LENGTH: usize = 100;

/// Maximum length for a redirect URL, matching `VARCHAR(500)`.
const MAX_REDIRECT_URL_LENGTH: usize = 500;

/// Unique identifier for a monitored bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BotId(Uuid);

impl BotId {
    /// Creates a new random bot identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a bot identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for BotId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for BotId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for BotId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated bot display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BotName(String);

impl BotName {
    /// Creates a validated bot name.
    ///
    /// The input is trimmed; interior characters are kept as given.
    ///
    /// # Errors
    ///
    /// Returns [`BotDomainError`] when the name is empty or too long.
    pub fn new(value: impl Into<String>) -> Result<Self, BotDomainError> {
        let normalized = value.into().trim().to_owned();

        if normalized.is_empty() {
            return Err(BotDomainError::EmptyBotName);
        }

        if normalized.chars().count() > MAX_BOT_NAME_LENGTH {
            return Err(BotDomainError::BotNameTooLong(normalized));
        }

        Ok(Self(normalized))
    }

    /// Returns the bot name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BotName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for BotName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Validated absolute HTTP(S) URL that a bot redirects through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedirectUrl(String);

impl RedirectUrl {
    /// Creates a validated redirect URL.
    ///
    /// The input is trimmed. Only `http://` and `https://` URLs with a
    /// non-empty remainder and no embedded whitespace are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`BotDomainError`] when validation fails.
    pub fn new(value: impl Into<String>) -> Result<Self, BotDomainError> {
        let normalized = value.into().trim().to_owned();

        if normalized.is_empty() {
            return Err(BotDomainError::EmptyRedirectUrl);
        }

        let remainder = normalized
            .strip_prefix("https://")
            .or_else(|| normalized.strip_prefix("http://"));
        let is_valid = remainder.is_some_and(|rest| {
            !rest.is_empty() && !rest.chars().any(char::is_whitespace)
        });
        if !is_valid {
            return Err(BotDomainError::InvalidRedirectUrl(normalized));
        }

        if normalized.len() > MAX_REDIRECT_URL_LENGTH {
            return Err(BotDomainError::RedirectUrlTooLong(normalized));
        }

        Ok(Self(normalized))
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RedirectUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for RedirectUrl {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
