//! Domain model for monitored bots.
//!
//! The bot domain models bot identity, the validated redirect target, the
//! closed set of health states, and the policy that folds a probe result into
//! a bot's durable state. Infrastructure concerns remain outside this
//! boundary.

mod bot;
mod error;
mod ids;
mod probe;
mod stats;
mod status;

pub use bot::{Bot, BotHealthUpdate, PersistedBotData};
pub use error::{BotDomainError, ParseBotStatusError};
pub use ids::{BotId, BotName, RedirectUrl};
pub use probe::ProbeResult;
pub use stats::BotFleetStats;
pub use status::{BotStatus, DegradedThreshold};
