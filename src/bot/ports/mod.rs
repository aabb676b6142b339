//! Port contracts for bot persistence and endpoint probing.

mod prober;
mod repository;

pub use prober::EndpointProber;
pub use repository::{BotRepository, BotRepositoryError, BotRepositoryResult};
