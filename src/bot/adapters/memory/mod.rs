//! In-memory adapters for deterministic tests and local runs.

mod prober;
mod repository;

pub use prober::ScriptedEndpointProber;
pub use repository::InMemoryBotRepository;
