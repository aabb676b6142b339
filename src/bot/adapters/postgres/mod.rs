//! `PostgreSQL` adapters for bot persistence.

mod models;
mod repository;
mod schema;

pub use repository::{BotPgPool, PostgresBotRepository};
