//! Bot monitor: continuous health checking for registered redirect bots.
//!
//! The monitor periodically probes every registered bot's redirect endpoint,
//! folds each result into a persistent health status, and writes that status
//! back to the shared `PostgreSQL` store.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Bot state and the probe state-transition policy
//! - **Ports**: Storage and probing contracts
//! - **Adapters**: Diesel, in-memory, and `reqwest` implementations
//!
//! # Modules
//!
//! - [`bot`]: Bot domain, ports, adapters, and monitoring services
//! - [`config`]: Flag and environment configuration
//! - [`supervisor`]: Restart policy around a monitor run
//! - [`runtime`]: Production wiring of adapters into the monitor loop

pub mod bot;
pub mod config;
pub mod runtime;
pub mod supervisor;
