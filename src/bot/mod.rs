//! Bot registry and health monitoring.
//!
//! A bot is an external redirect endpoint that must be health-checked on a
//! schedule. This module tracks each bot's status and consecutive-failure
//! count and keeps that state durable across monitor restarts. The module
//! follows hexagonal architecture:
//!
//! - Domain types and the state-transition policy in [`domain`]
//! - Port contracts for storage and probing in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Sweep and monitor-loop orchestration in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
