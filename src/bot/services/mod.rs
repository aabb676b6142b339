//! Application services for bot monitoring.

mod monitor;
mod sweep;

pub use monitor::{DEFAULT_SWEEP_INTERVAL, MonitorExitReason, MonitorLoop, MonitorSummary};
pub use sweep::{BotSweepService, DEFAULT_PROBE_CONCURRENCY, SweepReport};
pub(crate) use sweep::shutdown_requested;
