//! Adapter implementations for bot persistence and probing ports.

pub mod memory;
pub mod postgres;

mod http;

pub use http::{HttpEndpointProber, HttpProberBuildError};
