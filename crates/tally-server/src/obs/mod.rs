//! Server-side instrumentation.
//!
//! `http` counts every handled request; `runtime` exposes tokio scheduler
//! gauges as a process metrics source.

pub mod http;
pub mod runtime;

pub use http::{track_requests, HttpMetrics};
pub use runtime::RuntimeCollector;
