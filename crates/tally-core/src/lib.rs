//! tally core: metric instruments, the process registry, and exposition encoders.
//!
//! This crate holds everything needed to collect and render metrics. It carries
//! no HTTP or async runtime dependencies; the server crate wires it to axum.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. A failing scrape
//! surfaces as `TallyError::SnapshotFailure` rather than taking the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod exposition;
pub mod instrument;
pub mod metric;
pub mod registry;
pub mod source;

/// Shared result type.
pub use error::{ErrorCode, Result, TallyError};
pub use exposition::TEXT_CONTENT_TYPE;
pub use instrument::{CounterVec, GaugeVec, Instrument};
pub use metric::{MetricDesc, MetricFamily, MetricKind, Sample, Value};
pub use registry::{initialize, DefaultCollectors, MetricsRegistry};
pub use source::{ProcessCollector, ProcessMetricsSource, SourceError};
