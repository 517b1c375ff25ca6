//! tally server library entry.
//!
//! Wires the core registry to an axum router: config loading, application
//! state, request instrumentation and the exposition endpoints. Used by the
//! binary (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
