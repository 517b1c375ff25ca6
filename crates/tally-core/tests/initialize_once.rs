//! Runs in its own test binary: the initialization guard is process-wide.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use tally_core::{initialize, DefaultCollectors};

#[test]
fn initialize_succeeds_once_and_failed_attempts_do_not_count() {
    let bad = DefaultCollectors {
        process: true,
        prefix: "bad-prefix".into(),
    };
    let err = initialize(&bad).err().expect("invalid prefix must fail");
    assert_eq!(err.code().as_str(), "INVALID_NAME");

    let registry = initialize(&DefaultCollectors::default()).expect("retry after failure succeeds");
    assert!(registry
        .metric_names()
        .iter()
        .any(|n| n == "process_start_time_seconds"));

    let err = initialize(&DefaultCollectors::default())
        .err()
        .expect("second success must fail");
    assert_eq!(err.code().as_str(), "ALREADY_INITIALIZED");
}
