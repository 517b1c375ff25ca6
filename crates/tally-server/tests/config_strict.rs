#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use tally_server::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
server:
  listen: "0.0.0.0:9464"
  metric_path: "/m" # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.server.metrics_path, "/metrics");
    assert_eq!(cfg.server.listen, "0.0.0.0:9464");
    assert!(!cfg.server.expose_error_detail);
    assert!(cfg.metrics.process);
    assert!(cfg.metrics.runtime);
    assert!(cfg.metrics.default_labels.is_empty());
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
server:
  listen: "127.0.0.1:9100"
  metrics_path: "/internal/metrics"
  expose_error_detail: true
metrics:
  prefix: "shop_"
  process: false
  runtime: true
  default_labels:
    service: "checkout"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.server.listen_addr().unwrap().port(), 9100);
    assert_eq!(cfg.metrics.default_collectors().prefix, "shop_");
    assert!(!cfg.metrics.default_collectors().process);
    assert_eq!(cfg.metrics.default_labels["service"], "checkout");
}

#[test]
fn rejects_bad_values() {
    let cases = [
        "version: 2\n",
        "version: 1\nserver:\n  listen: \"not-an-addr\"\n",
        "version: 1\nserver:\n  metrics_path: \"metrics\"\n",
        "version: 1\nserver:\n  metrics_path: \"/healthz\"\n",
        "version: 1\nmetrics:\n  prefix: \"bad-prefix\"\n",
        "version: 1\nmetrics:\n  default_labels:\n    \"__name__\": \"x\"\n",
    ];
    for case in cases {
        let err = config::load_from_str(case).expect_err(case);
        assert_eq!(err.code().as_str(), "CONFIG", "{case}");
    }
}

#[test]
fn missing_file_is_internal() {
    let err = config::load_from_file("/nonexistent/tally.yaml").expect_err("must fail");
    assert_eq!(err.code().as_str(), "INTERNAL");
}
