//! Collected metric data (the read side shared by every encoder).
//!
//! Instruments and sources both produce `MetricFamily` values on every scrape.
//! Families are plain owned data: once collected they no longer reference the
//! live atomics, so encoding never races with increments.

use serde::Serialize;

use crate::error::{Result, TallyError};

/// Metric type as announced on the `# TYPE` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

/// Static description of a metric: name, help text, type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDesc {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
}

impl MetricDesc {
    /// Build a description after validating the metric name.
    pub fn new(name: impl Into<String>, help: impl Into<String>, kind: MetricKind) -> Result<Self> {
        let name = name.into();
        validate_metric_name(&name)?;
        Ok(Self {
            name,
            help: help.into(),
            kind,
        })
    }
}

/// Sample value. Integers stay integers so large counters keep full precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

/// One time series point: ordered label pairs plus value.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: Vec<(String, String)>,
    pub value: Value,
}

impl Sample {
    pub fn unlabeled(value: Value) -> Self {
        Self {
            labels: Vec::new(),
            value,
        }
    }
}

/// A metric with all its samples at collection time.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    pub fn from_desc(desc: &MetricDesc, samples: Vec<Sample>) -> Self {
        Self {
            name: desc.name.clone(),
            help: desc.help.clone(),
            kind: desc.kind,
            samples,
        }
    }
}

/// Metric names: `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn validate_metric_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let ok = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        }
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(TallyError::InvalidName(format!("metric name {name:?}")))
    }
}

/// Label names: `[a-zA-Z_][a-zA-Z0-9_]*`, `__` prefix reserved.
pub fn validate_label_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let ok = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if ok && !name.starts_with("__") {
        Ok(())
    } else {
        Err(TallyError::InvalidName(format!("label name {name:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names() {
        assert!(validate_metric_name("http_requests_total").is_ok());
        assert!(validate_metric_name("ns:sub_total").is_ok());
        assert!(validate_metric_name("_private").is_ok());
        assert!(validate_metric_name("").is_err());
        assert!(validate_metric_name("9lives").is_err());
        assert!(validate_metric_name("has-dash").is_err());
    }

    #[test]
    fn label_names() {
        assert!(validate_label_name("method").is_ok());
        assert!(validate_label_name("__name__").is_err());
        assert!(validate_label_name("a:b").is_err());
        assert!(validate_label_name("").is_err());
    }
}
