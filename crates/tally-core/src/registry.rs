//! Process-wide metrics registry.
//!
//! Registration takes `&mut self`: the registry is filled during startup and
//! then frozen behind an `Arc`, so scrapes (`&self`) never run concurrently
//! with registration.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Result, TallyError};
use crate::exposition::{self, TEXT_CONTENT_TYPE};
use crate::instrument::Instrument;
use crate::metric::{validate_label_name, MetricFamily};
use crate::source::{ProcessCollector, ProcessMetricsSource};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Which default collectors to attach.
#[derive(Debug, Clone)]
pub struct DefaultCollectors {
    pub process: bool,
    /// Prepended to default metric names.
    pub prefix: String,
}

impl Default for DefaultCollectors {
    fn default() -> Self {
        Self {
            process: true,
            prefix: String::new(),
        }
    }
}

/// Create the process registry with default collectors. Fails on a second call.
pub fn initialize(opts: &DefaultCollectors) -> Result<MetricsRegistry> {
    if INITIALIZED.load(Ordering::SeqCst) {
        return Err(TallyError::AlreadyInitialized);
    }
    // Claim the flag only once construction succeeded, so a bad config can be retried.
    let registry = MetricsRegistry::with_default_collectors(opts)?;
    if INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(TallyError::AlreadyInitialized);
    }
    tracing::info!(
        metrics = registry.metric_names().len(),
        prefix = %opts.prefix,
        "metrics registry initialized"
    );
    Ok(registry)
}

#[derive(Default)]
pub struct MetricsRegistry {
    instruments: Vec<Box<dyn Instrument>>,
    sources: Vec<Box<dyn ProcessMetricsSource>>,
    names: HashSet<String>,
    order: Vec<String>,
    default_labels: Vec<(String, String)>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the requested default collectors already attached.
    pub fn with_default_collectors(opts: &DefaultCollectors) -> Result<Self> {
        let mut registry = Self::new();
        if opts.process {
            registry.attach_source(ProcessCollector::new(&opts.prefix)?)?;
        }
        Ok(registry)
    }

    fn reserve(&mut self, names: &[String]) -> Result<()> {
        let mut seen = HashSet::new();
        for n in names {
            if self.names.contains(n) || !seen.insert(n.as_str()) {
                return Err(TallyError::DuplicateMetricName(n.clone()));
            }
        }
        for n in names {
            self.names.insert(n.clone());
            self.order.push(n.clone());
        }
        Ok(())
    }

    /// Insert an instrument. A taken name fails and keeps the existing one.
    pub fn register<I: Instrument + 'static>(&mut self, instrument: I) -> Result<()> {
        let name = instrument.desc().name.clone();
        self.reserve(std::slice::from_ref(&name))?;
        tracing::debug!(metric = %name, kind = instrument.desc().kind.as_str(), "metric registered");
        self.instruments.push(Box::new(instrument));
        Ok(())
    }

    /// Attach a source; every name it describes is reserved.
    pub fn attach_source<S: ProcessMetricsSource + 'static>(&mut self, source: S) -> Result<()> {
        let names: Vec<String> = source.describe().into_iter().map(|d| d.name).collect();
        self.reserve(&names)?;
        tracing::debug!(source = source.name(), metrics = names.len(), "metrics source attached");
        self.sources.push(Box::new(source));
        Ok(())
    }

    /// Labels added to every exposed sample that lacks them.
    pub fn set_default_labels<K, V>(&mut self, labels: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut out: Vec<(String, String)> = Vec::new();
        for (k, v) in labels {
            let k = k.into();
            validate_label_name(&k)?;
            out.push((k, v.into()));
        }
        out.sort();
        out.dedup_by(|a, b| a.0 == b.0);
        self.default_labels = out;
        Ok(())
    }

    /// Names in registration order.
    pub fn metric_names(&self) -> &[String] {
        &self.order
    }

    pub fn content_type(&self) -> &'static str {
        TEXT_CONTENT_TYPE
    }

    /// Collect every instrument then every source.
    pub fn gather(&self) -> Result<Vec<MetricFamily>> {
        let mut families: Vec<MetricFamily> = self.instruments.iter().map(|i| i.collect()).collect();
        for source in &self.sources {
            let collected = source.collect().map_err(|e| {
                TallyError::SnapshotFailure(format!("source {} failed: {e}", source.name()))
            })?;
            families.extend(collected);
        }
        Ok(families)
    }

    /// Text exposition of the current state.
    pub fn snapshot(&self) -> Result<String> {
        let families = self.gather()?;
        let mut out = String::new();
        exposition::encode_text(&families, &self.default_labels, &mut out)
            .map_err(|e| TallyError::SnapshotFailure(format!("encode failed: {e}")))?;
        Ok(out)
    }

    /// JSON rendering of the same families.
    pub fn snapshot_json(&self) -> Result<serde_json::Value> {
        let families = self.gather()?;
        Ok(exposition::encode_json(&families, &self.default_labels))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::instrument::{CounterVec, GaugeVec};

    #[test]
    fn names_keep_registration_order() {
        let mut r = MetricsRegistry::new();
        r.register(GaugeVec::new("b_gauge", "b", &[]).unwrap()).unwrap();
        r.register(CounterVec::new("a_total", "a", &[]).unwrap()).unwrap();
        assert_eq!(r.metric_names(), ["b_gauge".to_string(), "a_total".to_string()]);
    }

    #[test]
    fn default_labels_reject_bad_names() {
        let mut r = MetricsRegistry::new();
        assert!(r.set_default_labels([("__reserved", "x")]).is_err());
        assert!(r.set_default_labels([("env", "prod")]).is_ok());
    }

    #[test]
    fn source_name_clash_with_instrument_is_duplicate() {
        let mut r = MetricsRegistry::new();
        r.register(GaugeVec::new("process_start_time_seconds", "x", &[]).unwrap())
            .unwrap();
        let err = r.attach_source(ProcessCollector::new("").unwrap()).unwrap_err();
        assert_eq!(err.code().as_str(), "DUPLICATE_METRIC_NAME");
        // Partial reservations are not left behind.
        assert_eq!(r.metric_names().len(), 1);
    }
}
