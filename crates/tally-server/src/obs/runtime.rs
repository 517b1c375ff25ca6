//! Tokio runtime gauges.

use tally_core::{
    MetricDesc, MetricFamily, MetricKind, ProcessMetricsSource, Result, Sample, SourceError,
    Value,
};
use tokio::runtime::Handle;

/// Worker and task counts of the runtime the scrape runs on.
///
/// Emits nothing when collected outside a tokio runtime.
pub struct RuntimeCollector {
    workers: MetricDesc,
    alive_tasks: MetricDesc,
}

impl RuntimeCollector {
    pub fn new(prefix: &str) -> Result<Self> {
        Ok(Self {
            workers: MetricDesc::new(
                format!("{prefix}tokio_runtime_workers"),
                "Number of worker threads used by the runtime.",
                MetricKind::Gauge,
            )?,
            alive_tasks: MetricDesc::new(
                format!("{prefix}tokio_runtime_alive_tasks"),
                "Number of alive tasks in the runtime.",
                MetricKind::Gauge,
            )?,
        })
    }
}

impl ProcessMetricsSource for RuntimeCollector {
    fn name(&self) -> &'static str {
        "tokio"
    }

    fn describe(&self) -> Vec<MetricDesc> {
        vec![self.workers.clone(), self.alive_tasks.clone()]
    }

    fn collect(&self) -> std::result::Result<Vec<MetricFamily>, SourceError> {
        let Ok(handle) = Handle::try_current() else {
            return Ok(Vec::new());
        };
        let m = handle.metrics();
        Ok(vec![
            MetricFamily::from_desc(
                &self.workers,
                vec![Sample::unlabeled(Value::Unsigned(m.num_workers() as u64))],
            ),
            MetricFamily::from_desc(
                &self.alive_tasks,
                vec![Sample::unlabeled(Value::Unsigned(m.num_alive_tasks() as u64))],
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn empty_outside_runtime() {
        let c = RuntimeCollector::new("").unwrap();
        assert!(c.collect().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reports_inside_runtime() {
        let c = RuntimeCollector::new("svc_").unwrap();
        let fams = c.collect().unwrap();
        assert_eq!(fams.len(), 2);
        assert_eq!(fams[0].name, "svc_tokio_runtime_workers");
        assert_eq!(fams[0].samples[0].value, Value::Unsigned(1));
    }
}
