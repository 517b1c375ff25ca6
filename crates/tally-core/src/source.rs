//! Pluggable process-level metric sources.
//!
//! A source is polled on every scrape and returns freshly computed families.
//! The registry reserves every name a source describes, so user instruments
//! cannot shadow default metrics.

use std::sync::Mutex;

use sysinfo::{Pid, System};
use thiserror::Error;

use crate::error::{Result, TallyError};
use crate::metric::{MetricDesc, MetricFamily, MetricKind, Sample, Value};

/// Failure reported by a source during collection.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SourceError(pub String);

/// Supplier of process/runtime metrics polled at snapshot time.
pub trait ProcessMetricsSource: Send + Sync {
    /// Short identifier used in logs and error messages.
    fn name(&self) -> &'static str;
    /// Every family this source may emit.
    fn describe(&self) -> Vec<MetricDesc>;
    fn collect(&self) -> std::result::Result<Vec<MetricFamily>, SourceError>;
}

/// OS-level stats for the current process, read through `sysinfo`.
///
/// CPU usage is a percentage over the interval since the previous scrape, so
/// the first scrape reports 0.
pub struct ProcessCollector {
    pid: Pid,
    sys: Mutex<System>,
    start_time: MetricDesc,
    uptime: MetricDesc,
    resident: MetricDesc,
    virtual_mem: MetricDesc,
    cpu_usage: MetricDesc,
}

impl ProcessCollector {
    /// `prefix` is prepended to every metric name (may be empty).
    pub fn new(prefix: &str) -> Result<Self> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| TallyError::Internal(format!("current pid unavailable: {e}")))?;
        let d = |name: &str, help: &str, kind| MetricDesc::new(format!("{prefix}{name}"), help, kind);
        Ok(Self {
            pid,
            sys: Mutex::new(System::new()),
            start_time: d(
                "process_start_time_seconds",
                "Start time of the process since unix epoch in seconds.",
                MetricKind::Gauge,
            )?,
            uptime: d(
                "process_uptime_seconds",
                "Seconds since the process started.",
                MetricKind::Gauge,
            )?,
            resident: d(
                "process_resident_memory_bytes",
                "Resident memory size in bytes.",
                MetricKind::Gauge,
            )?,
            virtual_mem: d(
                "process_virtual_memory_bytes",
                "Virtual memory size in bytes.",
                MetricKind::Gauge,
            )?,
            cpu_usage: d(
                "process_cpu_usage_percent",
                "CPU usage of the process since the previous scrape, in percent of one core.",
                MetricKind::Gauge,
            )?,
        })
    }
}

impl ProcessMetricsSource for ProcessCollector {
    fn name(&self) -> &'static str {
        "process"
    }

    fn describe(&self) -> Vec<MetricDesc> {
        vec![
            self.start_time.clone(),
            self.uptime.clone(),
            self.resident.clone(),
            self.virtual_mem.clone(),
            self.cpu_usage.clone(),
        ]
    }

    fn collect(&self) -> std::result::Result<Vec<MetricFamily>, SourceError> {
        let mut sys = self
            .sys
            .lock()
            .map_err(|_| SourceError("process stats lock poisoned".into()))?;
        if !sys.refresh_process(self.pid) {
            return Err(SourceError(format!("process {} not found", self.pid)));
        }
        let p = sys
            .process(self.pid)
            .ok_or_else(|| SourceError(format!("process {} not found", self.pid)))?;

        let gauge = |desc: &MetricDesc, v: Value| MetricFamily::from_desc(desc, vec![Sample::unlabeled(v)]);
        Ok(vec![
            gauge(&self.start_time, Value::Unsigned(p.start_time())),
            gauge(&self.uptime, Value::Unsigned(p.run_time())),
            gauge(&self.resident, Value::Unsigned(p.memory())),
            gauge(&self.virtual_mem, Value::Unsigned(p.virtual_memory())),
            gauge(&self.cpu_usage, Value::Float(f64::from(p.cpu_usage()))),
        ])
    }
}
