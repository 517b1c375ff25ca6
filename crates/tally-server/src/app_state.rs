//! Shared application state for the tally server.
//!
//! All registration happens here, before the registry is frozen in an `Arc`
//! and handed to the router. Startup errors are returned, never panicked on.

use std::sync::Arc;

use tally_core::error::Result;
use tally_core::MetricsRegistry;

use crate::config::ServerConfig;
use crate::obs::{HttpMetrics, RuntimeCollector};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServerConfig,
    registry: MetricsRegistry,
    http: HttpMetrics,
}

impl AppState {
    /// Build state around the process registry (`tally_core::initialize`).
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        let registry = tally_core::initialize(&cfg.metrics.default_collectors())?;
        Self::with_registry(cfg, registry)
    }

    /// Build state around a caller-provided registry.
    ///
    /// Adds the runtime source (if enabled), default labels and the HTTP
    /// instruments. Any name clash aborts startup.
    pub fn with_registry(cfg: ServerConfig, mut registry: MetricsRegistry) -> Result<Self> {
        if cfg.metrics.runtime {
            registry.attach_source(RuntimeCollector::new(&cfg.metrics.prefix)?)?;
        }
        if !cfg.metrics.default_labels.is_empty() {
            registry.set_default_labels(cfg.metrics.default_labels.clone())?;
        }
        let http = HttpMetrics::register(&mut registry)?;

        tracing::info!(metrics = ?registry.metric_names(), "metrics registered");

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, registry, http }),
        })
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> &MetricsRegistry {
        &self.inner.registry
    }

    pub fn http_metrics(&self) -> &HttpMetrics {
        &self.inner.http
    }
}
