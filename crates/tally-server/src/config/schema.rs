use std::collections::BTreeMap;
use std::net::SocketAddr;

use serde::Deserialize;
use tally_core::error::{Result, TallyError};
use tally_core::metric::{validate_label_name, validate_metric_name};
use tally_core::DefaultCollectors;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub metrics: MetricsSection,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(TallyError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.server.validate()?;
        self.metrics.validate()?;
        Ok(())
    }
}

/// Defaults only; used by tests and when embedding without a file.
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    /// Put the raw error text in 500 bodies instead of a generic message.
    #[serde(default)]
    pub expose_error_detail: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            metrics_path: default_metrics_path(),
            expose_error_detail: false,
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !self.metrics_path.starts_with('/') {
            return Err(TallyError::Config(
                "server.metrics_path must start with '/'".into(),
            ));
        }
        if matches!(self.metrics_path.as_str(), "/healthz" | "/metrics.json") {
            return Err(TallyError::Config(format!(
                "server.metrics_path {} collides with a built-in route",
                self.metrics_path
            )));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            TallyError::Config(format!("server.listen {:?} is not a socket address: {e}", self.listen))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:9464".into()
}
fn default_metrics_path() -> String {
    "/metrics".into()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Prefix for default process/runtime metric names.
    #[serde(default)]
    pub prefix: String,

    #[serde(default = "default_true")]
    pub process: bool,

    #[serde(default = "default_true")]
    pub runtime: bool,

    #[serde(default)]
    pub default_labels: BTreeMap<String, String>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            process: true,
            runtime: true,
            default_labels: BTreeMap::new(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        if !self.prefix.is_empty() {
            validate_metric_name(&self.prefix)
                .map_err(|_| TallyError::Config(format!("metrics.prefix {:?} is invalid", self.prefix)))?;
        }
        for k in self.default_labels.keys() {
            validate_label_name(k)
                .map_err(|_| TallyError::Config(format!("metrics.default_labels key {k:?} is invalid")))?;
        }
        Ok(())
    }

    pub fn default_collectors(&self) -> DefaultCollectors {
        DefaultCollectors {
            process: self.process,
            prefix: self.prefix.clone(),
        }
    }
}
