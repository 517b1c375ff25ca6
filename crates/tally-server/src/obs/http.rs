//! HTTP request instrumentation.
//!
//! `route` is the matched route template, never the raw URI, so label
//! cardinality stays bounded by the router. Requests that match no route are
//! counted under `unmatched`.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use tally_core::{CounterVec, GaugeVec, MetricsRegistry, Result};

use crate::app_state::AppState;

const UNMATCHED_ROUTE: &str = "unmatched";

/// Instruments shared by the middleware and anything else that counts requests.
#[derive(Clone)]
pub struct HttpMetrics {
    pub requests_total: CounterVec,
    pub in_flight: GaugeVec,
}

impl HttpMetrics {
    /// Create and register both instruments.
    pub fn register(registry: &mut MetricsRegistry) -> Result<Self> {
        let requests_total = CounterVec::new(
            "http_requests_total",
            "Total number of HTTP requests",
            &["method", "route", "status"],
        )?;
        let in_flight = GaugeVec::new(
            "http_requests_in_flight",
            "HTTP requests currently being served",
            &[],
        )?;
        registry.register(requests_total.clone())?;
        registry.register(in_flight.clone())?;
        Ok(Self {
            requests_total,
            in_flight,
        })
    }

    /// Count one finished request.
    pub fn observe(&self, method: &str, route: &str, status: u16) {
        let status = status.to_string();
        if let Err(e) = self.requests_total.inc(&[method, route, &status]) {
            tracing::warn!(error = %e, "request counter rejected labels");
        }
    }
}

/// Middleware: count every request after the inner service responds.
pub async fn track_requests(State(app): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().as_str().to_owned();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());

    let metrics = app.http_metrics();
    let response = {
        let _in_flight = InFlight::enter(&metrics.in_flight);
        next.run(req).await
    };

    metrics.observe(&method, &route, response.status().as_u16());
    response
}

/// Holds one slot of the in-flight gauge; released on drop, so a request
/// whose future is cancelled mid-flight still gives its slot back.
pub struct InFlight<'a> {
    gauge: &'a GaugeVec,
}

impl<'a> InFlight<'a> {
    pub fn enter(gauge: &'a GaugeVec) -> Self {
        if let Err(e) = gauge.inc(&[]) {
            tracing::warn!(error = %e, "in-flight gauge rejected increment");
        }
        Self { gauge }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.gauge.dec(&[]) {
            tracing::warn!(error = %e, "in-flight gauge rejected decrement");
        }
    }
}
