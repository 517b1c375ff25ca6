//! Operational HTTP endpoints.
//!
//! - `/healthz`      : liveness
//! - `/metrics`      : Prometheus text format (path configurable)
//! - `/metrics.json` : same snapshot as JSON
//!
//! A failed scrape is logged and answered with 500. Nothing is retried; the
//! scraper comes back on its own schedule.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tally_core::TallyError;

use crate::app_state::AppState;

const GENERIC_FAILURE_BODY: &str = "metrics unavailable";

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let registry = state.registry();
    match registry.snapshot() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, registry.content_type())],
            body,
        )
            .into_response(),
        Err(e) => scrape_failed(&state, e),
    }
}

pub async fn metrics_json(State(state): State<AppState>) -> Response {
    match state.registry().snapshot_json() {
        Ok(v) => (StatusCode::OK, Json(v)).into_response(),
        Err(e) => scrape_failed(&state, e),
    }
}

fn scrape_failed(state: &AppState, e: TallyError) -> Response {
    tracing::error!(error = %e, code = e.code().as_str(), "metrics scrape failed");
    let body = if state.cfg().server.expose_error_detail {
        e.to_string()
    } else {
        GENERIC_FAILURE_BODY.to_owned()
    };
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}
