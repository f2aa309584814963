use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::metrics::exposition::render_prometheus;
use crate::metrics::ControllerMetrics;

const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub primed: bool,
    pub iterations: u64,
    pub iterations_skipped: u64,
    pub cached_definitions: u64,
}

pub async fn healthz(State(m): State<Arc<ControllerMetrics>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        primed: m.is_primed(),
        iterations: m.iterations_val(),
        iterations_skipped: m.iterations_skipped_val(),
        cached_definitions: m.cached_definitions_val(),
    })
}

// 503 until the first cache refresh went through.
pub async fn ready(State(m): State<Arc<ControllerMetrics>>) -> StatusCode {
    if m.is_primed() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

pub async fn prometheus(State(m): State<Arc<ControllerMetrics>>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, PROMETHEUS_TEXT)], render_prometheus(&m))
}
