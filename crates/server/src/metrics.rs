//! Prometheus metrics for the search service.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn init_metrics() {
    let handle = PrometheusBuilder::new().install_recorder().expect("failed to install Prometheus recorder");
    PROMETHEUS_HANDLE.set(handle).expect("Prometheus handle already initialized");
    tracing::info!("Prometheus metrics initialized");
}

pub async fn metrics_handler() -> impl IntoResponse {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics not initialized".to_string()),
    }
}

pub fn record_guardrail_decision(category: &str) {
    counter!("autolot_guardrail_blocks_total", "category" => category.to_string()).increment(1);
}

pub fn record_search(strategy: &str, duration_seconds: f64) {
    counter!("autolot_search_requests_total", "strategy" => strategy.to_string()).increment(1);
    histogram!("autolot_search_duration_seconds", "strategy" => strategy.to_string()).record(duration_seconds);
}
