//! Observability infrastructure - Prometheus metrics

mod config;
mod metrics;

pub use config::MetricsConfig;
pub use metrics::{
    create_metrics_router, init_metrics, record_api_key_created, record_api_key_deleted,
    record_api_key_validation, record_http_request, PrometheusMetrics,
};
