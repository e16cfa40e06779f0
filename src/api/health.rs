//! Liveness and readiness probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tracing::warn;

use crate::api::types::Json;

use super::state::AppState;

/// Probe outcome
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Healthy,
    Unhealthy,
}

/// Body returned by `/health` and `/ready`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResponse {
    pub status: ProbeStatus,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_policy: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_store: Option<KeyStoreProbe>,
}

/// Result of counting the key store
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStoreProbe {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<usize>,
    pub latency_ms: u64,
}

impl KeyStoreProbe {
    fn status(&self) -> ProbeStatus {
        if self.reachable {
            ProbeStatus::Healthy
        } else {
            ProbeStatus::Unhealthy
        }
    }
}

/// Returns 200 while the process is serving
pub async fn health_check() -> impl IntoResponse {
    Json(ProbeResponse {
        status: ProbeStatus::Healthy,
        version: env!("CARGO_PKG_VERSION"),
        usage_policy: None,
        key_store: None,
    })
}

/// 200 when the key store answers a count, 503 otherwise
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let key_store = probe_key_store(&state).await;
    let status = key_store.status();

    let response = ProbeResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        usage_policy: Some(state.api_key_service.usage_policy().as_str()),
        key_store: Some(key_store),
    };

    let code = match status {
        ProbeStatus::Healthy => StatusCode::OK,
        ProbeStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (code, Json(response))
}

pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn probe_key_store(state: &AppState) -> KeyStoreProbe {
    let start = Instant::now();
    let result = state.api_key_service.count().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(keys) => KeyStoreProbe {
            reachable: true,
            keys: Some(keys),
            latency_ms,
        },
        Err(e) => {
            // Store errors can carry connection details; keep them in the log.
            warn!(error = %e, "Key store readiness probe failed");
            KeyStoreProbe {
                reachable: false,
                keys: None,
                latency_ms,
            }
        }
    }
}
