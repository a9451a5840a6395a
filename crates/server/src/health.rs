use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use resub_core::HostApi;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    host: Arc<dyn HostApi>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub host: HealthCheck,
    pub checked_at: String,
}

pub fn router(host: Arc<dyn HostApi>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { host })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let host = host_check(state.host.as_ref()).await;
    let ready = host.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "resub-server runtime initialized".to_string(),
        },
        host,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn host_check(host: &dyn HostApi) -> HealthCheck {
    match host.server_version().await {
        Ok(version) => {
            HealthCheck { status: "ready", detail: format!("host reachable (v{version})") }
        }
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("host unreachable: {error}") }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use resub_core::{HostOperation, InMemoryHost};

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_returns_ready_when_host_is_reachable() {
        let state = HealthState { host: Arc::new(InMemoryHost::new("9.5.1")) };

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.host.status, "ready");
        assert_eq!(payload.host.detail, "host reachable (v9.5.1)");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_host_is_unreachable() {
        let host = InMemoryHost::new("9.5.1").failing(HostOperation::ServerVersion);
        let state = HealthState { host: Arc::new(host) };

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.host.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
