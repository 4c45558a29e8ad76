//! Liveness and readiness endpoints
//!
//! `/health` answers as long as the process serves requests. `/ready` also
//! pings the record store and answers 503 while it is unreachable.

use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::repository::UserStore;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,

    pub service: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,

    pub service: String,

    pub dependencies: HashMap<String, DependencyStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DependencyStatus {
    pub healthy: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub async fn health<S: UserStore>(State(state): State<AppState<S>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: state.config().service.name.clone(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    };

    (StatusCode::OK, Json(response))
}

pub async fn readiness<S: UserStore>(State(state): State<AppState<S>>) -> impl IntoResponse {
    let store = match state.users().ping().await {
        Ok(()) => DependencyStatus {
            healthy: true,
            message: Some("Connected".to_string()),
        },
        Err(e) => {
            tracing::error!(error = %e, "Record store health check failed");
            DependencyStatus {
                healthy: false,
                message: Some("Record store unavailable".to_string()),
            }
        }
    };

    let ready = store.healthy;
    let response = ReadinessResponse {
        ready,
        service: state.config().service.name.clone(),
        dependencies: HashMap::from([("store".to_string(), store)]),
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::repository::InMemoryUserStore;
    use crate::users::SystemClock;
    use std::sync::Arc;

    fn state() -> (Arc<InMemoryUserStore>, AppState<InMemoryUserStore>) {
        let store = Arc::new(InMemoryUserStore::default());
        let state = AppState::new(Config::default(), Arc::clone(&store), Arc::new(SystemClock));
        (store, state)
    }

    #[tokio::test]
    async fn test_health_reports_service_name() {
        let (_, state) = state();
        let response = health(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: HealthResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.status, "healthy");
        assert_eq!(body.service, "user-registry");
    }

    #[tokio::test]
    async fn test_readiness_follows_store_availability() {
        let (store, state) = state();
        let response = readiness(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        store.set_available(false);
        let response = readiness(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ReadinessResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.ready);
        assert!(!body.dependencies["store"].healthy);
    }
}
