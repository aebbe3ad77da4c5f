//! Status API
//!
//! Read-only HTTP view of the running session and the audit trail.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use storage::EventStore;
use tower_http::trace::TraceLayer;

use crate::status::SharedStatus;

pub mod events;
pub mod status;

/// Application state shared across handlers
pub struct AppState {
    pub status: SharedStatus,
    pub store: Arc<dyn EventStore>,
    pub version: String,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(status: SharedStatus, store: Arc<dyn EventStore>) -> Self {
        Self {
            status,
            store,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub serial_connected: bool,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/status", get(status::get_status))
        .route("/api/v1/events", get(events::get_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let serial_connected = state.status.read().await.serial_device.is_some();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        serial_connected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::shared_status;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use storage::{AuditEvent, MemoryEventStore};
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn app(store: Arc<MemoryEventStore>) -> Router {
        create_router(Arc::new(AppState::new(
            shared_status(Some("/dev/ttyUSB0".into())),
            store,
        )))
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(app(Arc::new(MemoryEventStore::new())), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["serial_connected"], true);
    }

    #[tokio::test]
    async fn test_status_reports_initial_state() {
        let (status, body) = get_json(app(Arc::new(MemoryEventStore::new())), "/api/v1/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "Active");
        assert_eq!(body["counters"]["sleep"], 0);
        assert_eq!(body["serial_device"], "/dev/ttyUSB0");
        assert_eq!(body["location"]["status"], "unset");
    }

    #[tokio::test]
    async fn test_events_newest_first_with_limit() {
        let store = Arc::new(MemoryEventStore::new());
        for status in ["Application started", "Driver is drowsy", "Driver is sleeping"] {
            store.append(&AuditEvent::system(status)).await.unwrap();
        }

        let (status, body) = get_json(app(store), "/api/v1/events?limit=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["data"][0]["driver_status"], "Driver is sleeping");
        assert_eq!(body["data"][1]["driver_status"], "Driver is drowsy");
    }
}
