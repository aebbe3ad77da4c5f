//! Audit event routes

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::AuditEvent;
use tracing::warn;

use super::AppState;

/// Query parameters for the events endpoint
#[derive(Debug, Deserialize)]
pub struct EventQuery {
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

const MAX_LIMIT: usize = 1000;

/// Event record as listed by the API
#[derive(Debug, Serialize)]
pub struct EventRecord {
    pub event_type: String,
    pub date: String,
    pub time: String,
    pub alert_type: String,
    pub driver_status: String,
    pub location_coords: String,
    pub location_place: String,
    pub notes: String,
}

impl From<&AuditEvent> for EventRecord {
    fn from(event: &AuditEvent) -> Self {
        Self {
            event_type: event.event_type.as_str().to_string(),
            date: event.event_date(),
            time: event.event_time(),
            alert_type: event.alert_type.as_str().to_string(),
            driver_status: event.driver_status.clone(),
            location_coords: event.coords.clone(),
            location_place: event.place.clone(),
            notes: event.notes.clone(),
        }
    }
}

/// Response for the events endpoint
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub data: Vec<EventRecord>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Recent audit events, newest first
pub async fn get_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventQuery>,
) -> Result<Json<EventResponse>, (StatusCode, Json<ErrorResponse>)> {
    let limit = params.limit.min(MAX_LIMIT);

    let events = state.store.recent(limit).await.map_err(|e| {
        warn!("Failed to read events: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;

    let data: Vec<EventRecord> = events.iter().map(EventRecord::from).collect();
    Ok(Json(EventResponse {
        count: data.len(),
        data,
    }))
}
