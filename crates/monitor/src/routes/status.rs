//! Session status route

use axum::{extract::State, Json};
use std::sync::Arc;

use super::AppState;
use crate::status::MonitorStatus;

/// Current alertness state, counters, location and serial mode
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<MonitorStatus> {
    Json(state.status.read().await.clone())
}
