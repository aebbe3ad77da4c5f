//! Live session status published for the API

use chrono::{DateTime, Utc};
use dms::{AlertnessState, Decision, HysteresisCounters};
use serde::Serialize;
use std::sync::Arc;
use telemetry::Location;
use tokio::sync::RwLock;

/// Snapshot of the running session
#[derive(Debug, Clone, Default, Serialize)]
pub struct MonitorStatus {
    pub state: AlertnessState,
    pub counters: HysteresisCounters,
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub decisions: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_decision: Option<Decision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_decision_at: Option<DateTime<Utc>>,
    /// Controller device, `None` in log-only mode
    pub serial_device: Option<String>,
    pub location: Location,
}

pub type SharedStatus = Arc<RwLock<MonitorStatus>>;

pub fn shared_status(serial_device: Option<String>) -> SharedStatus {
    Arc::new(RwLock::new(MonitorStatus {
        serial_device,
        ..Default::default()
    }))
}
