//! Audit event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of an audit event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "Drowsiness Alert")]
    DrowsinessAlert,
    #[serde(rename = "Drowsiness Warning")]
    DrowsinessWarning,
    #[serde(rename = "Status Update")]
    StatusUpdate,
    System,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::DrowsinessAlert => "Drowsiness Alert",
            EventType::DrowsinessWarning => "Drowsiness Warning",
            EventType::StatusUpdate => "Status Update",
            EventType::System => "System",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [
            EventType::DrowsinessAlert,
            EventType::DrowsinessWarning,
            EventType::StatusUpdate,
            EventType::System,
        ]
        .into_iter()
        .find(|t| t.as_str() == s)
    }
}

/// Severity of an audit event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertType {
    Critical,
    Warning,
    Info,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Critical => "Critical",
            AlertType::Warning => "Warning",
            AlertType::Info => "Info",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Critical" => Some(AlertType::Critical),
            "Warning" => Some(AlertType::Warning),
            "Info" => Some(AlertType::Info),
            _ => None,
        }
    }
}

/// One entry of the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: EventType,
    pub alert_type: AlertType,
    pub driver_status: String,
    /// "lat, lng", empty when no location is known
    pub coords: String,
    /// Place name, empty when unknown
    pub place: String,
    pub notes: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    /// New event stamped now, without location or notes
    pub fn new(event_type: EventType, alert_type: AlertType, driver_status: impl Into<String>) -> Self {
        Self {
            event_type,
            alert_type,
            driver_status: driver_status.into(),
            coords: String::new(),
            place: String::new(),
            notes: String::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_location(mut self, coords: impl Into<String>, place: impl Into<String>) -> Self {
        self.coords = coords.into();
        self.place = place.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// `System / Info` event
    pub fn system(driver_status: impl Into<String>) -> Self {
        Self::new(EventType::System, AlertType::Info, driver_status)
    }

    /// Calendar date column ("YYYY-MM-DD")
    pub fn event_date(&self) -> String {
        self.timestamp.format("%Y-%m-%d").to_string()
    }

    /// Time-of-day column ("HH:MM:SS")
    pub fn event_time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}
