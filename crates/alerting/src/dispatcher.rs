//! Alert dispatcher
//!
//! Turns state machine decisions into a controller command and an audit
//! event tagged with the last-known location, then holds off further frames
//! for a cooldown period.

use dms::Decision;
use metrics::counter;
use serde::{Deserialize, Serialize};
use serial_link::{SerialCommand, SerialLink, TransportError};
use std::time::Duration;
use storage::{AlertType, AuditEvent, AuditLogger, EventType};
use telemetry::{Location, LocationCell};
use tracing::{debug, info, warn};

use crate::cooldown::CooldownGate;

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Frames are not processed for this long after a dispatch (milliseconds)
    pub cooldown_ms: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { cooldown_ms: 2000 }
    }
}

/// Command byte for a decision
pub fn command_for(decision: Decision) -> SerialCommand {
    match decision {
        Decision::Sleep | Decision::Drowsy => SerialCommand::Alert,
        Decision::Active => SerialCommand::AllClear,
    }
}

/// Audit event for a decision at the given location
pub fn event_for(decision: Decision, location: &Location) -> AuditEvent {
    let (event_type, alert_type, status) = match decision {
        Decision::Sleep => (EventType::DrowsinessAlert, AlertType::Critical, "Driver is sleeping"),
        Decision::Drowsy => (EventType::DrowsinessWarning, AlertType::Warning, "Driver is drowsy"),
        Decision::Active => (EventType::StatusUpdate, AlertType::Info, "Driver is alert and active"),
    };
    AuditEvent::new(event_type, alert_type, status).with_location(location.coords(), location.place())
}

fn send_message(decision: Decision) -> &'static str {
    match decision {
        Decision::Sleep => "Driver Sleep !!! (Alert Sent)",
        Decision::Drowsy => "Drowsy Alert !!! (Alert Sent)",
        Decision::Active => "All OK ! (Safe Driving)",
    }
}

/// What happened during one dispatch
#[derive(Debug)]
pub struct DispatchReport {
    pub decision: Decision,
    pub command: SerialCommand,
    pub event: AuditEvent,
    /// Outcome of the serial write
    pub transport: Result<(), TransportError>,
    /// Whether the audit event reached the store
    pub persisted: bool,
}

/// Dispatches decisions to the controller and the audit trail
pub struct AlertDispatcher {
    link: SerialLink,
    location: LocationCell,
    logger: AuditLogger,
    cooldown: CooldownGate,
}

impl AlertDispatcher {
    pub fn new(config: &AlertConfig, link: SerialLink, location: LocationCell, logger: AuditLogger) -> Self {
        info!(
            "Creating alert dispatcher (cooldown {}ms, serial {})",
            config.cooldown_ms,
            link.device().unwrap_or("unavailable")
        );
        Self {
            link,
            location,
            logger,
            cooldown: CooldownGate::new(Duration::from_millis(config.cooldown_ms)),
        }
    }

    /// Send the command, log the event, and start the cooldown.
    ///
    /// The event is logged even when the serial link is down.
    pub async fn dispatch(&mut self, decision: Decision) -> DispatchReport {
        let command = command_for(decision);

        let transport = self.link.send(command).await;
        match &transport {
            Ok(()) => info!("[SEND] {}", send_message(decision)),
            Err(TransportError::Unavailable) => {
                debug!("Serial unavailable, {:?} not sent", command)
            }
            Err(e) => warn!("Failed to send {:?}: {}", command, e),
        }

        let event = event_for(decision, &self.location.snapshot());
        let persisted = self.logger.log(&event).await;

        counter!("monitor_decisions_total", "kind" => decision.as_str()).increment(1);
        self.cooldown.engage();

        DispatchReport {
            decision,
            command,
            event,
            transport,
            persisted,
        }
    }

    /// Frames must be dropped while this is true
    pub fn is_cooling_down(&self) -> bool {
        self.cooldown.is_active()
    }

    pub fn cooldown_remaining(&self) -> Duration {
        self.cooldown.remaining()
    }

    pub fn link(&self) -> &SerialLink {
        &self.link
    }

    pub fn logger(&self) -> &AuditLogger {
        &self.logger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use storage::MemoryEventStore;
    use telemetry::GpsFix;
    use tokio::io::{duplex, AsyncReadExt};

    fn dispatcher(link: SerialLink) -> (AlertDispatcher, LocationCell, Arc<MemoryEventStore>) {
        let store = Arc::new(MemoryEventStore::new());
        let location = LocationCell::new();
        let dispatcher = AlertDispatcher::new(
            &AlertConfig::default(),
            link,
            location.clone(),
            AuditLogger::new(store.clone()),
        );
        (dispatcher, location, store)
    }

    #[test]
    fn test_command_mapping() {
        assert_eq!(command_for(Decision::Sleep).as_byte(), b'a');
        assert_eq!(command_for(Decision::Drowsy).as_byte(), b'a');
        assert_eq!(command_for(Decision::Active).as_byte(), b'b');
    }

    #[test]
    fn test_event_mapping() {
        let sleep = event_for(Decision::Sleep, &Location::Unset);
        assert_eq!(sleep.event_type, EventType::DrowsinessAlert);
        assert_eq!(sleep.alert_type, AlertType::Critical);
        assert_eq!(sleep.driver_status, "Driver is sleeping");
        assert_eq!(sleep.coords, "");
        assert_eq!(sleep.place, "");

        let drowsy = event_for(Decision::Drowsy, &Location::Unset);
        assert_eq!(drowsy.alert_type, AlertType::Warning);

        let active = event_for(Decision::Active, &Location::Unset);
        assert_eq!(active.event_type, EventType::StatusUpdate);
        assert_eq!(active.alert_type, AlertType::Info);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_writes_byte_and_logs() {
        let (port, mut controller) = duplex(16);
        let (link, _reader) = SerialLink::from_stream("test", port, Duration::from_millis(10));
        let (mut dispatcher, location, store) = dispatcher(link);

        location.replace(GpsFix {
            latitude: 12.34,
            longitude: 56.78,
            observed_at: Utc::now(),
            place_name: Some("Harbour Road".into()),
        });

        let report = dispatcher.dispatch(Decision::Drowsy).await;
        assert!(report.transport.is_ok());
        assert!(report.persisted);

        let mut byte = [0u8; 1];
        controller.read_exact(&mut byte).await.unwrap();
        assert_eq!(byte[0], b'a');

        let events = store.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].coords, "12.34, 56.78");
        assert_eq!(events[0].place, "Harbour Road");
    }

    #[tokio::test(start_paused = true)]
    async fn test_log_only_mode_still_logs() {
        let (mut dispatcher, _location, store) = dispatcher(SerialLink::disconnected());

        let report = dispatcher.dispatch(Decision::Sleep).await;
        assert!(matches!(report.transport, Err(TransportError::Unavailable)));
        assert!(report.persisted);
        assert_eq!(store.len(), 1);
        assert_eq!(store.events()[0].coords, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_controller_still_logs() {
        // Controller end is held open but never drained
        let (port, _controller) = duplex(1);
        let (link, _reader) = SerialLink::from_stream("test", port, Duration::from_millis(10));
        let (mut dispatcher, _location, store) = dispatcher(link);

        let first = dispatcher.dispatch(Decision::Sleep).await;
        assert!(first.transport.is_ok());

        let second = dispatcher.dispatch(Decision::Sleep).await;
        assert!(matches!(second.transport, Err(TransportError::WriteTimeout(_))));
        assert!(second.persisted);

        let events = store.events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.alert_type == AlertType::Critical));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_after_dispatch() {
        let (mut dispatcher, _location, _store) = dispatcher(SerialLink::disconnected());
        assert!(!dispatcher.is_cooling_down());

        dispatcher.dispatch(Decision::Active).await;
        assert!(dispatcher.is_cooling_down());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!dispatcher.is_cooling_down());
    }
}
