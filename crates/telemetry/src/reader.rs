//! Telemetry reader task
//!
//! Consumes inbound controller lines, updates the last-known location, and
//! logs everything else. Runs independently of the frame loop so GPS fixes
//! keep arriving while alert dispatch is cooling down.

use chrono::Utc;
use metrics::counter;
use serial_link::{LinePoll, LineReader};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::geo::GeoResolver;
use crate::location::{GpsFix, LocationCell};
use crate::parser::{TelemetryLine, TelemetryParser};
use crate::TelemetryError;

/// Back-off after a failed serial read
const READ_ERROR_BACKOFF_MS: u64 = 500;

/// Turns inbound lines into location updates
pub struct TelemetryTask {
    parser: TelemetryParser,
    resolver: Arc<dyn GeoResolver>,
    location: LocationCell,
}

impl TelemetryTask {
    pub fn new(
        parser: TelemetryParser,
        resolver: Arc<dyn GeoResolver>,
        location: LocationCell,
    ) -> Self {
        Self {
            parser,
            resolver,
            location,
        }
    }

    /// Process one inbound line.
    ///
    /// Returns the stored fix for location reports, `None` for pass-through
    /// lines. On error the location is left untouched.
    pub async fn handle_line(&self, line: &str) -> Result<Option<GpsFix>, TelemetryError> {
        match self.parser.parse(line)? {
            TelemetryLine::Passthrough(text) => {
                info!("[RECV] {}", text);
                Ok(None)
            }
            TelemetryLine::Location(reading) => {
                let place_name = self
                    .resolver
                    .resolve(reading.latitude, reading.longitude)
                    .await;

                let fix = GpsFix {
                    latitude: reading.latitude,
                    longitude: reading.longitude,
                    observed_at: Utc::now(),
                    place_name,
                };

                info!(
                    "[GPS] Lat: {}, Lng: {} | Place: {}",
                    fix.latitude,
                    fix.longitude,
                    fix.place_name.as_deref().unwrap_or("Not found")
                );

                self.location.replace(fix.clone());
                counter!("telemetry_fixes_total").increment(1);
                Ok(Some(fix))
            }
        }
    }

    /// Read lines until shutdown is signalled or the port closes
    pub async fn run(self, mut reader: LineReader, shutdown: watch::Receiver<bool>) {
        info!("Starting telemetry reader");

        while !*shutdown.borrow() {
            match reader.poll_line().await {
                Ok(LinePoll::Line(line)) => {
                    if let Err(e) = self.handle_line(&line).await {
                        counter!("telemetry_parse_errors_total").increment(1);
                        warn!("Failed to parse GPS data: {} (line: {:?})", e, line);
                    }
                }
                Ok(LinePoll::Idle) => {}
                Ok(LinePoll::Closed) => {
                    info!("Serial port closed");
                    break;
                }
                Err(e) => {
                    warn!("Telemetry read error: {}", e);
                    tokio::time::sleep(Duration::from_millis(READ_ERROR_BACKOFF_MS)).await;
                }
            }
        }

        debug!("Telemetry reader stopped");
    }

    pub fn spawn(self, reader: LineReader, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(reader, shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::NoopResolver;
    use crate::location::Location;
    use async_trait::async_trait;
    use serial_link::SerialLink;
    use tokio::io::{duplex, AsyncWriteExt};

    struct FixedResolver(&'static str);

    #[async_trait]
    impl GeoResolver for FixedResolver {
        async fn resolve(&self, _latitude: f64, _longitude: f64) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    fn task(resolver: Arc<dyn GeoResolver>) -> (TelemetryTask, LocationCell) {
        let cell = LocationCell::new();
        (
            TelemetryTask::new(TelemetryParser::default(), resolver, cell.clone()),
            cell,
        )
    }

    #[tokio::test]
    async fn test_location_line_updates_cell() {
        let (task, cell) = task(Arc::new(FixedResolver("Kyoto, Japan")));

        let fix = task
            .handle_line("GPS Location: Lat: 12.34, Lng: 56.78")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(fix.place_name.as_deref(), Some("Kyoto, Japan"));
        assert_eq!(cell.snapshot().coords(), "12.34, 56.78");
        assert_eq!(cell.snapshot().place(), "Kyoto, Japan");
    }

    #[tokio::test]
    async fn test_unmarked_line_leaves_cell() {
        let (task, cell) = task(Arc::new(NoopResolver));
        assert_eq!(task.handle_line("no marker here").await.unwrap(), None);
        assert_eq!(cell.snapshot(), Location::Unset);
    }

    #[tokio::test]
    async fn test_parse_error_keeps_previous_fix() {
        let (task, cell) = task(Arc::new(NoopResolver));
        task.handle_line("GPS Location: Lat: 1.5, Lng: 2.5").await.unwrap();

        assert!(task.handle_line("GPS Location: Lat: x, Lng: 2.5").await.is_err());
        assert_eq!(cell.snapshot().coords(), "1.5, 2.5");
    }

    #[tokio::test]
    async fn test_unresolved_place_still_updates_coordinates() {
        let (task, cell) = task(Arc::new(NoopResolver));
        task.handle_line("GPS Location: Lat: -1, Lng: 2").await.unwrap();

        let location = cell.snapshot();
        assert_eq!(location.coords(), "-1, 2");
        assert_eq!(location.fix().unwrap().place_name, None);
    }

    #[tokio::test]
    async fn test_run_until_port_closes() {
        let (task, cell) = task(Arc::new(NoopResolver));
        let (port, mut controller) = duplex(256);
        let (_link, reader) = SerialLink::from_stream("test", port, Duration::from_millis(20));
        let (_tx, rx) = watch::channel(false);

        let handle = task.spawn(reader, rx);
        controller
            .write_all(b"Controller ready\nGPS Location: Lat: 10.5, Lng: 20.25\nGPS Location: bad\n")
            .await
            .unwrap();
        drop(controller);

        handle.await.unwrap();
        assert_eq!(cell.snapshot().coords(), "10.5, 20.25");
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (task, _cell) = task(Arc::new(NoopResolver));
        let (port, _controller) = duplex(64);
        let (_link, reader) = SerialLink::from_stream("test", port, Duration::from_millis(20));
        let (tx, rx) = watch::channel(false);

        let handle = task.spawn(reader, rx);
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("reader did not stop")
            .unwrap();
    }
}
