//! Monitoring session: the per-frame loop
//!
//! Each frame goes through the cooldown gate, the DMS module and, when the
//! state machine emits a decision, the alert dispatcher. The loop ends when
//! the landmark source is exhausted or shutdown is signalled.

use alerting::{AlertConfig, AlertDispatcher, DispatchReport};
use chrono::Utc;
use dms::{DmsAnalysis, DmsConfig, DmsError, DmsModule, LandmarkFrame, LandmarkSource};
use metrics::counter;
use serial_link::SerialLink;
use storage::AuditLogger;
use telemetry::LocationCell;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::status::SharedStatus;

/// What became of one frame
#[derive(Debug)]
pub enum FrameOutcome {
    /// Dropped while the post-dispatch cooldown is running
    Cooldown,
    /// No face in view, counters untouched
    NoFace,
    /// Landmarks could not be evaluated
    Skipped(DmsError),
    /// Evaluated, with the dispatch report if a decision fired
    Classified {
        analysis: DmsAnalysis,
        report: Option<DispatchReport>,
    },
}

/// Totals reported when a session ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames: u64,
    pub classified: u64,
    pub decisions: u64,
}

pub struct MonitorSession {
    dms: DmsModule,
    dispatcher: AlertDispatcher,
    logger: AuditLogger,
    location: LocationCell,
    status: SharedStatus,
}

impl MonitorSession {
    pub fn new(
        dms_config: &DmsConfig,
        alert_config: &AlertConfig,
        link: SerialLink,
        location: LocationCell,
        logger: AuditLogger,
        status: SharedStatus,
    ) -> Result<Self, DmsError> {
        let dms = DmsModule::new(dms_config)?;
        let dispatcher = AlertDispatcher::new(alert_config, link, location.clone(), logger.clone());
        Ok(Self {
            dms,
            dispatcher,
            logger,
            location,
            status,
        })
    }

    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    /// Run one frame through the pipeline
    pub async fn process_frame(&mut self, frame: &LandmarkFrame) -> FrameOutcome {
        if self.dispatcher.is_cooling_down() {
            counter!("monitor_frames_skipped_total", "reason" => "cooldown").increment(1);
            self.status.write().await.frames_skipped += 1;
            return FrameOutcome::Cooldown;
        }

        counter!("monitor_frames_total").increment(1);

        let analysis = match self.dms.analyze(frame) {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("Skipping frame: {}", e);
                counter!("monitor_frames_skipped_total", "reason" => "invalid").increment(1);
                self.status.write().await.frames_skipped += 1;
                return FrameOutcome::Skipped(e);
            }
        };

        if !analysis.face_detected {
            self.status.write().await.frames_processed += 1;
            return FrameOutcome::NoFace;
        }

        let report = match analysis.decision {
            Some(decision) => Some(self.dispatcher.dispatch(decision).await),
            None => None,
        };

        {
            let mut status = self.status.write().await;
            status.frames_processed += 1;
            status.state = analysis.state;
            status.counters = analysis.counters;
            status.location = self.location.snapshot();
            if let Some(report) = &report {
                status.decisions += 1;
                status.last_decision = Some(report.decision);
                status.last_decision_at = Some(Utc::now());
            }
        }

        FrameOutcome::Classified { analysis, report }
    }

    /// Process frames until the source ends or `shutdown` turns true.
    ///
    /// Writes the startup and shutdown audit events around the loop.
    pub async fn run<S>(&mut self, source: &mut S, mut shutdown: watch::Receiver<bool>) -> SessionSummary
    where
        S: LandmarkSource + ?Sized,
    {
        let serial_mode = match self.dispatcher.link().device() {
            Some(device) => format!("serial: {}", device),
            None => "serial: unavailable (log-only)".to_string(),
        };
        self.dms.reset_state();
        info!("Monitoring session started ({})", serial_mode);
        self.logger.log_system("Application started", &serial_mode).await;

        let mut summary = SessionSummary::default();

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        debug!("Shutdown sender dropped");
                        break;
                    }
                }
                frame = source.next_frame() => {
                    let Some(frame) = frame else {
                        info!("Landmark source exhausted");
                        break;
                    };

                    summary.frames += 1;
                    if let FrameOutcome::Classified { report, .. } = self.process_frame(&frame).await {
                        summary.classified += 1;
                        if report.is_some() {
                            summary.decisions += 1;
                        }
                    }
                }
            }
        }

        self.logger.log_system("Application shutdown", "").await;
        info!(
            "Monitoring session ended: {} frames, {} classified, {} decisions",
            summary.frames, summary.classified, summary.decisions
        );
        summary
    }
}
