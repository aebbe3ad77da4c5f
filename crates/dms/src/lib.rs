//! Driver Monitoring System (DMS)
//!
//! Real-time driver alertness analysis from facial landmarks:
//! - Eye aspect ratio classification (open / ambiguous / closed)
//! - Hysteresis counters turning noisy frames into a stable state
//! - Sleep, drowsy, and periodic all-clear decisions

pub mod analysis;
pub mod blink;
pub mod config;
pub mod landmarks;
pub mod source;
pub mod state;

pub use analysis::{Decision, DmsAnalysis, StepOutcome};
pub use blink::{eye_aspect_ratio, BlinkClassifier, EyeClosure, FrameSignal};
pub use config::{DmsConfig, RepeatPolicy};
pub use landmarks::{FaceLandmarks, LandmarkFrame, Point};
pub use source::{ChannelSource, LandmarkSource};
pub use state::{AlertnessState, AlertnessStateMachine, HysteresisCounters};

use thiserror::Error;

/// DMS error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DmsError {
    /// Eye corners coincide, the aspect ratio is undefined
    #[error("Degenerate eye geometry: zero horizontal span")]
    DegenerateEye,

    #[error("Expected 68 face landmarks, got {0}")]
    LandmarkCount(usize),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Driver monitoring module
pub struct DmsModule {
    classifier: BlinkClassifier,
    machine: AlertnessStateMachine,
}

impl DmsModule {
    /// Create a new DMS module with configuration
    pub fn new(config: &DmsConfig) -> Result<Self, DmsError> {
        config.validate()?;
        Ok(Self {
            classifier: BlinkClassifier::new(config),
            machine: AlertnessStateMachine::new(config),
        })
    }

    /// Analyze a single frame for driver state.
    ///
    /// Frames without a face leave the counters untouched. Degenerate eye
    /// geometry is returned as an error and the frame must be skipped.
    pub fn analyze(&mut self, frame: &LandmarkFrame) -> Result<DmsAnalysis, DmsError> {
        let Some(face) = frame.primary_face() else {
            return Ok(DmsAnalysis {
                face_detected: false,
                signal: None,
                state: self.machine.state(),
                counters: self.machine.counters(),
                decision: None,
            });
        };

        let signal = self.classifier.classify_face(face)?;
        let outcome = self.machine.step(signal);

        Ok(DmsAnalysis {
            face_detected: true,
            signal: Some(signal),
            state: outcome.state,
            counters: outcome.counters,
            decision: outcome.decision,
        })
    }

    pub fn state(&self) -> AlertnessState {
        self.machine.state()
    }

    pub fn counters(&self) -> HysteresisCounters {
        self.machine.counters()
    }

    /// Reset driver state (on session start)
    pub fn reset_state(&mut self) {
        self.machine.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_with_gap(gap: f64) -> FaceLandmarks {
        let mut points = vec![Point::default(); landmarks::LANDMARK_COUNT];
        for base in [36, 42] {
            let x0 = base as f64;
            points[base] = Point::new(x0, 0.0);
            points[base + 1] = Point::new(x0 + 0.3, gap / 2.0);
            points[base + 2] = Point::new(x0 + 0.7, gap / 2.0);
            points[base + 3] = Point::new(x0 + 1.0, 0.0);
            points[base + 4] = Point::new(x0 + 0.7, -gap / 2.0);
            points[base + 5] = Point::new(x0 + 0.3, -gap / 2.0);
        }
        FaceLandmarks::new(points).unwrap()
    }

    #[test]
    fn test_no_face_leaves_counters() {
        let mut dms = DmsModule::new(&DmsConfig::default()).unwrap();
        dms.analyze(&LandmarkFrame::single(face_with_gap(0.1))).unwrap();

        let analysis = dms.analyze(&LandmarkFrame::empty()).unwrap();
        assert!(!analysis.face_detected);
        assert_eq!(analysis.counters.sleep, 1);
    }

    #[test]
    fn test_closed_eyes_reach_sleep() {
        let mut dms = DmsModule::new(&DmsConfig::default()).unwrap();
        let frame = LandmarkFrame::single(face_with_gap(0.1));
        let decisions: Vec<_> = (0..7)
            .map(|_| dms.analyze(&frame).unwrap().decision)
            .collect();
        assert_eq!(decisions[6], Some(Decision::Sleep));
        assert!(decisions[..6].iter().all(Option::is_none));
        assert_eq!(dms.state(), AlertnessState::Sleeping);
    }

    #[test]
    fn test_degenerate_frame_is_an_error() {
        let mut dms = DmsModule::new(&DmsConfig::default()).unwrap();
        let face = FaceLandmarks::new(vec![Point::default(); landmarks::LANDMARK_COUNT]).unwrap();
        let err = dms.analyze(&LandmarkFrame::single(face)).unwrap_err();
        assert_eq!(err, DmsError::DegenerateEye);
        assert_eq!(dms.counters(), HysteresisCounters::default());
    }

    #[test]
    fn test_invalid_config() {
        let config = DmsConfig {
            closed_ratio: 0.5,
            ..Default::default()
        };
        assert!(DmsModule::new(&config).is_err());
    }
}
