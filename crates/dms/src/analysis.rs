//! DMS analysis results and decisions

use serde::{Deserialize, Serialize};

use crate::blink::FrameSignal;
use crate::state::{AlertnessState, HysteresisCounters};

/// Threshold-crossing decision for downstream dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// Eyes closed beyond threshold
    Sleep,

    /// Eyes half-closed beyond threshold
    Drowsy,

    /// Driver alert (periodic all-clear)
    Active,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Sleep => "sleep",
            Decision::Drowsy => "drowsy",
            Decision::Active => "active",
        }
    }

    /// Alerts that indicate an impaired driver
    pub fn is_alert(&self) -> bool {
        matches!(self, Decision::Sleep | Decision::Drowsy)
    }
}

/// Result of feeding one frame signal to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub state: AlertnessState,
    pub counters: HysteresisCounters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
}

/// Complete DMS analysis of one landmark frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DmsAnalysis {
    /// Whether a face was detected
    pub face_detected: bool,

    /// Per-eye closure (if a face was evaluated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<FrameSignal>,

    /// Current alertness state
    pub state: AlertnessState,

    pub counters: HysteresisCounters,

    /// Decision to dispatch, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
}

impl DmsAnalysis {
    pub fn has_decision(&self) -> bool {
        self.decision.is_some()
    }
}
