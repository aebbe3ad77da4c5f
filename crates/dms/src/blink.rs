//! Eye closure classification from eye aspect ratio

use serde::{Deserialize, Serialize};

use crate::landmarks::{EyePoints, FaceLandmarks};
use crate::{DmsConfig, DmsError};

/// Ternary closure signal for one eye in one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EyeClosure {
    Open,
    /// Ratio in the indeterminate band between open and closed
    Ambiguous,
    Closed,
}

/// Closure signals of both eyes for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSignal {
    pub left: EyeClosure,
    pub right: EyeClosure,
}

impl FrameSignal {
    pub const fn new(left: EyeClosure, right: EyeClosure) -> Self {
        Self { left, right }
    }

    /// At least one eye closed
    pub fn any_closed(&self) -> bool {
        self.left == EyeClosure::Closed || self.right == EyeClosure::Closed
    }

    /// At least one eye in the ambiguous band
    pub fn any_ambiguous(&self) -> bool {
        self.left == EyeClosure::Ambiguous || self.right == EyeClosure::Ambiguous
    }
}

/// Eye aspect ratio: lid opening relative to eye width
///
/// `(|p2 - p6| + |p3 - p5|) / (2 * |p1 - p4|)` over the six eye landmarks.
pub fn eye_aspect_ratio(eye: &EyePoints) -> Result<f64, DmsError> {
    let [p1, p2, p3, p4, p5, p6] = eye;
    let vertical = p2.distance(p6) + p3.distance(p5);
    let horizontal = p1.distance(p4);

    if horizontal == 0.0 || !horizontal.is_finite() || !vertical.is_finite() {
        return Err(DmsError::DegenerateEye);
    }

    Ok(vertical / (2.0 * horizontal))
}

/// Classifies eyes as open, ambiguous, or closed
#[derive(Debug, Clone, Copy)]
pub struct BlinkClassifier {
    open_ratio: f64,
    closed_ratio: f64,
}

impl BlinkClassifier {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            open_ratio: config.open_ratio,
            closed_ratio: config.closed_ratio,
        }
    }

    /// Map a ratio onto the closure bands
    pub fn classify_ratio(&self, ratio: f64) -> EyeClosure {
        if ratio > self.open_ratio {
            EyeClosure::Open
        } else if ratio > self.closed_ratio {
            EyeClosure::Ambiguous
        } else {
            EyeClosure::Closed
        }
    }

    pub fn classify_eye(&self, eye: &EyePoints) -> Result<EyeClosure, DmsError> {
        eye_aspect_ratio(eye).map(|ratio| self.classify_ratio(ratio))
    }

    /// Classify both eyes of a face. Fails if either eye is degenerate.
    pub fn classify_face(&self, face: &FaceLandmarks) -> Result<FrameSignal, DmsError> {
        Ok(FrameSignal {
            left: self.classify_eye(&face.left_eye())?,
            right: self.classify_eye(&face.right_eye())?,
        })
    }
}

impl Default for BlinkClassifier {
    fn default() -> Self {
        Self::new(&DmsConfig::default())
    }
}
