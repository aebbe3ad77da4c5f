//! DMS configuration

use serde::{Deserialize, Serialize};

/// How often a decision is re-emitted while its counter stays above threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// Emit on every qualifying frame above threshold
    #[default]
    EveryFrame,
    /// Emit only when the alertness state changes
    OnTransition,
}

/// DMS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Eye aspect ratio above which an eye is open
    pub open_ratio: f64,

    /// Eye aspect ratio at or below which an eye is closed
    pub closed_ratio: f64,

    /// Consecutive frames a counter must exceed before a decision fires
    pub frame_threshold: u32,

    /// Active decisions are only emitted when the active streak is a multiple of this
    pub active_signal_interval: u32,

    /// Repeat policy for decisions above threshold
    pub repeat_policy: RepeatPolicy,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            open_ratio: 0.25,
            closed_ratio: 0.21,
            frame_threshold: 6,
            active_signal_interval: 10,
            repeat_policy: RepeatPolicy::EveryFrame,
        }
    }
}

impl DmsConfig {
    /// Create edge-triggered config (one decision per state change)
    pub fn edge_triggered() -> Self {
        Self {
            repeat_policy: RepeatPolicy::OnTransition,
            ..Default::default()
        }
    }

    /// Check that the thresholds describe a usable classifier
    pub fn validate(&self) -> Result<(), crate::DmsError> {
        if !(self.closed_ratio < self.open_ratio) {
            return Err(crate::DmsError::Config(format!(
                "closed_ratio {} must be below open_ratio {}",
                self.closed_ratio, self.open_ratio
            )));
        }
        if self.active_signal_interval == 0 {
            return Err(crate::DmsError::Config(
                "active_signal_interval must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
