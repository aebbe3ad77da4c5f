//! Driver alertness tracking with hysteresis counters

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{Decision, StepOutcome};
use crate::blink::FrameSignal;
use crate::config::{DmsConfig, RepeatPolicy};

/// Alertness classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlertnessState {
    #[default]
    Active,
    Drowsy,
    Sleeping,
}

impl AlertnessState {
    /// Short status text for operator display
    pub fn label(&self) -> &'static str {
        match self {
            AlertnessState::Active => "Active :)",
            AlertnessState::Drowsy => "Drowsy !",
            AlertnessState::Sleeping => "SLEEPING !!!",
        }
    }
}

/// Streak counters; at most one is non-zero after any frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HysteresisCounters {
    pub sleep: u32,
    pub drowsy: u32,
    pub active: u32,
}

impl HysteresisCounters {
    pub fn non_zero(&self) -> usize {
        [self.sleep, self.drowsy, self.active]
            .iter()
            .filter(|&&c| c > 0)
            .count()
    }
}

/// Turns per-frame closure signals into a stable alertness classification
#[derive(Debug, Clone)]
pub struct AlertnessStateMachine {
    threshold: u32,
    active_interval: u32,
    policy: RepeatPolicy,
    counters: HysteresisCounters,
    state: AlertnessState,
}

impl AlertnessStateMachine {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            threshold: config.frame_threshold,
            active_interval: config.active_signal_interval.max(1),
            policy: config.repeat_policy,
            counters: HysteresisCounters::default(),
            state: AlertnessState::default(),
        }
    }

    pub fn state(&self) -> AlertnessState {
        self.state
    }

    pub fn counters(&self) -> HysteresisCounters {
        self.counters
    }

    /// Feed one frame. The more severe reading wins when the eyes disagree.
    pub fn step(&mut self, signal: FrameSignal) -> StepOutcome {
        let previous = self.state;
        let c = &mut self.counters;

        let decision = if signal.any_closed() {
            c.drowsy = 0;
            c.active = 0;
            c.sleep = c.sleep.saturating_add(1);
            (c.sleep > self.threshold).then(|| {
                self.state = AlertnessState::Sleeping;
                Decision::Sleep
            })
        } else if signal.any_ambiguous() {
            c.sleep = 0;
            c.active = 0;
            c.drowsy = c.drowsy.saturating_add(1);
            (c.drowsy > self.threshold).then(|| {
                self.state = AlertnessState::Drowsy;
                Decision::Drowsy
            })
        } else {
            c.sleep = 0;
            c.drowsy = 0;
            c.active = c.active.saturating_add(1);
            if c.active > self.threshold {
                self.state = AlertnessState::Active;
                match self.policy {
                    RepeatPolicy::EveryFrame => {
                        (c.active % self.active_interval == 0).then_some(Decision::Active)
                    }
                    RepeatPolicy::OnTransition => Some(Decision::Active),
                }
            } else {
                None
            }
        };

        let decision = match self.policy {
            RepeatPolicy::EveryFrame => decision,
            RepeatPolicy::OnTransition => decision.filter(|_| self.state != previous),
        };

        if self.state != previous {
            debug!("Alertness state {:?} -> {:?}", previous, self.state);
        }

        StepOutcome {
            state: self.state,
            counters: self.counters,
            decision,
        }
    }

    /// Reset counters and state (session start)
    pub fn reset(&mut self) {
        self.counters = HysteresisCounters::default();
        self.state = AlertnessState::default();
    }
}

impl Default for AlertnessStateMachine {
    fn default() -> Self {
        Self::new(&DmsConfig::default())
    }
}
