//! Post-dispatch cooldown

use std::time::Duration;
use tokio::time::Instant;

/// Deadline-based cooldown, checked without blocking
#[derive(Debug, Clone)]
pub struct CooldownGate {
    period: Duration,
    until: Option<Instant>,
}

impl CooldownGate {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            until: None,
        }
    }

    /// Start a fresh cooldown period from now
    pub fn engage(&mut self) {
        self.until = Some(Instant::now() + self.period);
    }

    pub fn is_active(&self) -> bool {
        self.until.is_some_and(|until| Instant::now() < until)
    }

    /// Time left before the gate reopens
    pub fn remaining(&self) -> Duration {
        self.until
            .map(|until| until.saturating_duration_since(Instant::now()))
            .unwrap_or_default()
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}
