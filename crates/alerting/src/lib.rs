//! Alerting System
//!
//! Maps driver state decisions onto controller commands and audit events,
//! with a cooldown that keeps a slow serial link from being flooded.

mod cooldown;
mod dispatcher;

pub use cooldown::CooldownGate;
pub use dispatcher::{command_for, event_for, AlertConfig, AlertDispatcher, DispatchReport};
