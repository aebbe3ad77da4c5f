//! Last-known location shared between the telemetry reader and the dispatcher

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// A GPS fix as received from the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
    pub observed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
}

impl GpsFix {
    /// Coordinates as stored in audit events ("lat, lng")
    pub fn coords(&self) -> String {
        format!("{}, {}", self.latitude, self.longitude)
    }
}

/// Last-known location; `Unset` until the first fix arrives
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Location {
    #[default]
    Unset,
    Known(GpsFix),
}

impl Location {
    pub fn fix(&self) -> Option<&GpsFix> {
        match self {
            Location::Unset => None,
            Location::Known(fix) => Some(fix),
        }
    }

    /// Coordinates text, empty when no fix is known
    pub fn coords(&self) -> String {
        self.fix().map(GpsFix::coords).unwrap_or_default()
    }

    /// Place name, empty when unknown or unresolved
    pub fn place(&self) -> String {
        self.fix()
            .and_then(|f| f.place_name.clone())
            .unwrap_or_default()
    }
}

/// Thread-safe single slot holding the last-known location.
///
/// Writers replace the whole value and readers take a whole snapshot, so a
/// coordinate pair is never observed half-updated.
#[derive(Debug, Clone, Default)]
pub struct LocationCell {
    inner: Arc<RwLock<Location>>,
}

impl LocationCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Location {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn replace(&self, fix: GpsFix) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Location::Known(fix);
    }

    pub fn is_known(&self) -> bool {
        matches!(self.snapshot(), Location::Known(_))
    }
}
