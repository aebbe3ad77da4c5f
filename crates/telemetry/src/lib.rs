//! Controller Telemetry
//!
//! Parses GPS reports arriving on the controller serial link and keeps the
//! last-known location that audit events are tagged with.

mod geo;
mod location;
mod parser;
mod reader;

pub use geo::{place_from_response, resolver_from_config, GeoConfig, GeoResolver, NominatimResolver, NoopResolver};
pub use location::{GpsFix, Location, LocationCell};
pub use parser::{GpsReading, TelemetryConfig, TelemetryLine, TelemetryParser};
pub use reader::TelemetryTask;

use thiserror::Error;

/// Errors parsing a location report
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TelemetryError {
    #[error("Missing {0} field in location report")]
    MissingField(&'static str),

    #[error("Invalid {field} value {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} value {value} is out of range")]
    OutOfRange { field: &'static str, value: f64 },
}
