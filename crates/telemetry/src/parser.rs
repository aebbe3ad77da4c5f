//! Parser for inbound controller lines

use serde::{Deserialize, Serialize};

use crate::TelemetryError;

const LAT_TAG: &str = "Lat:";
const LNG_TAG: &str = ", Lng:";

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Substring identifying a location report
    pub marker: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            marker: "GPS Location".to_string(),
        }
    }
}

/// Raw coordinates parsed from a location report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsReading {
    pub latitude: f64,
    pub longitude: f64,
}

/// Classified inbound line
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryLine {
    /// A location report
    Location(GpsReading),
    /// Anything else, passed through for logging
    Passthrough(String),
}

/// Extracts GPS readings from `"... Lat:<value>, Lng:<value>"` lines
#[derive(Debug, Clone)]
pub struct TelemetryParser {
    marker: String,
}

impl TelemetryParser {
    pub fn new(config: &TelemetryConfig) -> Self {
        Self {
            marker: config.marker.clone(),
        }
    }

    /// Classify a line. Only lines carrying the marker can fail.
    pub fn parse(&self, line: &str) -> Result<TelemetryLine, TelemetryError> {
        if !line.contains(&self.marker) {
            return Ok(TelemetryLine::Passthrough(line.to_string()));
        }
        parse_coordinates(line).map(TelemetryLine::Location)
    }
}

impl Default for TelemetryParser {
    fn default() -> Self {
        Self::new(&TelemetryConfig::default())
    }
}

fn parse_coordinates(line: &str) -> Result<GpsReading, TelemetryError> {
    let (_, rest) = line
        .split_once(LAT_TAG)
        .ok_or(TelemetryError::MissingField("Lat"))?;
    let (lat, lng) = rest
        .split_once(LNG_TAG)
        .ok_or(TelemetryError::MissingField("Lng"))?;

    let latitude = parse_value("latitude", lat, 90.0)?;
    let longitude = parse_value("longitude", lng, 180.0)?;

    Ok(GpsReading {
        latitude,
        longitude,
    })
}

fn parse_value(field: &'static str, raw: &str, limit: f64) -> Result<f64, TelemetryError> {
    let raw = raw.trim();
    let value: f64 = raw.parse().map_err(|_| TelemetryError::InvalidNumber {
        field,
        value: raw.to_string(),
    })?;

    if !value.is_finite() || value.abs() > limit {
        return Err(TelemetryError::OutOfRange { field, value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_location_report() {
        let parser = TelemetryParser::default();
        let line = parser.parse("GPS Location -> Lat: 12.34, Lng: 56.78").unwrap();
        assert_eq!(
            line,
            TelemetryLine::Location(GpsReading {
                latitude: 12.34,
                longitude: 56.78
            })
        );
    }

    #[test]
    fn test_no_space_after_tags() {
        let parser = TelemetryParser::default();
        let line = parser.parse("GPS Location Lat:-33.8688, Lng:151.2093").unwrap();
        assert!(matches!(
            line,
            TelemetryLine::Location(GpsReading { latitude, longitude })
                if latitude == -33.8688 && longitude == 151.2093
        ));
    }

    #[test]
    fn test_passthrough() {
        let parser = TelemetryParser::default();
        assert_eq!(
            parser.parse("no marker here").unwrap(),
            TelemetryLine::Passthrough("no marker here".into())
        );
        // coordinates without the marker are not a location report
        assert!(matches!(
            parser.parse("Lat: 1.0, Lng: 2.0").unwrap(),
            TelemetryLine::Passthrough(_)
        ));
    }

    #[test]
    fn test_missing_fields() {
        let parser = TelemetryParser::default();
        assert!(matches!(
            parser.parse("GPS Location: no fix"),
            Err(TelemetryError::MissingField("Lat"))
        ));
        assert!(matches!(
            parser.parse("GPS Location: Lat: 1.0 Lng: 2.0"),
            Err(TelemetryError::MissingField("Lng"))
        ));
    }

    #[test]
    fn test_malformed_numbers() {
        let parser = TelemetryParser::default();
        assert!(matches!(
            parser.parse("GPS Location: Lat: abc, Lng: 2.0"),
            Err(TelemetryError::InvalidNumber { field: "latitude", .. })
        ));
        assert!(matches!(
            parser.parse("GPS Location: Lat: 1.0, Lng: "),
            Err(TelemetryError::InvalidNumber { field: "longitude", .. })
        ));
        assert!(matches!(
            parser.parse("GPS Location: Lat: NaN, Lng: 2.0"),
            Err(TelemetryError::OutOfRange { .. })
        ));
        assert!(matches!(
            parser.parse("GPS Location: Lat: 91.0, Lng: 2.0"),
            Err(TelemetryError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_custom_marker() {
        let parser = TelemetryParser::new(&TelemetryConfig {
            marker: "$FIX".into(),
        });
        assert!(matches!(
            parser.parse("$FIX Lat: 1, Lng: 2").unwrap(),
            TelemetryLine::Location(_)
        ));
        assert!(matches!(
            parser.parse("GPS Location Lat: 1, Lng: 2").unwrap(),
            TelemetryLine::Passthrough(_)
        ));
    }

    proptest! {
        #[test]
        fn prop_formatted_coordinates_parse_back(lat in -90.0f64..90.0, lng in -180.0f64..180.0) {
            let parser = TelemetryParser::default();
            let line = format!("GPS Location: Lat: {}, Lng: {}", lat, lng);
            prop_assert_eq!(
                parser.parse(&line).unwrap(),
                TelemetryLine::Location(GpsReading { latitude: lat, longitude: lng })
            );
        }

        #[test]
        fn prop_unmarked_lines_pass_through(line in "[a-z0-9 ,:.]{0,40}") {
            let parser = TelemetryParser::default();
            prop_assert_eq!(parser.parse(&line).unwrap(), TelemetryLine::Passthrough(line.clone()));
        }
    }
}
