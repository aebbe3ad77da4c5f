//! Monitor configuration
//!
//! Layered from an optional TOML file and `MONITOR__SECTION__KEY`
//! environment variables. Every section has defaults, so an empty
//! configuration is a valid one.

use alerting::AlertConfig;
use config::{Config, Environment, File};
use dms::DmsConfig;
use serde::{Deserialize, Serialize};
use serial_link::SerialConfig;
use std::path::PathBuf;
use telemetry::{GeoConfig, TelemetryConfig};

use crate::MonitorError;

/// Config file read when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "monitor.toml";

/// Accepted replay rates, besides 0 for unpaced
const MIN_REPLAY_FPS: f64 = 0.01;
const MAX_REPLAY_FPS: f64 = 1000.0;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub logging: LoggingConfig,
    pub serial: SerialConfig,
    pub dms: DmsConfig,
    pub alerting: AlertConfig,
    pub telemetry: TelemetryConfig,
    pub geo: GeoConfig,
    pub storage: StorageConfig,
    pub source: SourceConfig,
    pub api: ApiConfig,
    pub metrics: MetricsConfig,
}

impl MonitorConfig {
    /// Load from `path` (skipped if missing) and the environment
    pub fn load(path: &str) -> Result<Self, MonitorError> {
        let config: MonitorConfig = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("MONITOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document (no environment overrides)
    pub fn from_toml(text: &str) -> Result<Self, MonitorError> {
        let config: MonitorConfig = Config::builder()
            .add_source(File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        self.dms.validate()?;
        let fps = self.source.fps;
        if fps != 0.0 && !(MIN_REPLAY_FPS..=MAX_REPLAY_FPS).contains(&fps) {
            return Err(MonitorError::Config(format!(
                "source.fps must be 0 or between {} and {}, got {}",
                MIN_REPLAY_FPS, MAX_REPLAY_FPS, fps
            )));
        }
        Ok(())
    }
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Audit store selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite URL; the in-memory store is used when unset or unreachable
    pub url: Option<String>,
    /// Retention of the in-memory store
    pub memory_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: Some("sqlite://driver_events.db".to_string()),
            memory_capacity: 10_000,
        }
    }
}

/// Landmark input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON-lines recording to replay; standard input when unset
    pub path: Option<PathBuf>,
    /// Replay pace in frames per second, 0 for as fast as possible
    pub fps: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: None,
            fps: 30.0,
        }
    }
}

/// Status API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Listen address, e.g. "0.0.0.0:8080"; disabled when unset
    pub bind: Option<String>,
}

/// Prometheus exporter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Listen address for the scrape endpoint; disabled when unset
    pub listen: Option<String>,
}
