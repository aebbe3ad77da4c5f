//! Driver Alertness Monitor
//!
//! Wires landmark input, the DMS state machine, alert dispatch, controller
//! telemetry and the audit trail into one monitoring session, with an
//! optional status API.

use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

pub mod config;
pub mod routes;
pub mod session;
pub mod source;
pub mod status;

pub use config::{MonitorConfig, DEFAULT_CONFIG_PATH};
pub use routes::{create_router, AppState};
pub use session::{FrameOutcome, MonitorSession, SessionSummary};
pub use source::ReplaySource;
pub use status::{MonitorStatus, SharedStatus};

/// Monitor errors
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Dms(#[from] dms::DmsError),

    #[error("Source error: {0}")]
    Source(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl From<::config::ConfigError> for MonitorError {
    fn from(err: ::config::ConfigError) -> Self {
        MonitorError::Config(err.to_string())
    }
}

/// Initialize logging.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &config::LoggingConfig) -> Result<(), MonitorError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| MonitorError::Logging(e.to_string()))?;

    let builder = fmt().with_env_filter(filter).with_target(true);
    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| MonitorError::Logging(e.to_string()))
}
