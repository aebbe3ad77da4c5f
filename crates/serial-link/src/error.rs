//! Serial Link Error Types

use thiserror::Error;

/// Errors that can occur on the controller serial link
#[derive(Debug, Error)]
pub enum TransportError {
    /// No serial port is attached (log-only mode)
    #[error("Serial link unavailable")]
    Unavailable,

    /// No serial ports found during discovery
    #[error("No serial ports found")]
    NoPorts,

    /// Port could not be opened
    #[error("Failed to open serial port {device}: {reason}")]
    Open { device: String, reason: String },

    /// Writing a command failed
    #[error("Serial write failed: {0}")]
    Write(String),

    /// The controller did not accept a command in time
    #[error("Serial write timed out after {0:?}")]
    WriteTimeout(std::time::Duration),

    /// Reading from the port failed
    #[error("Serial read failed: {0}")]
    Read(String),
}

impl From<tokio_serial::Error> for TransportError {
    fn from(err: tokio_serial::Error) -> Self {
        TransportError::Open {
            device: String::from("<discovery>"),
            reason: err.to_string(),
        }
    }
}
