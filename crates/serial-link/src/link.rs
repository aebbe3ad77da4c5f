//! Serial link to the alert controller
//!
//! Splits a byte stream into a shared command writer and a line reader.
//! Without a port the link runs in log-only mode and every send reports
//! [`TransportError::Unavailable`].

use crate::command::SerialCommand;
use crate::error::TransportError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

/// Default serial read poll interval
const DEFAULT_READ_TIMEOUT_MS: u64 = 100;

/// Default bound on a single command write
const DEFAULT_WRITE_TIMEOUT_MS: u64 = 500;

/// Longest inbound line accepted, excluding the terminator
const MAX_LINE_LEN: usize = 1024;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;
type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Serial port configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path (e.g. "/dev/ttyUSB0" or "COM3"); first discovered port when unset
    pub port: Option<String>,
    /// Baud rate
    pub baud_rate: u32,
    /// Poll interval for inbound lines (milliseconds)
    pub read_timeout_ms: u64,
    /// Give up on a command write after this long (milliseconds)
    pub write_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 9600,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
        }
    }
}

/// Outbound half of the controller link. Cheap to clone.
#[derive(Clone)]
pub struct SerialLink {
    device: Option<String>,
    writer: Option<Arc<Mutex<BoxedWriter>>>,
    write_timeout: Duration,
}

impl SerialLink {
    /// Link without hardware (log-only mode)
    pub fn disconnected() -> Self {
        Self {
            device: None,
            writer: None,
            write_timeout: Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS),
        }
    }

    /// Build a link over any byte stream
    pub fn from_stream<S>(device: &str, stream: S, read_timeout: Duration) -> (Self, LineReader)
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        let writer: BoxedWriter = Box::new(write_half);
        let link = Self {
            device: Some(device.to_string()),
            writer: Some(Arc::new(Mutex::new(writer))),
            write_timeout: Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS),
        };
        (link, LineReader::new(Box::new(read_half), read_timeout))
    }

    /// Open the configured port, or the first discovered one
    pub fn open(config: &SerialConfig) -> Result<(Self, LineReader), TransportError> {
        let device = match &config.port {
            Some(port) => port.clone(),
            None => discover_port()?,
        };

        info!("Opening serial port {} at {} baud", device, config.baud_rate);

        let stream = tokio_serial::new(&device, config.baud_rate)
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .open_native_async()
            .map_err(|e| TransportError::Open {
                device: device.clone(),
                reason: e.to_string(),
            })?;

        let (link, reader) = Self::from_stream(
            &device,
            stream,
            Duration::from_millis(config.read_timeout_ms),
        );
        Ok((
            link.with_write_timeout(Duration::from_millis(config.write_timeout_ms)),
            reader,
        ))
    }

    /// Set the bound on a single command write
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Open the port, falling back to log-only mode when it is not available
    pub fn open_or_disconnected(config: &SerialConfig) -> (Self, Option<LineReader>) {
        match Self::open(config) {
            Ok((link, reader)) => {
                info!("Connected to controller on {}", link.device().unwrap_or("?"));
                (link, Some(reader))
            }
            Err(e) => {
                warn!("Serial link unavailable, running log-only: {}", e);
                (Self::disconnected(), None)
            }
        }
    }

    /// Write a single command byte.
    ///
    /// Fails with [`TransportError::WriteTimeout`] when the controller stops
    /// draining the port.
    pub async fn send(&self, command: SerialCommand) -> Result<(), TransportError> {
        let writer = self.writer.as_ref().ok_or(TransportError::Unavailable)?;

        let write = async {
            let mut writer = writer.lock().await;
            writer.write_all(&[command.as_byte()]).await?;
            writer.flush().await
        };

        tokio::time::timeout(self.write_timeout, write)
            .await
            .map_err(|_| TransportError::WriteTimeout(self.write_timeout))?
            .map_err(|e| TransportError::Write(e.to_string()))?;

        debug!("Sent {:?} ({:?})", command, command.as_byte() as char);
        Ok(())
    }

    /// Check if a port is attached
    pub fn is_connected(&self) -> bool {
        self.writer.is_some()
    }

    /// Attached device path
    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    /// Flush and shut down the write side
    pub async fn close(&self) {
        if let Some(writer) = &self.writer {
            if let Err(e) = writer.lock().await.shutdown().await {
                debug!("Serial shutdown error: {}", e);
            }
            info!("Serial connection closed");
        }
    }
}

/// Pick the first serial port the OS reports
pub fn discover_port() -> Result<String, TransportError> {
    let ports = tokio_serial::available_ports()?;
    ports
        .into_iter()
        .next()
        .map(|p| p.port_name)
        .ok_or(TransportError::NoPorts)
}

/// Result of one poll of the inbound side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinePoll {
    /// A complete, trimmed, non-empty line
    Line(String),
    /// Nothing complete arrived within the poll interval
    Idle,
    /// The port reached end of stream
    Closed,
}

/// Inbound half of the controller link
pub struct LineReader {
    reader: BufReader<BoxedReader>,
    buf: Vec<u8>,
    timeout: Duration,
    /// Dropping the rest of an overlong line
    discarding: bool,
}

impl LineReader {
    fn new(reader: BoxedReader, timeout: Duration) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::with_capacity(128),
            timeout,
            discarding: false,
        }
    }

    /// Wait at most one poll interval for the next line.
    ///
    /// Partial lines survive across polls. Invalid UTF-8 is replaced rather
    /// than rejected. A line longer than the limit is reported once as a read
    /// error and skipped up to its terminator.
    pub async fn poll_line(&mut self) -> Result<LinePoll, TransportError> {
        loop {
            let limit = (MAX_LINE_LEN + 1).saturating_sub(self.buf.len()) as u64;
            let read = tokio::time::timeout(
                self.timeout,
                (&mut self.reader).take(limit).read_until(b'\n', &mut self.buf),
            )
            .await;

            match read {
                Err(_) => return Ok(LinePoll::Idle),
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::TimedOut => {
                    return Ok(LinePoll::Idle)
                }
                Ok(Err(e)) => return Err(TransportError::Read(e.to_string())),
                Ok(Ok(0)) if self.buf.is_empty() => return Ok(LinePoll::Closed),
                // a line, or a partial line cut short by end of stream
                Ok(Ok(_)) => {}
            }

            let complete = self.buf.ends_with(b"\n");
            if self.discarding {
                self.buf.clear();
                self.discarding = !complete;
                continue;
            }
            if !complete && self.buf.len() > MAX_LINE_LEN {
                self.buf.clear();
                self.discarding = true;
                return Err(TransportError::Read(format!(
                    "line exceeds {} bytes",
                    MAX_LINE_LEN
                )));
            }

            let line = String::from_utf8_lossy(&self.buf).trim().to_string();
            self.buf.clear();
            if !line.is_empty() {
                return Ok(LinePoll::Line(line));
            }
        }
    }
}
