//! Controller Serial Link
//!
//! This crate provides async serial communication with the in-vehicle alert
//! controller. Outbound traffic is single command bytes; inbound traffic is
//! line-delimited text (status messages and GPS reports).

mod command;
mod error;
mod link;

pub use command::SerialCommand;
pub use error::TransportError;
pub use link::{discover_port, LinePoll, LineReader, SerialConfig, SerialLink};
