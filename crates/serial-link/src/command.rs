//! Outbound controller commands

use serde::{Deserialize, Serialize};

/// Single-byte commands understood by the alert controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SerialCommand {
    /// Raise the alarm (driver abnormal)
    Alert,
    /// Clear the alarm (driver fine)
    AllClear,
}

impl SerialCommand {
    /// Wire byte for this command
    pub fn as_byte(&self) -> u8 {
        match self {
            SerialCommand::Alert => b'a',
            SerialCommand::AllClear => b'b',
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'a' => Some(SerialCommand::Alert),
            b'b' => Some(SerialCommand::AllClear),
            _ => None,
        }
    }
}
