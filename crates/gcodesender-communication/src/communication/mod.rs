//! Machine communication
//!
//! This module provides:
//! - The transport abstraction and serial connection parameters
//! - The serial port transport and port discovery
//! - The ack-gated dispatch queue
//! - The console transcript
//! - Jog command building
//! - The machine session tying them together

pub mod dispatch;
pub mod jog;
pub mod serial;
pub mod session;
pub mod transcript;

use std::fmt;

use gcodesender_core::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default baud rate
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Serial parity setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerialParity {
    #[default]
    None,
    Even,
    Odd,
}

impl fmt::Display for SerialParity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "no"),
            Self::Even => write!(f, "even"),
            Self::Odd => write!(f, "odd"),
        }
    }
}

/// Requested serial connection options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port: String,
    pub baud_rate: u32,
    /// 5 to 8
    pub data_bits: u8,
    /// 1 or 2
    pub stop_bits: u8,
    pub parity: SerialParity,
    /// Hardware (CTS/RTS) flow control
    pub flow_control: bool,
    /// Read timeout
    pub timeout_ms: u64,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: 8,
            stop_bits: 1,
            parity: SerialParity::None,
            flow_control: false,
            timeout_ms: 10,
        }
    }
}

impl ConnectionParams {
    /// 8N1 without flow control on the given port
    pub fn serial(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            ..Self::default()
        }
    }

    /// Options the opened port did not honour
    pub fn mismatches(&self, info: &ConnectionInfo) -> Vec<OptionMismatch> {
        let mut mismatches = Vec::new();
        let mut check = |key: &'static str, expected: String, actual: String| {
            if expected != actual {
                mismatches.push(OptionMismatch {
                    key,
                    expected,
                    actual,
                });
            }
        };
        check(
            "bitrate",
            self.baud_rate.to_string(),
            info.baud_rate.to_string(),
        );
        check(
            "dataBits",
            self.data_bits.to_string(),
            info.data_bits.to_string(),
        );
        check(
            "stopBits",
            self.stop_bits.to_string(),
            info.stop_bits.to_string(),
        );
        check("parityBit", self.parity.to_string(), info.parity.to_string());
        check(
            "ctsFlowControl",
            self.flow_control.to_string(),
            info.flow_control.to_string(),
        );
        mismatches
    }
}

/// A requested option that differs from what the opened port reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionMismatch {
    pub key: &'static str,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for OptionMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "serial port did not use requested option. [{}; expected:{}, actual:{}]",
            self.key, self.expected, self.actual
        )
    }
}

/// An open connection as reported by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Unique per opened connection
    pub id: Uuid,
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: SerialParity,
    pub flow_control: bool,
}

impl ConnectionInfo {
    /// Info for a port that honoured every requested option
    pub fn from_params(params: &ConnectionParams) -> Self {
        Self {
            id: Uuid::new_v4(),
            port: params.port.clone(),
            baud_rate: params.baud_rate,
            data_bits: params.data_bits,
            stop_bits: params.stop_bits,
            parity: params.parity,
            flow_control: params.flow_control,
        }
    }
}

/// Byte link to a machine
///
/// Implemented for real serial ports by [`serial::SerialTransport`]; tests
/// provide in-memory implementations.
pub trait Transport: Send {
    /// Open the link
    fn connect(&mut self, params: &ConnectionParams) -> Result<ConnectionInfo>;

    /// Close the link; closing a closed link is not an error
    fn disconnect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Write bytes, returning how many were written
    fn send(&mut self, data: &[u8]) -> Result<usize>;

    /// Read whatever bytes are available; empty when nothing arrived
    fn receive(&mut self) -> Result<Vec<u8>>;
}
