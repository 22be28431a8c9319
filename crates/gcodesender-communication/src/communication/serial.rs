//! Serial port transport
//!
//! Provides port discovery and a [`Transport`] over the `serialport` crate for
//! direct connection to CNC controllers via USB or RS-232.

use std::io::{self, Read, Write};
use std::time::Duration;

use gcodesender_core::{ConnectionError, Result};
use serialport::SerialPort;
use tracing::{debug, info, warn};

use super::{ConnectionInfo, ConnectionParams, SerialParity, Transport};

/// Size of a single read from the port
const READ_CHUNK_SIZE: usize = 1024;

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Serial Port")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,

    /// USB vendor and product IDs if applicable
    pub usb_ids: Option<(u16, u16)>,
}

/// List serial ports that look like CNC controllers
///
/// - Windows: COM*
/// - Linux: /dev/ttyUSB*, /dev/ttyACM*
/// - macOS: /dev/cu.usbserial-*, /dev/cu.usbmodem*
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    let ports = serialport::available_ports().map_err(|e| {
        tracing::error!("Failed to enumerate serial ports: {}", e);
        ConnectionError::Enumeration {
            reason: e.to_string(),
        }
    })?;

    let infos: Vec<SerialPortInfo> = ports
        .iter()
        .filter(|port| is_valid_cnc_port(&port.port_name))
        .map(|port| {
            let mut info = SerialPortInfo {
                port_name: port.port_name.clone(),
                description: port_description(port),
                manufacturer: None,
                usb_ids: None,
            };
            if let serialport::SerialPortType::UsbPort(usb) = &port.port_type {
                info.manufacturer = usb.manufacturer.clone();
                info.usb_ids = Some((usb.vid, usb.pid));
            }
            info
        })
        .collect();

    debug!("{} serial device(s) detected", infos.len());
    Ok(infos)
}

/// Check if a port name matches CNC controller patterns
pub fn is_valid_cnc_port(port_name: &str) -> bool {
    if let Some(number) = port_name.strip_prefix("COM") {
        return !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
    }

    port_name.starts_with("/dev/ttyUSB")
        || port_name.starts_with("/dev/ttyACM")
        || port_name.starts_with("/dev/cu.usbserial-")
        || port_name.starts_with("/dev/cu.usbmodem")
}

fn port_description(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        serialport::SerialPortType::UsbPort(usb) => format!(
            "USB {} {}",
            usb.manufacturer.as_deref().unwrap_or("Device"),
            usb.product.as_deref().unwrap_or("Serial Port")
        ),
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}

fn to_serialport_parity(parity: SerialParity) -> serialport::Parity {
    match parity {
        SerialParity::None => serialport::Parity::None,
        SerialParity::Even => serialport::Parity::Even,
        SerialParity::Odd => serialport::Parity::Odd,
    }
}

fn from_serialport_parity(parity: serialport::Parity) -> SerialParity {
    match parity {
        serialport::Parity::None => SerialParity::None,
        serialport::Parity::Even => SerialParity::Even,
        serialport::Parity::Odd => SerialParity::Odd,
    }
}

fn to_data_bits(bits: u8) -> Option<serialport::DataBits> {
    match bits {
        5 => Some(serialport::DataBits::Five),
        6 => Some(serialport::DataBits::Six),
        7 => Some(serialport::DataBits::Seven),
        8 => Some(serialport::DataBits::Eight),
        _ => None,
    }
}

fn from_data_bits(bits: serialport::DataBits) -> u8 {
    match bits {
        serialport::DataBits::Five => 5,
        serialport::DataBits::Six => 6,
        serialport::DataBits::Seven => 7,
        serialport::DataBits::Eight => 8,
    }
}

fn invalid(reason: String) -> ConnectionError {
    ConnectionError::InvalidParameters { reason }
}

/// Serial port transport
#[derive(Default)]
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// What the opened port actually uses, falling back to the request for
    /// settings the driver cannot report
    fn connection_info(port: &dyn SerialPort, params: &ConnectionParams) -> ConnectionInfo {
        let mut info = ConnectionInfo::from_params(params);
        if let Ok(baud) = port.baud_rate() {
            info.baud_rate = baud;
        }
        if let Ok(bits) = port.data_bits() {
            info.data_bits = from_data_bits(bits);
        }
        if let Ok(bits) = port.stop_bits() {
            info.stop_bits = match bits {
                serialport::StopBits::One => 1,
                serialport::StopBits::Two => 2,
            };
        }
        if let Ok(parity) = port.parity() {
            info.parity = from_serialport_parity(parity);
        }
        if let Ok(flow) = port.flow_control() {
            info.flow_control = flow == serialport::FlowControl::Hardware;
        }
        info
    }
}

impl Transport for SerialTransport {
    fn connect(&mut self, params: &ConnectionParams) -> Result<ConnectionInfo> {
        if self.port.is_some() {
            return Err(ConnectionError::AlreadyConnected.into());
        }

        let data_bits = to_data_bits(params.data_bits)
            .ok_or_else(|| invalid(format!("Invalid data bits: {}", params.data_bits)))?;
        let stop_bits = match params.stop_bits {
            1 => serialport::StopBits::One,
            2 => serialport::StopBits::Two,
            other => return Err(invalid(format!("Invalid stop bits: {}", other)).into()),
        };

        debug!("connecting to '{}' with options: {:?}", params.port, params);
        let port = serialport::new(&params.port, params.baud_rate)
            .timeout(Duration::from_millis(params.timeout_ms))
            .data_bits(data_bits)
            .stop_bits(stop_bits)
            .parity(to_serialport_parity(params.parity))
            .flow_control(if params.flow_control {
                serialport::FlowControl::Hardware
            } else {
                serialport::FlowControl::None
            })
            .open()
            .map_err(|e| {
                warn!("Failed to open serial port {}: {}", params.port, e);
                ConnectionError::FailedToOpen {
                    port: params.port.clone(),
                    reason: e.to_string(),
                }
            })?;

        let info = Self::connection_info(port.as_ref(), params);
        info!("serial connection {} obtained on {}", info.id, info.port);
        self.port = Some(port);
        Ok(info)
    }

    fn disconnect(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            info!("serial port closed");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn send(&mut self, data: &[u8]) -> Result<usize> {
        let port = self.port.as_mut().ok_or(ConnectionError::NotConnected)?;
        port.write_all(data)
            .and_then(|_| port.flush())
            .map_err(|e| ConnectionError::SendFailed {
                reason: e.to_string(),
            })?;
        Ok(data.len())
    }

    fn receive(&mut self) -> Result<Vec<u8>> {
        let port = self.port.as_mut().ok_or(ConnectionError::NotConnected)?;
        let mut buf = [0u8; READ_CHUNK_SIZE];
        match port.read(&mut buf) {
            Ok(n) => Ok(buf[..n].to_vec()),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(Vec::new()),
            Err(e) => Err(ConnectionError::ReceiveFailed {
                reason: e.to_string(),
            }
            .into()),
        }
    }
}
