//! # GCodeSender Communication
//!
//! Talks to a CNC machine over a serial link. Commands are dispatched one at
//! a time, each waiting for the machine's `ok`, and everything sent and
//! received is kept in a bounded console transcript.

pub mod communication;

pub use communication::{
    dispatch::{AckDetector, ConnectionState, DispatchQueue, EMERGENCY_STOP_COMMANDS},
    jog::{build_jog, JogAxis, JogOptions, StepSize},
    serial::{is_valid_cnc_port, list_ports, SerialPortInfo, SerialTransport},
    session::{MachineSession, ModalTracker, PumpTask, SessionHandle, PUMP_INTERVAL},
    transcript::{EntrySource, TranscriptEntry, TranscriptLog, DEFAULT_SCROLLBACK},
    ConnectionInfo, ConnectionParams, OptionMismatch, SerialParity, Transport,
    DEFAULT_BAUD_RATE,
};
