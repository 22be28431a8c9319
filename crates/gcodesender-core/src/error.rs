//! Error handling for GCodeSender
//!
//! G-code parsing never fails: malformed input is coerced and reported as a
//! warning instead. Errors only exist at the real fallible boundaries:
//! - Connection errors (opening, writing to and reading from the serial link)
//! - Program errors (loading program files)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Connection error type
///
/// Represents errors related to the serial link to the machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// No connection is open
    #[error("no device connection available.")]
    NotConnected,

    /// A connection attempt is already in progress or open
    #[error("Connection already open or pending")]
    AlreadyConnected,

    /// Failed to open port
    #[error("Unable to connect to '{port}': {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// Invalid connection parameters
    #[error("Invalid connection parameters: {reason}")]
    InvalidParameters {
        /// The reason the parameters are invalid.
        reason: String,
    },

    /// Writing to the port failed
    #[error("failed to send command: {reason}")]
    SendFailed {
        /// The reason the write failed.
        reason: String,
    },

    /// Reading from the port failed
    #[error("error with serial communication: {reason}")]
    ReceiveFailed {
        /// The reason the read failed.
        reason: String,
    },

    /// Failed to enumerate ports
    #[error("Failed to enumerate ports: {reason}")]
    Enumeration {
        /// The reason enumeration failed.
        reason: String,
    },
}

/// Program loading error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgramError {
    /// The file does not exist or is not a regular file
    #[error("Not a program file: {path}")]
    NotAFile {
        /// The offending path.
        path: String,
    },

    /// The file extension is not one of the accepted G-code extensions
    #[error("Unsupported program extension '{extension}' (expected .gcode or .nc)")]
    UnsupportedExtension {
        /// The extension that was found.
        extension: String,
    },
}

/// Main error type for GCodeSender
#[derive(Error, Debug)]
pub enum Error {
    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Program error
    #[error(transparent)]
    Program(#[from] ProgramError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a program error
    pub fn is_program_error(&self) -> bool {
        matches!(self, Error::Program(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
