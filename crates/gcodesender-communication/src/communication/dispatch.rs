//! Ack-gated command dispatch
//!
//! Commands are sent one at a time: after a command goes out nothing else is
//! dispatched until the machine answers `ok`. The queue itself performs no
//! I/O; the session drives it and does the writing.

use std::collections::VecDeque;

use gcodesender_core::ConnectionError;
use gcodesender_visualizer::Command;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Sent, in order, on emergency stop: halt, then the ASCII cancel byte
pub const EMERGENCY_STOP_COMMANDS: [&str; 2] = ["M112", "\x18"];

/// Acknowledgement token sent by the machine
const ACK: [char; 2] = ['o', 'k'];

/// Connection state of a dispatch queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// A connection attempt is in progress; nothing is dispatched
    Connecting,
    Connected {
        /// A command is in flight and no `ok` has been seen since
        awaiting_ack: bool,
    },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }
}

/// Finds `ok` in inbound text that may arrive split across chunks
///
/// Only the last character of the previous chunk is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct AckDetector {
    last_char_seen: Option<char>,
}

impl AckDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan a chunk; true when it completes an `ok`
    pub fn scan(&mut self, chunk: &str) -> bool {
        let mut previous = self.last_char_seen;
        let mut found = false;
        for c in chunk.chars() {
            if previous == Some(ACK[0]) && c == ACK[1] {
                found = true;
            }
            previous = Some(c);
        }
        self.last_char_seen = previous;
        found
    }

    pub fn reset(&mut self) {
        self.last_char_seen = None;
    }
}

/// FIFO of pending commands with at most one command awaiting an ack
#[derive(Debug, Default)]
pub struct DispatchQueue {
    pending: VecDeque<Command>,
    state: ConnectionState,
    ack: AckDetector,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn is_awaiting_ack(&self) -> bool {
        matches!(self.state, ConnectionState::Connected { awaiting_ack: true })
    }

    /// Pending commands, next to send first
    pub fn pending(&self) -> impl Iterator<Item = &Command> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Append commands; legal in any state
    pub fn enqueue<I>(&mut self, commands: I)
    where
        I: IntoIterator,
        I::Item: Into<Command>,
    {
        let before = self.pending.len();
        self.pending.extend(commands.into_iter().map(Into::into));
        trace!("enqueued {} commands", self.pending.len() - before);
    }

    /// Enter `Connecting`; fails unless disconnected
    pub fn begin_connect(&mut self) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Disconnected {
            return Err(ConnectionError::AlreadyConnected);
        }
        self.state = ConnectionState::Connecting;
        Ok(())
    }

    /// The link is up with no ack outstanding
    ///
    /// Commands enqueued while disconnected stay queued; `disconnect`
    /// already dropped anything left from an earlier connection.
    pub fn connect_succeeded(&mut self) {
        self.ack.reset();
        self.state = ConnectionState::Connected {
            awaiting_ack: false,
        };
    }

    pub fn connect_failed(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// Drop pending commands and go disconnected
    pub fn disconnect(&mut self) {
        if !self.pending.is_empty() {
            debug!("discarding {} pending commands", self.pending.len());
        }
        self.pending.clear();
        self.state = ConnectionState::Disconnected;
    }

    /// Pop the next command to transmit, marking it in flight
    ///
    /// `None` unless connected, idle and non-empty.
    pub fn next_to_send(&mut self) -> Option<Command> {
        if self.state != (ConnectionState::Connected { awaiting_ack: false }) {
            return None;
        }
        let command = self.pending.pop_front()?;
        self.state = ConnectionState::Connected { awaiting_ack: true };
        Some(command)
    }

    /// Scan inbound text for an ack; true when one cleared the gate
    pub fn receive(&mut self, chunk: &str) -> bool {
        if !self.ack.scan(chunk) {
            return false;
        }
        self.reopen_gate();
        true
    }

    /// The in-flight command never reached the machine; no ack will come
    pub fn send_failed(&mut self) {
        self.reopen_gate();
    }

    /// Reading from the machine failed; the ack for the in-flight command
    /// may be lost, so stop waiting for it
    pub fn receive_failed(&mut self) {
        self.ack.reset();
        self.reopen_gate();
    }

    fn reopen_gate(&mut self) {
        if let ConnectionState::Connected { awaiting_ack } = &mut self.state {
            *awaiting_ack = false;
        }
    }

    /// Clear every pending command
    ///
    /// The ack gate is left alone; the stop commands bypass it.
    pub fn emergency_stop(&mut self) -> [&'static str; 2] {
        self.pending.clear();
        EMERGENCY_STOP_COMMANDS
    }
}
