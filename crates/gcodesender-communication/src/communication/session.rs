//! Machine session
//!
//! Owns everything that changes while talking to a machine: the transport,
//! the dispatch queue, the transcript, the warning log and the modal state
//! implied by sent commands. A [`SessionHandle`] shares one session between
//! the caller and the pump task; every operation takes the same lock, so at
//! most one command is ever in flight.

use std::sync::Arc;
use std::time::Duration;

use gcodesender_core::{ConnectionError, Result, WarningGroup, WarningLog};
use gcodesender_visualizer::{split, tokenize, Command};
use parking_lot::{Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace};

use super::dispatch::{ConnectionState, DispatchQueue};
use super::jog::{build_jog, JogAxis, JogOptions, StepSize};
use super::transcript::{EntrySource, TranscriptLog, DEFAULT_SCROLLBACK};
use super::{ConnectionInfo, ConnectionParams, Transport};

/// Period of the dispatch pump
pub const PUMP_INTERVAL: Duration = Duration::from_millis(50);

/// Distance and unit modes the machine was last told to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModalTracker {
    /// Last sent G90 (false) or G91 (true)
    pub is_relative: bool,
    /// Last sent G20 (false) or G21 (true); false until either is sent
    pub is_mm: bool,
}

impl ModalTracker {
    /// Update from a command about to be sent
    pub fn observe(&mut self, command: &str) {
        for token in split(command) {
            match token.as_str() {
                "G90" => self.is_relative = false,
                "G91" => self.is_relative = true,
                "G20" => self.is_mm = false,
                "G21" => self.is_mm = true,
                _ => {}
            }
        }
    }
}

/// State of one connection to a machine
pub struct MachineSession {
    transport: Box<dyn Transport>,
    queue: DispatchQueue,
    transcript: TranscriptLog,
    warnings: WarningLog,
    modal: ModalTracker,
    connection: Option<ConnectionInfo>,
}

impl MachineSession {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self::with_scrollback(transport, DEFAULT_SCROLLBACK)
    }

    /// Session whose transcript keeps `scrollback` entries
    pub fn with_scrollback(transport: Box<dyn Transport>, scrollback: usize) -> Self {
        Self {
            transport,
            queue: DispatchQueue::new(),
            transcript: TranscriptLog::new(scrollback),
            warnings: WarningLog::new(),
            modal: ModalTracker::default(),
            connection: None,
        }
    }

    pub fn queue(&self) -> &DispatchQueue {
        &self.queue
    }

    pub fn state(&self) -> ConnectionState {
        self.queue.state()
    }

    pub fn is_connected(&self) -> bool {
        self.queue.is_connected()
    }

    pub fn connection(&self) -> Option<&ConnectionInfo> {
        self.connection.as_ref()
    }

    pub fn transcript(&self) -> &TranscriptLog {
        &self.transcript
    }

    pub fn clear_transcript(&mut self) {
        self.transcript.clear();
    }

    pub fn warnings(&self) -> &WarningLog {
        &self.warnings
    }

    pub fn warnings_mut(&mut self) -> &mut WarningLog {
        &mut self.warnings
    }

    pub fn modal(&self) -> ModalTracker {
        self.modal
    }

    /// Open the transport
    ///
    /// On success commands already enqueued are kept and any option the
    /// port did not honour is logged as a connection warning. On failure the error is
    /// also logged as a warning and the session stays disconnected.
    pub fn connect(&mut self, params: &ConnectionParams) -> Result<ConnectionInfo> {
        self.queue.begin_connect()?;
        info!(
            "connecting to '{}' at {} baud",
            params.port, params.baud_rate
        );

        match self.transport.connect(params) {
            Ok(info) => {
                for mismatch in params.mismatches(&info) {
                    self.warnings.warn(WarningGroup::Connection, mismatch.to_string());
                }
                self.queue.connect_succeeded();
                self.connection = Some(info.clone());
                info!("connected to '{}' ({})", info.port, info.id);
                Ok(info)
            }
            Err(e) => {
                self.warnings.warn(WarningGroup::Connection, e.to_string());
                self.queue.connect_failed();
                Err(e)
            }
        }
    }

    /// Drop pending commands and close the transport without waiting for
    /// the in-flight command
    pub fn disconnect(&mut self) {
        self.queue.disconnect();
        if let Err(e) = self.transport.disconnect() {
            self.warnings.warn(WarningGroup::Connection, e.to_string());
        }
        if let Some(info) = self.connection.take() {
            info!("disconnected connection {}", info.id);
        }
    }

    /// Append commands to the dispatch queue
    pub fn enqueue<I>(&mut self, commands: I)
    where
        I: IntoIterator,
        I::Item: Into<Command>,
    {
        self.queue.enqueue(commands);
    }

    /// Enqueue a program wrapped in the tokenized preamble and postamble
    ///
    /// Refused when not connected. Returns the number of commands enqueued.
    pub fn send_program(
        &mut self,
        program: &[Command],
        preamble: &str,
        postamble: &str,
    ) -> Result<usize> {
        if !self.queue.is_connected() {
            info!("machine not connected. cannot send program.");
            return Err(ConnectionError::NotConnected.into());
        }

        let preamble = tokenize(preamble);
        let postamble = tokenize(postamble);
        let total = preamble.len() + program.len() + postamble.len();
        self.queue.enqueue(preamble);
        self.queue.enqueue(program.iter().cloned());
        self.queue.enqueue(postamble);
        debug!("enqueued program of {} commands", total);
        Ok(total)
    }

    /// True when jogs and quick commands are accepted
    pub fn can_send_quick_commands(&self) -> bool {
        self.queue.is_connected() && self.queue.is_empty()
    }

    /// Enqueue commands only if connected with nothing pending
    pub fn send_quick_commands<I>(&mut self, commands: I) -> bool
    where
        I: IntoIterator,
        I::Item: Into<Command>,
    {
        if !self.can_send_quick_commands() {
            return false;
        }
        self.queue.enqueue(commands);
        true
    }

    /// Enqueue a relative jog; ignored unless connected with nothing pending
    pub fn jog(&mut self, axis: JogAxis, step: StepSize, options: &JogOptions) -> bool {
        let commands = build_jog(axis, step, options, self.modal.is_relative, self.modal.is_mm);
        self.send_quick_commands(commands)
    }

    /// Write one command straight to the transport, bypassing the queue
    fn send_command(&mut self, command: &str) -> bool {
        self.modal.observe(command);

        if !self.transport.is_connected() {
            self.warnings.warn(
                WarningGroup::Command,
                ConnectionError::NotConnected.to_string(),
            );
            return false;
        }

        let sent = match self.transport.send(format!("{}\n", command).as_bytes()) {
            Ok(_) => true,
            Err(e) => {
                error!("failed to send {:?}: {}", command, e);
                self.warnings.warn(WarningGroup::Command, e.to_string());
                false
            }
        };
        self.transcript.record(command, EntrySource::Local);
        sent
    }

    /// Dispatch the next command if the ack gate is open
    ///
    /// Returns the command that was dispatched.
    pub fn pump_once(&mut self) -> Option<Command> {
        let command = self.queue.next_to_send()?;
        trace!("dispatching {}", command);
        if !self.send_command(&command) {
            self.queue.send_failed();
        }
        Some(command)
    }

    /// Feed bytes received from the machine
    pub fn handle_receive(&mut self, data: &[u8]) {
        // one char per byte, like the machine sends it
        let text: String = data.iter().map(|&b| char::from(b)).collect();
        if self.queue.receive(&text) {
            trace!("ack received");
        }
        self.transcript.record(&text, EntrySource::Remote);
    }

    /// Report a transport read failure
    ///
    /// The ack gate reopens so the pump does not wait forever on an ack
    /// that may have been lost.
    pub fn handle_receive_error(&mut self, err: &gcodesender_core::Error) {
        error!("receive failed: {}", err);
        self.warnings.warn(WarningGroup::Connection, err.to_string());
        self.queue.receive_failed();
    }

    /// Read whatever the transport has and process it
    pub fn poll_receive(&mut self) {
        if !self.transport.is_connected() {
            return;
        }
        match self.transport.receive() {
            Ok(data) if !data.is_empty() => self.handle_receive(&data),
            Ok(_) => {}
            Err(e) => self.handle_receive_error(&e),
        }
    }

    /// One pump period: process inbound data, then dispatch
    pub fn tick(&mut self) -> Option<Command> {
        self.poll_receive();
        self.pump_once()
    }

    /// Clear the queue and send M112 and the cancel byte immediately
    ///
    /// The machine will likely need a manual reset afterwards.
    pub fn emergency_stop(&mut self) {
        error!("!!!emergency stop activated!!!");
        for command in self.queue.emergency_stop() {
            self.send_command(command);
        }
    }
}

/// A [`MachineSession`] shared with its pump task
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<MachineSession>>,
}

impl SessionHandle {
    pub fn new(session: MachineSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Lock the session; do not hold the guard across an await
    pub fn lock(&self) -> MutexGuard<'_, MachineSession> {
        self.inner.lock()
    }

    /// Start ticking the session every `period` on the tokio runtime
    ///
    /// Each tick runs on the blocking pool since it reads from the transport.
    /// The session lock is held for the whole tick, which the transport's
    /// read timeout bounds (10 ms for serial ports by default).
    pub fn spawn_pump(&self, period: Duration) -> PumpTask {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let session = self.inner.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => {
                        let session = session.clone();
                        let tick = tokio::task::spawn_blocking(move || {
                            session.lock().tick();
                        });
                        if let Err(e) = tick.await {
                            error!("dispatch pump tick failed: {}", e);
                            break;
                        }
                    }
                }
            }
            debug!("dispatch pump stopped");
        });

        PumpTask {
            handle,
            shutdown: shutdown_tx,
        }
    }
}

/// Running pump task
pub struct PumpTask {
    handle: JoinHandle<()>,
    shutdown: mpsc::Sender<()>,
}

impl PumpTask {
    /// Stop the pump and wait for it to finish
    pub async fn stop(self) {
        let _ = self.shutdown.send(()).await;
        let _ = self.handle.await;
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modal_tracker() {
        let mut modal = ModalTracker::default();
        modal.observe("G91");
        modal.observe("G21");
        assert!(modal.is_relative && modal.is_mm);
        modal.observe("G90 G20");
        assert!(!modal.is_relative && !modal.is_mm);
        modal.observe("G1 X910");
        assert!(!modal.is_relative);
    }
}
