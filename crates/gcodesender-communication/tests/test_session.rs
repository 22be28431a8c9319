use gcodesender_communication::{
    ConnectionInfo, ConnectionParams, ConnectionState, JogAxis, JogOptions, MachineSession,
    SessionHandle, StepSize, Transport,
};
use gcodesender_core::{ConnectionError, Result, WarningGroup};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// In-memory transport; the test keeps clones of the shared buffers
#[derive(Clone, Default)]
struct MockTransport {
    sent_data: Arc<Mutex<Vec<String>>>,
    inbound: Arc<Mutex<VecDeque<Vec<u8>>>>,
    connected: Arc<Mutex<bool>>,
    fail_connect: bool,
    fail_receive: bool,
    reported_baud: Option<u32>,
}

impl MockTransport {
    fn new() -> Self {
        Self::default()
    }

    fn sent(&self) -> Vec<String> {
        self.sent_data.lock().unwrap().clone()
    }

    fn push_inbound(&self, data: &str) {
        self.inbound.lock().unwrap().push_back(data.as_bytes().to_vec());
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, params: &ConnectionParams) -> Result<ConnectionInfo> {
        if self.fail_connect {
            return Err(ConnectionError::FailedToOpen {
                port: params.port.clone(),
                reason: "no such device".to_string(),
            }
            .into());
        }
        *self.connected.lock().unwrap() = true;
        let mut info = ConnectionInfo::from_params(params);
        if let Some(baud) = self.reported_baud {
            info.baud_rate = baud;
        }
        Ok(info)
    }

    fn disconnect(&mut self) -> Result<()> {
        *self.connected.lock().unwrap() = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock().unwrap()
    }

    fn send(&mut self, data: &[u8]) -> Result<usize> {
        let s = String::from_utf8_lossy(data).to_string();
        self.sent_data.lock().unwrap().push(s);
        Ok(data.len())
    }

    fn receive(&mut self) -> Result<Vec<u8>> {
        if self.fail_receive {
            return Err(ConnectionError::ReceiveFailed {
                reason: "cable pulled".to_string(),
            }
            .into());
        }
        Ok(self.inbound.lock().unwrap().pop_front().unwrap_or_default())
    }
}

fn connected_session() -> (MachineSession, MockTransport) {
    let mock = MockTransport::new();
    let mut session = MachineSession::new(Box::new(mock.clone()));
    session
        .connect(&ConnectionParams::serial("/dev/ttyUSB0", 9600))
        .unwrap();
    (session, mock)
}

#[test]
fn test_commands_sent_one_at_a_time() {
    let (mut session, mock) = connected_session();
    let commands = ["G21", "G90", "G0 X10", "G1 Y10 F100", "M5"];
    session.enqueue(commands);

    for (i, command) in commands.iter().enumerate() {
        assert_eq!(session.pump_once().as_deref(), Some(*command));
        // gate closed until the ack
        assert_eq!(session.pump_once(), None);
        assert_eq!(session.pump_once(), None);
        assert_eq!(mock.sent().len(), i + 1);
        assert_eq!(mock.sent()[i], format!("{}\n", command));
        session.handle_receive(b"ok\r\n");
    }

    assert_eq!(mock.sent().len(), commands.len());
    assert_eq!(session.pump_once(), None);
}

#[test]
fn test_commands_enqueued_before_connect_are_sent_after() {
    let mock = MockTransport::new();
    let mut session = MachineSession::new(Box::new(mock.clone()));
    let commands = ["G0 X1", "G0 X2", "G0 X3"];
    session.enqueue(commands);
    assert_eq!(session.pump_once(), None);
    assert!(mock.sent().is_empty());

    session
        .connect(&ConnectionParams::serial("/dev/ttyUSB0", 9600))
        .unwrap();

    for (i, command) in commands.iter().enumerate() {
        assert_eq!(session.pump_once().as_deref(), Some(*command));
        assert_eq!(session.pump_once(), None);
        assert_eq!(mock.sent().len(), i + 1);
        session.handle_receive(b"ok\n");
    }
    assert_eq!(mock.sent(), vec!["G0 X1\n", "G0 X2\n", "G0 X3\n"]);
    assert_eq!(session.pump_once(), None);
}

#[test]
fn test_reconnect_does_not_resend_old_commands() {
    let (mut session, mock) = connected_session();
    session.enqueue(["G0 X1", "G0 X2"]);
    session.pump_once();
    session.disconnect();

    session
        .connect(&ConnectionParams::serial("/dev/ttyUSB0", 9600))
        .unwrap();
    assert!(session.queue().is_empty());
    assert_eq!(session.pump_once(), None);
    assert_eq!(mock.sent(), vec!["G0 X1\n"]);
}

#[test]
fn test_receive_error_reopens_gate() {
    let mock = MockTransport {
        fail_receive: true,
        ..MockTransport::new()
    };
    let mut session = MachineSession::new(Box::new(mock.clone()));
    session
        .connect(&ConnectionParams::serial("/dev/ttyUSB0", 9600))
        .unwrap();
    session.enqueue(["G0 X1", "G0 X2"]);

    assert_eq!(session.tick().as_deref(), Some("G0 X1"));
    assert!(session.queue().is_awaiting_ack());
    // no ack can be read, the failed read unblocks the next command
    assert_eq!(session.tick().as_deref(), Some("G0 X2"));

    assert!(session.is_connected());
    assert_eq!(mock.sent(), vec!["G0 X1\n", "G0 X2\n"]);
    let warnings = session.warnings().warnings();
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].group, WarningGroup::Connection);
    assert_eq!(
        warnings[0].message,
        "error with serial communication: cable pulled"
    );
}

#[test]
fn test_split_ack_clears_gate() {
    let (mut session, mock) = connected_session();
    session.enqueue(["G0 X1", "G0 X2"]);
    session.pump_once();

    session.handle_receive(b"o");
    assert!(session.queue().is_awaiting_ack());
    session.handle_receive(b"k");
    assert!(!session.queue().is_awaiting_ack());

    session.pump_once();
    assert_eq!(mock.sent(), vec!["G0 X1\n", "G0 X2\n"]);
}

#[test]
fn test_emergency_stop_bypasses_gate() {
    let (mut session, mock) = connected_session();
    session.enqueue(["G1 X1", "G1 X2", "G1 X3", "G1 X4"]);
    session.pump_once();
    assert!(session.queue().is_awaiting_ack());
    assert_eq!(session.queue().len(), 3);

    session.emergency_stop();

    assert!(session.queue().is_empty());
    assert_eq!(mock.sent(), vec!["G1 X1\n", "M112\n", "\x18\n"]);
    let last = session.transcript().lines().last().unwrap();
    assert_eq!(last.text, "\\x18");
}

#[test]
fn test_connect_failure_is_a_warning() {
    let mock = MockTransport {
        fail_connect: true,
        ..MockTransport::new()
    };
    let mut session = MachineSession::new(Box::new(mock));
    let err = session
        .connect(&ConnectionParams::serial("/dev/ttyUSB9", 9600))
        .unwrap_err();

    assert!(err.is_connection_error());
    assert_eq!(session.state(), ConnectionState::Disconnected);
    let warnings = session.warnings().messages();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].starts_with("Unable to connect to '/dev/ttyUSB9'"));
}

#[test]
fn test_option_mismatch_is_a_warning() {
    let mock = MockTransport {
        reported_baud: Some(115200),
        ..MockTransport::new()
    };
    let mut session = MachineSession::new(Box::new(mock));
    session
        .connect(&ConnectionParams::serial("/dev/ttyUSB0", 9600))
        .unwrap();

    assert!(session.is_connected());
    let warnings = session.warnings().warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].group, WarningGroup::Connection);
    assert_eq!(
        warnings[0].message,
        "serial port did not use requested option. [bitrate; expected:9600, actual:115200]"
    );
}

#[test]
fn test_send_program_requires_connection() {
    let mut session = MachineSession::new(Box::new(MockTransport::new()));
    let program = vec!["G1 X1".to_string()];
    assert!(session.send_program(&program, "", "").is_err());
}

#[test]
fn test_send_program_wraps_with_preamble_and_postamble() {
    let (mut session, _mock) = connected_session();
    let program = vec!["G1 X1".to_string(), "G1 X2".to_string()];
    let count = session
        .send_program(&program, "G21 G90 ; setup", "M5\nM2")
        .unwrap();

    assert_eq!(count, 6);
    let pending: Vec<_> = session.queue().pending().cloned().collect();
    assert_eq!(pending, vec!["G21", "G90", "G1 X1", "G1 X2", "M5", "M2"]);
}

#[test]
fn test_jog_tracks_sent_modes() {
    let (mut session, mock) = connected_session();
    let options = JogOptions::default();

    assert!(session.jog(JogAxis::XPlus, StepSize::new(1), &options));
    // refused while the first jog is still queued
    assert!(!session.jog(JogAxis::XPlus, StepSize::new(1), &options));

    for _ in 0..3 {
        session.pump_once();
        session.handle_receive(b"ok\n");
    }
    assert_eq!(mock.sent(), vec!["G91\n", "G21\n", "G1 X10\n"]);

    assert!(session.jog(JogAxis::YMinus, StepSize::new(0), &options));
    let pending: Vec<_> = session.queue().pending().cloned().collect();
    assert_eq!(pending, vec!["G1 Y-1"]);
}

#[test]
fn test_jog_refused_when_disconnected() {
    let mut session = MachineSession::new(Box::new(MockTransport::new()));
    assert!(!session.jog(JogAxis::ZPlus, StepSize::default(), &JogOptions::default()));
    assert!(session.queue().is_empty());
}

#[test]
fn test_disconnect_clears_queue() {
    let (mut session, mock) = connected_session();
    session.enqueue(["G1 X1", "G1 X2"]);
    session.pump_once();
    session.disconnect();

    assert!(session.queue().is_empty());
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert!(session.connection().is_none());
    assert!(!mock.is_connected());
}

#[test]
fn test_transcript_records_both_directions() {
    let (mut session, _mock) = connected_session();
    session.enqueue(["G0 X1"]);
    session.pump_once();
    session.handle_receive(b"ok\r\n");

    let lines: Vec<_> = session.transcript().lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].text, "G0 X1");
    assert!(lines[1].is_pure_ack);
}

#[tokio::test]
async fn test_pump_task_streams_program() {
    let (session, mock) = connected_session();
    let handle = SessionHandle::new(session);
    handle.lock().enqueue(["G0 X1", "G0 X2", "G0 X3"]);

    let pump = handle.spawn_pump(Duration::from_millis(5));
    for _ in 0..3 {
        mock.push_inbound("ok\n");
    }

    let mut waited = 0;
    while mock.sent().len() < 3 && waited < 200 {
        tokio::time::sleep(Duration::from_millis(5)).await;
        // keep an ack available for whatever is in flight
        let inbound_empty = mock.inbound.lock().unwrap().is_empty();
        let awaiting = handle.lock().queue().is_awaiting_ack();
        if inbound_empty && awaiting {
            mock.push_inbound("ok\n");
        }
        waited += 1;
    }
    pump.stop().await;

    assert_eq!(mock.sent(), vec!["G0 X1\n", "G0 X2\n", "G0 X3\n"]);
}
