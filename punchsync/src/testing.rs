//! Test doubles for device sessions
//!
//! - [`ScriptedTransport`]: in-memory transport answering each sent frame
//!   according to a script
//! - [`FakeDevice`]: loopback UDP terminal speaking the real wire format

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Buf, Bytes};
use punchsync_core::{
    constants::attlog::{RECORD_SIZE, STATUS_OFFSET, TIMESTAMP_OFFSET, VERIFY_OFFSET},
    Command, CommandFrame,
};
use punchsync_transport::{Error as TransportError, Result as TransportResult, Transport};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

/// Session id handed out by the test doubles
pub const SESSION_ID: u16 = 0x2A2A;

/// Build one attendance record slot
pub fn record_slot(user_id: &str, verify: u8, timestamp: u32, status: u8) -> [u8; RECORD_SIZE] {
    let mut slot = [0u8; RECORD_SIZE];
    slot[..user_id.len()].copy_from_slice(user_id.as_bytes());
    slot[VERIFY_OFFSET] = verify;
    slot[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 4].copy_from_slice(&timestamp.to_le_bytes());
    slot[STATUS_OFFSET] = status;
    slot
}

/// Header fields of a sent frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentFrame {
    pub command: u16,
    pub session_id: u16,
    pub reply_id: u16,
}

fn parse_sent(data: &[u8]) -> SentFrame {
    let mut header = data;
    let command = header.get_u16_le();
    let _checksum = header.get_u16_le();
    let session_id = header.get_u16_le();
    let reply_id = header.get_u16_le();
    SentFrame {
        command,
        session_id,
        reply_id,
    }
}

/// How the scripted device reacts to the next frame
pub enum Step {
    /// ACK_OK echoing the reply id
    Ack,
    /// ACK_DATA echoing the reply id, followed by a payload
    Data(Vec<u8>),
    /// Reply with the given code
    Code(Command),
    /// A datagram with a mismatched reply id arrives first
    Stale(Box<Step>),
    /// Frame is swallowed; no reply
    Silent,
    /// The send itself fails
    SendError(fn() -> TransportError),
}

#[derive(Default)]
struct Script {
    steps: VecDeque<Step>,
    inbox: VecDeque<Bytes>,
    sent: Vec<SentFrame>,
    connected: bool,
}

impl Script {
    fn answer(&mut self, step: Step, frame: SentFrame) {
        let reply = |command: Command, reply_id: u16, payload: Vec<u8>| {
            CommandFrame::new(command, SESSION_ID, reply_id, payload).encode()
        };

        match step {
            Step::Ack => self.inbox.push_back(reply(Command::AckOk, frame.reply_id, Vec::new())),
            Step::Data(payload) => {
                self.inbox.push_back(reply(Command::AckData, frame.reply_id, payload))
            }
            Step::Code(code) => self.inbox.push_back(reply(code, frame.reply_id, Vec::new())),
            Step::Stale(next) => {
                self.inbox.push_back(reply(
                    Command::AckOk,
                    frame.reply_id.wrapping_sub(1),
                    Vec::new(),
                ));
                self.answer(*next, frame);
            }
            Step::Silent | Step::SendError(_) => {}
        }
    }
}

/// Handle for inspecting a [`ScriptedTransport`] after it has been boxed
#[derive(Clone)]
pub struct ScriptHandle(Arc<Mutex<Script>>);

impl ScriptHandle {
    pub fn sent(&self) -> Vec<SentFrame> {
        self.0.lock().unwrap().sent.clone()
    }

    pub fn sent_commands(&self) -> Vec<u16> {
        self.sent().iter().map(|f| f.command).collect()
    }

    pub fn is_connected(&self) -> bool {
        self.0.lock().unwrap().connected
    }
}

/// In-memory transport driven by a list of [`Step`]s, one per sent frame
///
/// Frames sent after the script runs out are answered with ACK_OK.
pub struct ScriptedTransport(Arc<Mutex<Script>>);

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> (Self, ScriptHandle) {
        let script = Arc::new(Mutex::new(Script {
            steps: steps.into_iter().collect(),
            ..Default::default()
        }));
        (Self(script.clone()), ScriptHandle(script))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&mut self) -> TransportResult<()> {
        let mut script = self.0.lock().unwrap();
        if script.connected {
            return Err(TransportError::AlreadyConnected);
        }
        script.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> TransportResult<()> {
        self.0.lock().unwrap().connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.0.lock().unwrap().connected
    }

    async fn send(&mut self, data: &[u8]) -> TransportResult<()> {
        let mut script = self.0.lock().unwrap();
        if !script.connected {
            return Err(TransportError::NotConnected);
        }

        let frame = parse_sent(data);
        script.sent.push(frame);

        match script.steps.pop_front().unwrap_or(Step::Ack) {
            Step::SendError(make) => Err(make()),
            step => {
                script.answer(step, frame);
                Ok(())
            }
        }
    }

    async fn receive(&mut self, _timeout: Duration) -> TransportResult<Bytes> {
        let mut script = self.0.lock().unwrap();
        if !script.connected {
            return Err(TransportError::NotConnected);
        }
        script.inbox.pop_front().ok_or(TransportError::ReadTimeout)
    }

    fn remote_addr(&self) -> String {
        "scripted:4370".into()
    }
}

#[derive(Default)]
struct DeviceState {
    records: Vec<[u8; RECORD_SIZE]>,
    received: Vec<SentFrame>,
    silent: bool,
}

/// Loopback UDP terminal
///
/// Answers CONNECT with [`SESSION_ID`], GET_ATTENDANCE with its stored
/// records, and every other command with ACK_OK. EXIT is not answered.
pub struct FakeDevice {
    addr: SocketAddr,
    state: Arc<Mutex<DeviceState>>,
    task: JoinHandle<()>,
}

impl FakeDevice {
    pub async fn start(records: Vec<[u8; RECORD_SIZE]>) -> Self {
        Self::spawn(DeviceState {
            records,
            ..Default::default()
        })
        .await
    }

    /// A device that receives frames but never answers
    pub async fn silent() -> Self {
        Self::spawn(DeviceState {
            silent: true,
            ..Default::default()
        })
        .await
    }

    async fn spawn(state: DeviceState) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let state = Arc::new(Mutex::new(state));

        let task = tokio::spawn(Self::serve(socket, state.clone()));

        Self { addr, state, task }
    }

    async fn serve(socket: UdpSocket, state: Arc<Mutex<DeviceState>>) {
        let mut buf = vec![0u8; 2048];
        loop {
            let Ok((n, peer)) = socket.recv_from(&mut buf).await else {
                return;
            };
            if n < 8 {
                continue;
            }

            let frame = parse_sent(&buf[..n]);
            let reply = {
                let mut state = state.lock().unwrap();
                state.received.push(frame);

                if state.silent {
                    None
                } else {
                    match Command::try_from(frame.command) {
                        Ok(Command::Exit) => None,
                        Ok(Command::GetAttendance) => {
                            let payload: Vec<u8> = state.records.iter().flatten().copied().collect();
                            Some((Command::AckData, payload))
                        }
                        Ok(Command::ClearAttendance) => {
                            state.records.clear();
                            Some((Command::AckOk, Vec::new()))
                        }
                        _ => Some((Command::AckOk, Vec::new())),
                    }
                }
            };

            if let Some((command, payload)) = reply {
                let datagram = CommandFrame::new(command, SESSION_ID, frame.reply_id, payload).encode();
                let _ = socket.send_to(&datagram, peer).await;
            }
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn received_commands(&self) -> Vec<u16> {
        self.state.lock().unwrap().received.iter().map(|f| f.command).collect()
    }

    pub fn stored_records(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }
}

impl Drop for FakeDevice {
    fn drop(&mut self) {
        self.task.abort();
    }
}
