//! Reconnecting WebSocket connection to the relay.
//!
//! Each [`ConnectionManager`] owns one background Tokio task (the *driver*).
//! The driver is the only place the [`ConnectionMachine`] is mutated, so
//! transport events are always handled one at a time.
//!
//! # How the driver works (for beginners)
//!
//! The driver sits in a `tokio::select!` loop waiting on four sources:
//!
//! ```text
//!   commands ─────────┐
//!   connect attempt ──┤
//!   open socket ──────┼──► ConnectionMachine ──► actions ──► socket / timer / observers
//!   reconnect timer ──┘
//! ```
//!
//! Each source is optional.  When a source is absent (no socket open, no
//! timer armed) its branch waits on [`std::future::pending`] and never
//! fires.  The machine answers every input with a list of
//! [`ConnectionAction`]s, which the driver carries out.
//!
//! # Observing the connection
//!
//! - [`ConnectionManager::subscribe`] returns a `watch` receiver holding the
//!   latest [`ConnectionSnapshot`] (state, last message, retry count).
//! - The `mpsc` receiver returned by [`ConnectionManager::spawn`] delivers
//!   discrete [`ConnectionEvent`]s: open, close, error, and each valid
//!   inbound message.

use std::future::Future;
use std::pin::Pin;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout, Duration, Instant};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use touch_core::session::machine::ConnectionAction;
use touch_core::{
    encode_message, ConnectionMachine, ConnectionSnapshot, ConnectionState, GestureMessage,
    ReconnectPolicy,
};

use super::config::DEFAULT_URL;

/// How long a closing socket may take to finish the handshake.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type ConnectFuture = Pin<Box<dyn Future<Output = Result<WsStream, WsError>> + Send>>;

/// Where to connect and how hard to retry.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    pub url: String,
    pub policy: ReconnectPolicy,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            policy: ReconnectPolicy::default(),
        }
    }
}

/// Discrete notifications emitted by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// The socket opened.
    Connected,
    /// An open (or opening) socket closed.
    Disconnected,
    /// The transport reported an error.  A `Disconnected` usually follows.
    Error(String),
    /// A valid gesture message arrived.
    Message(GestureMessage),
}

/// Requests from the handle to the driver task.
#[derive(Debug)]
enum Command {
    Connect,
    Disconnect,
    SetUrl(String),
    Send(GestureMessage),
    Shutdown,
}

// ── Public handle ─────────────────────────────────────────────────────────────

/// Handle to one managed connection.
///
/// Methods only enqueue a command, so they never block and may be called
/// from any task.  Dropping the handle stops the driver.
pub struct ConnectionManager {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<ConnectionSnapshot>,
    task: JoinHandle<()>,
}

impl ConnectionManager {
    /// Starts the driver task in the `Disconnected` state.
    ///
    /// Nothing is opened until [`connect`](Self::connect) is called.  Must be
    /// called from within a Tokio runtime.
    pub fn spawn(config: ConnectionConfig) -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let machine = ConnectionMachine::new(config.policy);
        let (snapshot_tx, snapshot_rx) = watch::channel(machine.snapshot());

        let driver = Driver {
            url: config.url,
            machine,
            pending: None,
            transport: None,
            reconnect_at: None,
            snapshot: snapshot_tx,
            events: event_tx,
        };
        let task = tokio::spawn(driver.run(cmd_rx));

        (
            Self {
                commands: cmd_tx,
                snapshot: snapshot_rx,
                task,
            },
            event_rx,
        )
    }

    /// Opens the connection, resetting the retry budget.
    ///
    /// Ignored while a socket is already open or being opened.  This is also
    /// how a caller leaves the terminal `Error` state.
    pub fn connect(&self) {
        self.command(Command::Connect);
    }

    /// Closes the connection and suppresses automatic reconnects.
    pub fn disconnect(&self) {
        self.command(Command::Disconnect);
    }

    /// Switches to a new relay URL: disconnect, then connect to `url`.
    pub fn set_url(&self, url: impl Into<String>) {
        self.command(Command::SetUrl(url.into()));
    }

    /// Sends one message if the connection is open; otherwise drops it.
    pub fn send(&self, msg: GestureMessage) {
        self.command(Command::Send(msg));
    }

    pub fn state(&self) -> ConnectionState {
        self.snapshot.borrow().state
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        *self.snapshot.borrow()
    }

    /// A fresh receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.snapshot.clone()
    }

    /// Disconnects and waits for the driver task to finish.
    pub async fn shutdown(self) {
        self.command(Command::Shutdown);
        if let Err(e) = self.task.await {
            warn!("connection driver ended abnormally: {e}");
        }
    }

    fn command(&self, cmd: Command) {
        if self.commands.send(cmd).is_err() {
            debug!("connection driver already stopped; command dropped");
        }
    }
}

// ── Driver task ───────────────────────────────────────────────────────────────

struct Driver {
    url: String,
    machine: ConnectionMachine,
    /// In-flight connect attempt.
    pending: Option<ConnectFuture>,
    /// Open socket.
    transport: Option<WsStream>,
    reconnect_at: Option<Instant>,
    snapshot: watch::Sender<ConnectionSnapshot>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
}

impl Driver {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.on_command(cmd).await,
                },
                result = next_connect(&mut self.pending) => {
                    self.pending = None;
                    self.on_connect_result(result);
                }
                frame = next_frame(&mut self.transport) => self.on_frame(frame),
                () = reconnect_timer(self.reconnect_at) => {
                    self.reconnect_at = None;
                    let actions = self.machine.reconnect_due();
                    self.apply(actions);
                }
            }
        }

        let actions = self.machine.disconnect();
        self.apply(actions);
        debug!("connection driver stopped");
    }

    async fn on_command(&mut self, cmd: Command) {
        match cmd {
            Command::Connect => {
                let actions = self.machine.connect();
                self.apply(actions);
            }
            Command::Disconnect => {
                let actions = self.machine.disconnect();
                self.apply(actions);
            }
            Command::SetUrl(url) => {
                info!("relay url changed to {url}");
                let actions = self.machine.disconnect();
                self.apply(actions);
                self.url = url;
                let actions = self.machine.connect();
                self.apply(actions);
            }
            Command::Send(msg) => self.send(msg).await,
            Command::Shutdown => {}
        }
    }

    async fn send(&mut self, msg: GestureMessage) {
        if self.machine.state() != ConnectionState::Connected {
            debug!(state = %self.machine.state(), "not connected; dropping {}", msg.phase);
            return;
        }
        let Some(ws) = self.transport.as_mut() else {
            return;
        };
        let text = match encode_message(&msg) {
            Ok(text) => text,
            Err(e) => {
                warn!("refusing to send gesture: {e}");
                return;
            }
        };
        if let Err(e) = ws.send(WsMessage::Text(text)).await {
            self.transport = None;
            self.transport_lost(Some(e.to_string()));
        }
    }

    fn on_connect_result(&mut self, result: Result<WsStream, WsError>) {
        match result {
            Ok(ws) => {
                info!("connected to {}", self.url);
                self.transport = Some(ws);
                let actions = self.machine.transport_opened();
                self.apply(actions);
            }
            Err(e) => {
                warn!("could not connect to {}: {e}", self.url);
                self.transport_lost(Some(e.to_string()));
            }
        }
    }

    fn on_frame(&mut self, frame: Option<Result<WsMessage, WsError>>) {
        match frame {
            Some(Ok(WsMessage::Text(text))) => {
                let actions = self.machine.message_received(&text);
                self.apply(actions);
            }
            Some(Ok(WsMessage::Close(_))) => {
                info!("connection to {} closed by peer", self.url);
                if let Some(ws) = self.transport.take() {
                    finish_close(ws);
                }
                self.transport_lost(None);
            }
            None => {
                info!("connection to {} closed", self.url);
                self.transport = None;
                self.transport_lost(None);
            }
            Some(Ok(WsMessage::Binary(bytes))) => {
                debug!("ignoring {} byte binary frame", bytes.len());
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!("connection to {} failed: {e}", self.url);
                self.transport = None;
                self.transport_lost(Some(e.to_string()));
            }
        }
    }

    /// Feeds an optional error followed by a close into the machine.
    fn transport_lost(&mut self, error: Option<String>) {
        if let Some(detail) = error {
            let actions = self.machine.transport_error(detail);
            self.apply(actions);
        }
        let actions = self.machine.transport_closed();
        self.apply(actions);
    }

    fn apply(&mut self, actions: Vec<ConnectionAction>) {
        for action in actions {
            match action {
                ConnectionAction::OpenTransport => self.open_transport(),
                ConnectionAction::CloseTransport => self.close_transport(),
                ConnectionAction::ScheduleReconnect { attempt, delay } => {
                    info!("reconnecting to {} in {delay:?} (attempt {attempt})", self.url);
                    self.reconnect_at = Some(Instant::now() + delay);
                }
                ConnectionAction::CancelReconnect => self.reconnect_at = None,
                ConnectionAction::Publish => {
                    self.snapshot.send_replace(self.machine.snapshot());
                }
                ConnectionAction::NotifyConnected => self.emit(ConnectionEvent::Connected),
                ConnectionAction::NotifyDisconnected => self.emit(ConnectionEvent::Disconnected),
                ConnectionAction::NotifyError(detail) => self.emit(ConnectionEvent::Error(detail)),
                ConnectionAction::Deliver(msg) => self.emit(ConnectionEvent::Message(msg)),
            }
        }
    }

    fn open_transport(&mut self) {
        match self.url.as_str().into_client_request() {
            Ok(request) => {
                debug!("opening {}", self.url);
                self.pending = Some(Box::pin(async move {
                    connect_async(request).await.map(|(ws, _response)| ws)
                }));
            }
            Err(e) => {
                warn!("cannot connect to '{}': {e}", self.url);
                let actions = self.machine.construction_failed();
                self.apply(actions);
            }
        }
    }

    /// Drops the in-flight attempt and closes the open socket, if any.
    fn close_transport(&mut self) {
        self.pending = None;
        if let Some(ws) = self.transport.take() {
            self.emit(ConnectionEvent::Disconnected);
            finish_close(ws);
        }
    }

    fn emit(&self, event: ConnectionEvent) {
        // No listener is fine; the snapshot channel still carries the state.
        let _ = self.events.send(event);
    }
}

/// Completes the close handshake off the driver task.
///
/// `close` sends our Close frame, or flushes the reply tungstenite queued
/// when the peer closed first.  Draining until the peer drops the socket
/// lets that reply reach it; the grace period bounds a peer that never does.
fn finish_close(mut ws: WsStream) {
    tokio::spawn(async move {
        let drain = async {
            let _ = ws.close(None).await;
            while let Some(Ok(_)) = ws.next().await {}
        };
        if timeout(CLOSE_GRACE, drain).await.is_err() {
            debug!("peer did not finish the close handshake in {CLOSE_GRACE:?}");
        }
    });
}

async fn next_connect(pending: &mut Option<ConnectFuture>) -> Result<WsStream, WsError> {
    match pending {
        Some(fut) => fut.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn next_frame(transport: &mut Option<WsStream>) -> Option<Result<WsMessage, WsError>> {
    match transport {
        Some(ws) => ws.next().await,
        None => std::future::pending().await,
    }
}

async fn reconnect_timer(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
