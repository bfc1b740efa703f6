//! WebSocket server: accept loop and per-peer task management.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming TCP connections.
//! 3. Upgrading each connection to a WebSocket, but only on the configured
//!    path (anything else gets `404 Not Found` during the handshake).
//! 4. Registering the peer and running two halves per peer:
//!    - **Reader**: each inbound text frame is fanned out to all other peers.
//!    - **Writer**: drains the peer's outbound queue onto its socket.
//! 5. Unregistering the peer when its socket closes.
//! 6. Stopping when the `running` flag is cleared.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        handshake::server::{ErrorResponse, Request, Response},
        http::StatusCode,
        Error as WsError, Message as WsMessage,
    },
};
use tracing::{debug, error, info, warn};

use crate::application::PeerRegistry;
use crate::domain::config::RelayConfig;

/// How long one `accept()` waits before re-checking the shutdown flag.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// How long a departing peer's writer may take to flush and close.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

// ── Public API ────────────────────────────────────────────────────────────────

/// A bound relay, ready to serve.
///
/// Binding and serving are separate so callers (and tests) can learn the
/// actual port when binding to port 0.
pub struct RelayServer {
    listener: TcpListener,
    config: Arc<RelayConfig>,
    registry: PeerRegistry,
}

impl RelayServer {
    /// Binds the listener described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is in use or cannot be bound.
    pub async fn bind(config: RelayConfig) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .with_context(|| format!("failed to bind relay listener on {}", config.bind_addr))?;

        Ok(Self {
            listener,
            config: Arc::new(config),
            registry: PeerRegistry::new(),
        })
    }

    /// The address actually bound (resolves port 0).
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("failed to read relay listener address")
    }

    /// Handle to the live peer set.
    pub fn registry(&self) -> PeerRegistry {
        self.registry.clone()
    }

    /// Accepts peers until `running` is set to `false`.
    pub async fn serve(self, running: Arc<AtomicBool>) -> anyhow::Result<()> {
        let addr = self.local_addr()?;
        info!(
            "relay listening on ws://{addr}{} (fan-out to all other peers)",
            self.config.ws_path
        );

        loop {
            if !running.load(Ordering::Relaxed) {
                info!("shutdown flag set; stopping accept loop");
                break;
            }

            // Short timeout so the loop re-checks `running` even when idle.
            match timeout(ACCEPT_POLL, self.listener.accept()).await {
                Ok(Ok((stream, peer_addr))) => {
                    debug!("tcp connection from {peer_addr}");
                    let config = Arc::clone(&self.config);
                    let registry = self.registry.clone();
                    tokio::spawn(async move {
                        handle_peer(stream, peer_addr, config, registry).await;
                    });
                }
                Ok(Err(e)) => {
                    // Transient accept error (e.g. too many open files).
                    error!("accept error: {e}");
                }
                Err(_) => {}
            }
        }

        Ok(())
    }
}

/// Binds and serves in one call.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn run_server(config: RelayConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    RelayServer::bind(config).await?.serve(running).await
}

// ── Per-peer handler ──────────────────────────────────────────────────────────

/// Wraps [`run_peer`] and logs the outcome.
async fn handle_peer(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<RelayConfig>,
    registry: PeerRegistry,
) {
    match run_peer(raw_stream, peer_addr, config, registry).await {
        Ok(()) => debug!("peer {peer_addr} session ended"),
        Err(e) => warn!("peer {peer_addr} rejected: {e:#}"),
    }
}

/// Runs the full lifecycle of one peer connection.
///
/// # Errors
///
/// Returns an error only if the WebSocket handshake fails.  Errors after the
/// handshake end the session and are logged, not returned.
async fn run_peer(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<RelayConfig>,
    registry: PeerRegistry,
) -> anyhow::Result<()> {
    let ws_path = config.ws_path.clone();
    let ws_stream = accept_hdr_async(raw_stream, move |req: &Request, resp: Response| {
        check_upgrade_path(&ws_path, req, resp)
    })
    .await
    .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    let (peer_id, mut outbound) = registry.register().await;
    info!(
        "peer {peer_id} connected from {peer_addr}. Total peers: {}",
        registry.len().await
    );

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    // ── Writer: outbound queue → socket ───────────────────────────────────────
    let mut writer = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if ws_tx.send(WsMessage::Text(text)).await.is_err() {
                debug!("peer {peer_id}: send failed (socket closed)");
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    // ── Reader: socket → fan-out ──────────────────────────────────────────────
    loop {
        let frame = match ws_rx.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                debug!("peer {peer_id}: closed");
                break;
            }
            Some(Err(e)) => {
                warn!("peer {peer_id}: WebSocket error: {e}");
                break;
            }
            None => break,
        };

        match frame {
            WsMessage::Text(text) => {
                debug!("peer {peer_id}: received {text}");
                let delivered = registry.broadcast_from(peer_id, &text).await;
                debug!("peer {peer_id}: forwarded to {delivered} peer(s)");
            }
            WsMessage::Binary(bytes) => {
                warn!(
                    "peer {peer_id}: binary frame ({} bytes) ignored; relay forwards text only",
                    bytes.len()
                );
            }
            WsMessage::Close(_) => {
                debug!("peer {peer_id}: Close frame received");
                break;
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
        }
    }

    // Unregistering drops the queue's only sender, so the writer drains what
    // is left and then closes its half, which also flushes tungstenite's
    // reply to a peer-initiated Close.
    registry.unregister(peer_id).await;
    if timeout(CLOSE_GRACE, &mut writer).await.is_err() {
        debug!("peer {peer_id}: writer did not finish closing; aborting");
        writer.abort();
    }
    info!(
        "peer {peer_id} disconnected. Total peers: {}",
        registry.len().await
    );

    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Handshake callback: accept the upgrade only on `expected_path`.
#[allow(clippy::result_large_err)]
fn check_upgrade_path(
    expected_path: &str,
    req: &Request,
    resp: Response,
) -> Result<Response, ErrorResponse> {
    let path = req.uri().path();
    if path == expected_path {
        return Ok(resp);
    }
    let mut rejection = ErrorResponse::new(Some(format!("no WebSocket endpoint at {path}")));
    *rejection.status_mut() = StatusCode::NOT_FOUND;
    Err(rejection)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
