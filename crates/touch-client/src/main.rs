//! Touch client: entry point.
//!
//! Runs one of the two client roles against a relay.
//!
//! # Usage
//!
//! ```text
//! touch-client [--config FILE] [--url URL] display
//! touch-client [--config FILE] [--url URL] send
//! ```
//!
//! - `display` logs every marker move and tap it tracks.
//! - `send` reads pointer events from stdin, one per line (`down X Y`,
//!   `move X Y`, `up`, `cancel`), and relays them as gestures.
//!
//! # Environment variable overrides
//!
//! | Variable              | Description             |
//! |-----------------------|-------------------------|
//! | `TOUCH_CLIENT_CONFIG` | Path to the TOML config |
//! | `TOUCH_CLIENT_URL`    | Relay URL override      |
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use touch_client::{
    load_config, ClientConfig, ConnectionManager, GestureListener, GestureSender, PointerEvent,
    TouchDisplay,
};
use touch_core::{ConnectionSnapshot, ConnectionState, GestureTracker, Position};

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "touch-client",
    about = "Sends or displays relayed touch gestures",
    version
)]
struct Cli {
    /// TOML configuration file.  Built-in defaults apply when omitted.
    #[arg(long, env = "TOUCH_CLIENT_CONFIG")]
    config: Option<PathBuf>,

    /// Relay URL; overrides `url` from the config file.
    #[arg(long, env = "TOUCH_CLIENT_URL")]
    url: Option<String>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Mode {
    /// Track relayed gestures and log marker moves and taps.
    Display,
    /// Read pointer events from stdin and relay them.
    Send,
}

impl Cli {
    /// Loads the config file (if any) and applies CLI overrides.
    fn resolve_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = load_config(self.config.as_deref()).context("failed to load config")?;
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    info!("touch client starting in {:?} mode, relay={}", cli.mode, config.url);

    match cli.mode {
        Mode::Display => run_display(config).await,
        Mode::Send => run_send(config).await,
    }
}

// ── Display mode ──────────────────────────────────────────────────────────────

/// Listener that reports marker updates to the log.
struct LogListener;

impl GestureListener for LogListener {
    fn on_move(&mut self, position: Position) {
        info!("marker at ({:.1}, {:.1})", position.x, position.y);
    }

    fn on_tap(&mut self, position: Position) {
        info!("tap at ({:.1}, {:.1})", position.x, position.y);
    }
}

async fn run_display(config: ClientConfig) -> anyhow::Result<()> {
    let tracker = GestureTracker::new(config.tracker_config(), config.viewport());
    let mut display = TouchDisplay::new(tracker, LogListener);

    let (manager, mut events) = ConnectionManager::spawn(config.connection_config());
    let mut snapshots = manager.subscribe();
    manager.connect();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    display.handle_event(&event);
                }
                None => break,
            },
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = snapshots.borrow_and_update().state;
                display.set_connection_state(state);
                if state == ConnectionState::Error {
                    warn!("giving up on {}; restart to try again", config.url);
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl+C, shutting down");
                break;
            }
        }
    }

    manager.shutdown().await;
    info!("touch client stopped");
    Ok(())
}

// ── Send mode ─────────────────────────────────────────────────────────────────

async fn run_send(config: ClientConfig) -> anyhow::Result<()> {
    let (manager, _events) = ConnectionManager::spawn(config.connection_config());
    let mut snapshots = manager.subscribe();
    manager.connect();

    // Messages sent before the socket opens would be dropped.
    wait_until_connected(&mut snapshots).await?;

    let mut sender = GestureSender::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let event: PointerEvent = match line.parse() {
            Ok(event) => event,
            Err(e) => {
                warn!("skipping line '{line}': {e}");
                continue;
            }
        };
        if let Some(msg) = sender.handle(event) {
            manager.send(msg);
        }
    }

    manager.shutdown().await;
    info!("stdin closed; touch client stopped");
    Ok(())
}

async fn wait_until_connected(
    snapshots: &mut watch::Receiver<ConnectionSnapshot>,
) -> anyhow::Result<()> {
    let snapshot = *snapshots
        .wait_for(|s| matches!(s.state, ConnectionState::Connected | ConnectionState::Error))
        .await
        .context("connection driver stopped")?;
    if snapshot.state == ConnectionState::Error {
        bail!(
            "could not reach the relay after {} retries",
            snapshot.retry_count
        );
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
