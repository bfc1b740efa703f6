//! Touch relay: entry point.
//!
//! Runs the WebSocket fan-out relay.  Senders and displays connect to the
//! same endpoint; every text frame one peer sends is forwarded to all other
//! peers.
//!
//! # Usage
//!
//! ```text
//! touch-relay [OPTIONS]
//!
//! Options:
//!   --port <PORT>   Listener port            [default: 8080]
//!   --bind <ADDR>   Listener address         [default: 0.0.0.0]
//!   --path <PATH>   WebSocket upgrade path   [default: /ws]
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable           | Default   | Description            |
//! |--------------------|-----------|------------------------|
//! | `TOUCH_RELAY_PORT` | `8080`    | Listener port          |
//! | `TOUCH_RELAY_BIND` | `0.0.0.0` | Listener address       |
//! | `TOUCH_RELAY_PATH` | `/ws`     | WebSocket upgrade path |
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use touch_relay::domain::config::DEFAULT_WS_PATH;
use touch_relay::domain::RelayConfig;
use touch_relay::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// WebSocket fan-out relay for touch gestures.
#[derive(Debug, Parser)]
#[command(
    name = "touch-relay",
    about = "Forwards every message from one WebSocket peer to all other peers",
    version
)]
struct Cli {
    /// TCP port for the WebSocket listener.
    #[arg(long, default_value_t = 8080, env = "TOUCH_RELAY_PORT")]
    port: u16,

    /// IP address to bind to.
    ///
    /// `0.0.0.0` accepts connections on every interface; `127.0.0.1` only
    /// accepts local ones.
    #[arg(long, default_value = "0.0.0.0", env = "TOUCH_RELAY_BIND")]
    bind: String,

    /// Request path on which WebSocket upgrades are accepted.
    #[arg(long, default_value = DEFAULT_WS_PATH, env = "TOUCH_RELAY_PATH")]
    path: String,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`RelayConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not an IP address or `--path` does not
    /// start with `/`.
    fn into_relay_config(self) -> anyhow::Result<RelayConfig> {
        let bind_addr: SocketAddr = format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("invalid bind address: '{}:{}'", self.bind, self.port))?;

        if !self.path.starts_with('/') {
            bail!("invalid WebSocket path '{}': must start with '/'", self.path);
        }

        Ok(RelayConfig {
            bind_addr,
            ws_path: self.path,
        })
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

    let config = Cli::parse().into_relay_config()?;

    info!(
        "touch relay starting, bind={}, path={}",
        config.bind_addr, config.ws_path
    );

    // The accept loop polls this flag every 200 ms.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config, running).await?;

    info!("touch relay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
