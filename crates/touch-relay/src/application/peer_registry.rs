//! The set of open peers and the fan-out rule.
//!
//! Each connected peer registers an unbounded outbound queue.  Forwarding a
//! message means pushing a copy onto every *other* peer's queue; the peer's
//! own writer task drains the queue onto its socket.  Nothing is stored for
//! peers that are not connected at forward time (at-most-once delivery).
//!
//! # Ordering
//!
//! Peers are keyed by a [`PeerId`] taken from a monotonically increasing
//! counter, and held in a `BTreeMap`, so fan-out visits peers in the order
//! they joined.
//!
//! # Concurrency
//!
//! Peer tasks run on Tokio's multi-threaded runtime, so the map sits behind
//! a `tokio::sync::RwLock`: register/unregister take the write lock,
//! fan-out takes the read lock.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::trace;

/// Join-ordered identifier of one connected peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(u64);

impl PeerId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared handle to the set of open peers.  Cloning is cheap.
#[derive(Debug, Clone, Default)]
pub struct PeerRegistry {
    peers: Arc<RwLock<BTreeMap<PeerId, mpsc::UnboundedSender<String>>>>,
    next_id: Arc<AtomicU64>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a peer and returns its id plus the queue its writer should drain.
    pub async fn register(&self) -> (PeerId, mpsc::UnboundedReceiver<String>) {
        let id = PeerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        self.peers.write().await.insert(id, tx);
        (id, rx)
    }

    /// Removes a peer.  Returns `false` if it was not registered.
    pub async fn unregister(&self, id: PeerId) -> bool {
        self.peers.write().await.remove(&id).is_some()
    }

    /// Forwards `text` to every registered peer except `from`.
    ///
    /// Returns the number of peers the message was queued for.  A peer whose
    /// writer has already gone away is skipped; its reader will unregister it.
    pub async fn broadcast_from(&self, from: PeerId, text: &str) -> usize {
        let peers = self.peers.read().await;
        let mut delivered = 0;
        for (id, tx) in peers.iter() {
            if *id == from {
                continue;
            }
            if tx.send(text.to_owned()).is_ok() {
                delivered += 1;
            } else {
                trace!("peer {id} queue closed; skipping");
            }
        }
        delivered
    }

    pub async fn len(&self) -> usize {
        self.peers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.peers.read().await.is_empty()
    }

    /// Ids of all open peers in join order.
    pub async fn peer_ids(&self) -> Vec<PeerId> {
        self.peers.read().await.keys().copied().collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
