//! Application layer for touch-relay.
//!
//! Holds the set of currently open peers and implements fan-out.  Sockets
//! and framing stay in the infrastructure layer; a peer is represented here
//! only by the sending half of its outbound queue.

pub mod peer_registry;

pub use peer_registry::{PeerId, PeerRegistry};
