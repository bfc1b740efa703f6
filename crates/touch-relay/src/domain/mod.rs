//! Domain layer for touch-relay.
//!
//! The relay is deliberately content-agnostic, so the only domain type is
//! its configuration.

pub mod config;

pub use config::RelayConfig;
