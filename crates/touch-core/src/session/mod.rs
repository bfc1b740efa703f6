//! Connection lifecycle: observable state and the reconnecting state machine.

pub mod machine;
pub mod state;

pub use machine::{
    backoff_delay, ConnectionAction, ConnectionMachine, ReconnectPolicy,
    DEFAULT_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_INTERVAL,
};
pub use state::{ConnectionSnapshot, ConnectionState};
