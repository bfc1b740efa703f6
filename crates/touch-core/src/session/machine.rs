//! Connection lifecycle state machine with exponential-backoff reconnection.
//!
//! [`ConnectionMachine`] is the transition table only.  It performs no I/O
//! and owns no timers: each input returns the list of [`ConnectionAction`]s
//! the driver must carry out (open a socket, arm a timer, notify observers).
//! The Tokio driver in `touch-client` owns the real transport and feeds
//! transport events back in.
//!
//! # Transition table
//!
//! | Input                | Effect                                                        |
//! |----------------------|---------------------------------------------------------------|
//! | `connect()`          | no-op if open or opening; else retry = 0, `Connecting`, open   |
//! | `reconnect_due()`    | timer fired: `Connecting`, open (retry counter kept)           |
//! | `transport_opened()` | `Connected`, retry = 0, notify connected                       |
//! | `message_received()` | valid → remember + deliver + publish; invalid → drop           |
//! | `transport_error()`  | notify error, state unchanged                                  |
//! | `transport_closed()` | `Disconnected`, notify; retry < max → schedule, else `Error`   |
//! | `construction_failed()` | `Error` immediately, no retry                               |
//! | `disconnect()`       | cancel timer, retry = max, close, `Disconnected`, forget message |
//!
//! # Backoff
//!
//! The k-th automatic retry (k starting at 1) waits
//! `base_interval * 2^(k-1)`: 1 s, 2 s, 4 s, 8 s, 16 s with the defaults.

use std::time::Duration;

use tracing::debug;

use crate::protocol::codec::decode;
use crate::protocol::messages::GestureMessage;
use crate::session::state::{ConnectionSnapshot, ConnectionState};

/// Default number of automatic reconnects before entering `Error`.
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 5;
/// Default base delay for the first automatic reconnect.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(1000);

/// Retry budget and base delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            base_interval: DEFAULT_RECONNECT_INTERVAL,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before automatic retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        backoff_delay(self.base_interval, attempt)
    }
}

/// Returns `base * 2^(attempt-1)`, saturating instead of overflowing.
///
/// `attempt` 0 is treated like 1.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1);
    let factor = 2u32.checked_pow(exponent).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

/// Side effects requested by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionAction {
    /// Start opening a new transport.
    OpenTransport,
    /// Close the live transport or abandon the in-flight attempt.
    CloseTransport,
    /// Arm the reconnect timer; call [`ConnectionMachine::reconnect_due`] when it fires.
    ScheduleReconnect { attempt: u32, delay: Duration },
    /// Disarm the reconnect timer.
    CancelReconnect,
    /// The snapshot should be (re-)published to observers.
    Publish,
    NotifyConnected,
    NotifyDisconnected,
    NotifyError(String),
    /// A valid message arrived and should be handed to consumers.
    Deliver(GestureMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransportPhase {
    Idle,
    Opening,
    Open,
}

/// Pure connection lifecycle state machine.
#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    policy: ReconnectPolicy,
    state: ConnectionState,
    retry_count: u32,
    last_message: Option<GestureMessage>,
    transport: TransportPhase,
    reconnect_pending: bool,
}

impl ConnectionMachine {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState::Disconnected,
            retry_count: 0,
            last_message: None,
            transport: TransportPhase::Idle,
            reconnect_pending: false,
        }
    }

    pub fn policy(&self) -> ReconnectPolicy {
        self.policy
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn last_message(&self) -> Option<GestureMessage> {
        self.last_message
    }

    pub fn is_reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    /// `true` while a transport is open or being opened.
    pub fn has_transport(&self) -> bool {
        self.transport != TransportPhase::Idle
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            state: self.state,
            last_message: self.last_message,
            retry_count: self.retry_count,
        }
    }

    /// Caller-initiated connect.
    ///
    /// Resets the retry budget, which is also how a caller recovers from
    /// the terminal `Error` state.
    pub fn connect(&mut self) -> Vec<ConnectionAction> {
        if self.transport != TransportPhase::Idle {
            debug!(state = %self.state, "connect ignored: transport already live");
            return Vec::new();
        }
        self.retry_count = 0;
        self.begin_attempt()
    }

    /// The reconnect timer fired.
    pub fn reconnect_due(&mut self) -> Vec<ConnectionAction> {
        if !self.reconnect_pending {
            return Vec::new();
        }
        self.reconnect_pending = false;
        if self.transport != TransportPhase::Idle {
            return Vec::new();
        }
        debug!(attempt = self.retry_count, "reconnect timer fired");
        self.begin_attempt()
    }

    pub fn transport_opened(&mut self) -> Vec<ConnectionAction> {
        if self.transport != TransportPhase::Opening {
            return Vec::new();
        }
        self.transport = TransportPhase::Open;
        self.state = ConnectionState::Connected;
        self.retry_count = 0;
        vec![ConnectionAction::Publish, ConnectionAction::NotifyConnected]
    }

    /// Decodes one inbound text frame.  Malformed text is dropped here.
    pub fn message_received(&mut self, text: &str) -> Vec<ConnectionAction> {
        if self.transport != TransportPhase::Open {
            return Vec::new();
        }
        match decode(text) {
            Ok(msg) => {
                self.last_message = Some(msg);
                vec![ConnectionAction::Deliver(msg), ConnectionAction::Publish]
            }
            Err(e) => {
                debug!("dropping invalid gesture message: {e}");
                Vec::new()
            }
        }
    }

    /// A transport error was reported.  The following close drives the
    /// state change.
    pub fn transport_error(&mut self, detail: impl Into<String>) -> Vec<ConnectionAction> {
        if self.transport == TransportPhase::Idle {
            return Vec::new();
        }
        vec![ConnectionAction::NotifyError(detail.into())]
    }

    pub fn transport_closed(&mut self) -> Vec<ConnectionAction> {
        if self.transport == TransportPhase::Idle {
            return Vec::new();
        }
        self.transport = TransportPhase::Idle;
        self.state = ConnectionState::Disconnected;

        let mut actions = vec![
            ConnectionAction::Publish,
            ConnectionAction::NotifyDisconnected,
        ];

        if self.retry_count < self.policy.max_attempts {
            self.retry_count += 1;
            let delay = self.policy.delay_for(self.retry_count);
            self.reconnect_pending = true;
            debug!(attempt = self.retry_count, ?delay, "scheduling reconnect");
            actions.push(ConnectionAction::ScheduleReconnect {
                attempt: self.retry_count,
                delay,
            });
        } else {
            debug!(
                attempts = self.retry_count,
                "reconnect budget exhausted; entering error state"
            );
            self.state = ConnectionState::Error;
            actions.push(ConnectionAction::Publish);
        }
        actions
    }

    /// The transport could not even be created (e.g. unusable address).
    pub fn construction_failed(&mut self) -> Vec<ConnectionAction> {
        self.transport = TransportPhase::Idle;
        self.state = ConnectionState::Error;
        vec![ConnectionAction::Publish]
    }

    /// Caller-initiated disconnect.  Suppresses automatic reconnection.
    pub fn disconnect(&mut self) -> Vec<ConnectionAction> {
        let mut actions = Vec::new();
        if self.reconnect_pending {
            self.reconnect_pending = false;
            actions.push(ConnectionAction::CancelReconnect);
        }
        self.retry_count = self.policy.max_attempts;
        if self.transport != TransportPhase::Idle {
            self.transport = TransportPhase::Idle;
            actions.push(ConnectionAction::CloseTransport);
        }
        self.state = ConnectionState::Disconnected;
        self.last_message = None;
        actions.push(ConnectionAction::Publish);
        actions
    }

    fn begin_attempt(&mut self) -> Vec<ConnectionAction> {
        let mut actions = Vec::new();
        if self.reconnect_pending {
            self.reconnect_pending = false;
            actions.push(ConnectionAction::CancelReconnect);
        }
        self.state = ConnectionState::Connecting;
        self.transport = TransportPhase::Opening;
        actions.push(ConnectionAction::Publish);
        actions.push(ConnectionAction::OpenTransport);
        actions
    }
}

impl Default for ConnectionMachine {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(max_attempts: u32) -> ConnectionMachine {
        ConnectionMachine::new(ReconnectPolicy {
            max_attempts,
            base_interval: Duration::from_millis(1000),
        })
    }

    /// Drives the machine into `Connected`.
    fn connected(max_attempts: u32) -> ConnectionMachine {
        let mut m = machine(max_attempts);
        m.connect();
        m.transport_opened();
        m
    }

    fn scheduled(actions: &[ConnectionAction]) -> Option<(u32, Duration)> {
        actions.iter().find_map(|a| match a {
            ConnectionAction::ScheduleReconnect { attempt, delay } => Some((*attempt, *delay)),
            _ => None,
        })
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let base = Duration::from_millis(1000);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(2000));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(4000));
        assert_eq!(backoff_delay(base, 5), Duration::from_millis(16000));
    }

    #[test]
    fn test_backoff_saturates_on_huge_attempt() {
        let delay = backoff_delay(Duration::from_secs(1), 200);
        assert_eq!(delay, Duration::from_secs(u32::MAX as u64));
    }

    #[test]
    fn test_new_machine_is_disconnected() {
        let m = machine(5);
        assert_eq!(m.state(), ConnectionState::Disconnected);
        assert_eq!(m.retry_count(), 0);
        assert!(!m.has_transport());
    }

    #[test]
    fn test_connect_moves_to_connecting_and_opens() {
        // Arrange
        let mut m = machine(5);

        // Act
        let actions = m.connect();

        // Assert
        assert_eq!(m.state(), ConnectionState::Connecting);
        assert!(actions.contains(&ConnectionAction::OpenTransport));
    }

    #[test]
    fn test_connect_while_connecting_is_noop() {
        let mut m = machine(5);
        m.connect();
        assert!(m.connect().is_empty(), "second attempt must not be started");
    }

    #[test]
    fn test_connect_while_connected_is_noop() {
        let mut m = connected(5);
        assert!(m.connect().is_empty());
        assert_eq!(m.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_open_resets_retry_counter_and_notifies() {
        let mut m = machine(5);
        m.connect();
        m.transport_closed();
        assert_eq!(m.retry_count(), 1);
        m.reconnect_due();

        let actions = m.transport_opened();

        assert_eq!(m.state(), ConnectionState::Connected);
        assert_eq!(m.retry_count(), 0);
        assert!(actions.contains(&ConnectionAction::NotifyConnected));
    }

    #[test]
    fn test_valid_message_is_delivered_and_remembered() {
        let mut m = connected(5);
        let actions = m.message_received(r#"{"phase":"move","dx":1,"dy":2}"#);
        let expected = GestureMessage::moved(1.0, 2.0);
        assert_eq!(
            actions,
            vec![
                ConnectionAction::Deliver(expected),
                ConnectionAction::Publish
            ]
        );
        assert_eq!(m.last_message(), Some(expected));
        assert_eq!(m.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_invalid_message_is_dropped_silently() {
        let mut m = connected(5);
        let actions = m.message_received(r#"{"phase":"wiggle","dx":1,"dy":2}"#);
        assert!(actions.is_empty());
        assert_eq!(m.last_message(), None);
        assert_eq!(m.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_transport_error_notifies_without_state_change() {
        let mut m = connected(5);
        let actions = m.transport_error("reset by peer");
        assert_eq!(
            actions,
            vec![ConnectionAction::NotifyError("reset by peer".to_string())]
        );
        assert_eq!(m.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_close_schedules_first_retry_at_base_interval() {
        let mut m = connected(5);
        let actions = m.transport_closed();
        assert_eq!(m.state(), ConnectionState::Disconnected);
        assert!(actions.contains(&ConnectionAction::NotifyDisconnected));
        assert_eq!(scheduled(&actions), Some((1, Duration::from_millis(1000))));
        assert!(m.is_reconnect_pending());
    }

    #[test]
    fn test_consecutive_failures_back_off_then_enter_error() {
        // Arrange: every attempt fails before opening.
        let mut m = machine(5);
        m.connect();
        let mut delays = Vec::new();

        // Act
        for _ in 0..5 {
            let actions = m.transport_closed();
            let (_, delay) = scheduled(&actions).expect("retry must be scheduled");
            delays.push(delay.as_millis());
            m.reconnect_due();
        }
        let final_actions = m.transport_closed();

        // Assert
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000]);
        assert_eq!(scheduled(&final_actions), None);
        assert_eq!(m.state(), ConnectionState::Error);
        assert!(!m.is_reconnect_pending());
    }

    #[test]
    fn test_zero_attempt_budget_errors_on_first_close() {
        let mut m = connected(0);
        let actions = m.transport_closed();
        assert_eq!(scheduled(&actions), None);
        assert_eq!(m.state(), ConnectionState::Error);
    }

    #[test]
    fn test_error_state_recovers_only_on_explicit_connect() {
        let mut m = connected(0);
        m.transport_closed();
        assert_eq!(m.state(), ConnectionState::Error);
        assert!(m.reconnect_due().is_empty(), "no timer is pending in Error");

        let actions = m.connect();

        assert_eq!(m.state(), ConnectionState::Connecting);
        assert_eq!(m.retry_count(), 0);
        assert!(actions.contains(&ConnectionAction::OpenTransport));
    }

    #[test]
    fn test_disconnect_cancels_pending_reconnect() {
        let mut m = connected(5);
        m.transport_closed();
        assert!(m.is_reconnect_pending());

        let actions = m.disconnect();

        assert!(actions.contains(&ConnectionAction::CancelReconnect));
        assert!(!m.is_reconnect_pending());
        assert!(m.reconnect_due().is_empty(), "a stale timer must not reconnect");
        assert_eq!(m.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_disconnect_closes_transport_and_forgets_message() {
        let mut m = connected(5);
        m.message_received(r#"{"phase":"tap","dx":0,"dy":0}"#);

        let actions = m.disconnect();

        assert!(actions.contains(&ConnectionAction::CloseTransport));
        assert_eq!(m.last_message(), None);
        assert_eq!(m.retry_count(), 5);
        assert!(!m.has_transport());
    }

    #[test]
    fn test_close_after_disconnect_is_ignored() {
        let mut m = connected(5);
        m.disconnect();
        assert!(m.transport_closed().is_empty());
        assert_eq!(m.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_construction_failure_enters_error_without_retry() {
        let mut m = machine(5);
        m.connect();
        let actions = m.construction_failed();
        assert_eq!(actions, vec![ConnectionAction::Publish]);
        assert_eq!(m.state(), ConnectionState::Error);
        assert!(!m.is_reconnect_pending());
    }

    #[test]
    fn test_explicit_connect_during_backoff_cancels_timer() {
        let mut m = connected(5);
        m.transport_closed();
        let actions = m.connect();
        assert_eq!(actions.first(), Some(&ConnectionAction::CancelReconnect));
        assert!(actions.contains(&ConnectionAction::OpenTransport));
        assert!(!m.is_reconnect_pending());
    }

    #[test]
    fn test_snapshot_reflects_fields() {
        let mut m = connected(5);
        m.message_received(r#"{"phase":"start","dx":0,"dy":0}"#);
        let snap = m.snapshot();
        assert_eq!(snap.state, ConnectionState::Connected);
        assert_eq!(snap.last_message, Some(GestureMessage::start()));
        assert_eq!(snap.retry_count, 0);
    }
}
