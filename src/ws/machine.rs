//! Connection lifecycle as an explicit, transport-agnostic state machine.
//!
//! The [`ConnectionManager`](super::ConnectionManager) drives this machine from
//! transport callbacks; tests drive it directly. Every transition appends the
//! observer notifications it produces, which the caller drains with
//! [`StateMachine::drain_events`].

use std::time::{Duration, Instant};

use super::config::ReconnectConfig;

/// Connection state tracking.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection has been requested yet
    #[default]
    Idle,
    /// A transport is being opened
    Connecting,
    /// Successfully connected
    Open {
        /// When the connection was established
        since: Instant,
    },
    /// A manual close is in progress
    Closing,
    /// Not connected; a reconnect may or may not be scheduled
    Closed,
}

impl ConnectionState {
    /// Check if the connection is currently active.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open { .. })
    }
}

/// Observer notification emitted by a state transition.
///
/// Observers use these for status display only; they never gate reconnection.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// A transport is being opened
    Connecting {
        /// Reconnection attempt this open belongs to (`0` for a fresh connect)
        attempt: u32,
    },
    /// The connection is open
    Connected,
    /// The connection closed; `retry_in` is set when a reconnect is scheduled
    Disconnected {
        /// Delay until the scheduled reconnect, if any
        retry_in: Option<Duration>,
    },
    /// The transport reported an error; the close that follows drives recovery
    Error {
        /// Transport-provided description
        message: String,
    },
    /// The transport could not be constructed at all
    Failed {
        /// Why construction failed
        message: String,
    },
    /// The reconnect budget is exhausted; no further automatic attempts
    GaveUp {
        /// Number of consecutive attempts made
        attempts: u32,
    },
}

/// Outcome of a connect request.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectDecision {
    /// A transport is already open or opening; nothing to do
    Skip,
    /// Open a new transport
    Open,
}

/// Outcome of a transport close.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// Schedule a reconnect after `delay`
    Reconnect {
        /// 1-indexed attempt number
        attempt: u32,
        /// Delay before the attempt
        delay: Duration,
    },
    /// The reconnect budget is exhausted
    GiveUp,
    /// Manual close; no reconnect
    Stay,
    /// No transport was active; the close was already handled
    Ignored,
}

#[derive(Debug)]
pub struct StateMachine {
    state: ConnectionState,
    attempt: u32,
    manual_close: bool,
    policy: ReconnectConfig,
    events: Vec<StatusEvent>,
}

impl StateMachine {
    #[must_use]
    pub fn new(policy: ReconnectConfig) -> Self {
        Self {
            state: ConnectionState::Idle,
            attempt: 0,
            manual_close: false,
            policy,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Consecutive reconnection attempts since the last successful open.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Request a connection. Also used when a scheduled reconnect fires, so a timer
    /// that outlived a successful manual reconnect is harmless.
    pub fn begin_connect(&mut self) -> ConnectDecision {
        match self.state {
            ConnectionState::Open { .. } | ConnectionState::Connecting | ConnectionState::Closing => {
                ConnectDecision::Skip
            }
            ConnectionState::Idle | ConnectionState::Closed => {
                self.state = ConnectionState::Connecting;
                self.manual_close = false;
                self.events.push(StatusEvent::Connecting {
                    attempt: self.attempt,
                });
                ConnectDecision::Open
            }
        }
    }

    pub fn opened(&mut self) {
        self.state = ConnectionState::Open {
            since: Instant::now(),
        };
        self.attempt = 0;
        self.events.push(StatusEvent::Connected);
    }

    /// Transport error. Recovery is driven by the close that follows, not from here.
    pub fn errored(&mut self, message: impl Into<String>) {
        self.events.push(StatusEvent::Error {
            message: message.into(),
        });
    }

    /// The transport could not be constructed. Reported as a failure, never retried.
    pub fn construct_failed(&mut self, message: impl Into<String>) {
        self.state = ConnectionState::Closed;
        self.events.push(StatusEvent::Failed {
            message: message.into(),
        });
    }

    /// Start a manual close. Returns `false` when there is no transport to close.
    pub fn begin_close(&mut self) -> bool {
        match self.state {
            ConnectionState::Open { .. } | ConnectionState::Connecting => {
                self.state = ConnectionState::Closing;
                self.manual_close = true;
                true
            }
            ConnectionState::Idle | ConnectionState::Closing | ConnectionState::Closed => false,
        }
    }

    pub fn closed(&mut self) -> CloseDecision {
        if matches!(self.state, ConnectionState::Idle | ConnectionState::Closed) {
            return CloseDecision::Ignored;
        }

        self.state = ConnectionState::Closed;

        if std::mem::take(&mut self.manual_close) {
            self.events.push(StatusEvent::Disconnected { retry_in: None });
            return CloseDecision::Stay;
        }

        if self.attempt < self.policy.max_attempts {
            self.attempt += 1;
            let delay = self.policy.delay(self.attempt);
            self.events.push(StatusEvent::Disconnected {
                retry_in: Some(delay),
            });
            CloseDecision::Reconnect {
                attempt: self.attempt,
                delay,
            }
        } else {
            self.events.push(StatusEvent::Disconnected { retry_in: None });
            self.events.push(StatusEvent::GaveUp {
                attempts: self.attempt,
            });
            CloseDecision::GiveUp
        }
    }

    /// Whether a liveness tick should send a `ping` frame.
    #[must_use]
    pub fn should_ping(&self) -> bool {
        self.state.is_open()
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, StatusEvent> {
        self.events.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> StateMachine {
        StateMachine::new(ReconnectConfig::default())
    }

    fn fail_once(machine: &mut StateMachine) -> CloseDecision {
        assert_eq!(machine.begin_connect(), ConnectDecision::Open, "should open");
        machine.closed()
    }

    #[test]
    fn starts_idle() {
        let machine = machine();
        assert_eq!(machine.state(), ConnectionState::Idle);
        assert_eq!(machine.attempt(), 0);
    }

    #[test]
    fn connect_while_open_is_noop() {
        let mut machine = machine();
        machine.begin_connect();
        machine.opened();
        machine.drain_events().for_each(drop);

        assert_eq!(machine.begin_connect(), ConnectDecision::Skip);
        assert!(machine.state().is_open());
        assert_eq!(machine.drain_events().count(), 0);
    }

    #[test]
    fn connect_while_connecting_is_noop() {
        let mut machine = machine();
        machine.begin_connect();
        assert_eq!(machine.begin_connect(), ConnectDecision::Skip);
    }

    #[test]
    fn delays_grow_linearly_until_budget_exhausted() {
        let mut machine = machine();
        let mut delays = Vec::new();

        for _ in 0..5 {
            match fail_once(&mut machine) {
                CloseDecision::Reconnect { delay, .. } => delays.push(delay.as_millis()),
                other => panic!("expected reconnect, got {other:?}"),
            }
        }

        assert_eq!(delays, vec![3000, 6000, 9000, 12000, 15000]);
        assert_eq!(fail_once(&mut machine), CloseDecision::GiveUp);
        assert_eq!(machine.attempt(), 5);
    }

    #[test]
    fn attempt_counter_never_exceeds_budget() {
        let mut machine = machine();
        for _ in 0..20 {
            fail_once(&mut machine);
            assert!(machine.attempt() <= 5, "counter exceeded budget");
        }
    }

    #[test]
    fn give_up_emits_terminal_event() {
        let mut machine = machine();
        for _ in 0..5 {
            fail_once(&mut machine);
        }
        machine.drain_events().for_each(drop);

        fail_once(&mut machine);
        let events: Vec<_> = machine.drain_events().collect();

        assert!(events.contains(&StatusEvent::GaveUp { attempts: 5 }));
        assert!(events.contains(&StatusEvent::Disconnected { retry_in: None }));
    }

    #[test]
    fn open_resets_attempts() {
        let mut machine = machine();
        fail_once(&mut machine);
        fail_once(&mut machine);
        assert_eq!(machine.attempt(), 2);

        machine.begin_connect();
        machine.opened();
        assert_eq!(machine.attempt(), 0);

        match machine.closed() {
            CloseDecision::Reconnect { attempt, delay } => {
                assert_eq!(attempt, 1);
                assert_eq!(delay, Duration::from_secs(3));
            }
            other => panic!("expected reconnect, got {other:?}"),
        }
    }

    #[test]
    fn error_does_not_schedule_or_change_state() {
        let mut machine = machine();
        machine.begin_connect();
        machine.opened();
        machine.drain_events().for_each(drop);

        machine.errored("broken pipe");

        assert!(machine.state().is_open());
        assert_eq!(machine.attempt(), 0);
        assert_eq!(
            machine.drain_events().collect::<Vec<_>>(),
            vec![StatusEvent::Error {
                message: "broken pipe".to_owned()
            }]
        );
    }

    #[test]
    fn manual_close_does_not_reconnect() {
        let mut machine = machine();
        machine.begin_connect();
        machine.opened();

        assert!(machine.begin_close());
        assert_eq!(machine.state(), ConnectionState::Closing);
        assert_eq!(machine.closed(), CloseDecision::Stay);
        assert_eq!(machine.state(), ConnectionState::Closed);
    }

    #[test]
    fn duplicate_close_is_ignored() {
        let mut machine = machine();
        fail_once(&mut machine);
        assert_eq!(machine.closed(), CloseDecision::Ignored);
        assert_eq!(machine.attempt(), 1);
    }

    #[test]
    fn construct_failure_closes_without_retry() {
        let mut machine = machine();
        machine.begin_connect();
        machine.construct_failed("relative URL without a base");

        assert_eq!(machine.state(), ConnectionState::Closed);
        assert_eq!(machine.closed(), CloseDecision::Ignored);
        assert!(
            machine
                .drain_events()
                .any(|event| matches!(event, StatusEvent::Failed { .. }))
        );
    }

    #[test]
    fn ping_only_while_open() {
        let mut machine = machine();
        assert!(!machine.should_ping());

        machine.begin_connect();
        assert!(!machine.should_ping());

        machine.opened();
        assert!(machine.should_ping());

        machine.closed();
        assert!(!machine.should_ping());
    }
}
