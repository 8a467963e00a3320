//! Backend connection lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::OperationResult;

/// Lifecycle state of the billing connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(label)
    }
}

/// How a setup result was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The result belongs to the live attempt and moved the state.
    Applied,
    /// The result belongs to an abandoned attempt; the state is unchanged.
    Stale,
}

/// Identifies one connect attempt. Every teardown retires the current one.
pub type ConnectAttempt = u64;

/// Connection state machine.
///
/// Pure bookkeeping: it never talks to the backend. The session issues the
/// backend call when [`begin_connect`](Self::begin_connect) hands out an attempt.
#[derive(Debug, Default)]
pub struct ConnectionMachine {
    state: ConnectionState,
    attempt: ConnectAttempt,
}

impl ConnectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// The attempt whose setup result is currently accepted.
    pub fn current_attempt(&self) -> ConnectAttempt {
        self.attempt
    }

    /// Connect command. Only a disconnected machine moves to `Connecting`,
    /// returning the new attempt the backend listener must carry.
    pub fn begin_connect(&mut self) -> Option<ConnectAttempt> {
        match self.state {
            ConnectionState::Disconnected => {
                self.attempt += 1;
                self.state = ConnectionState::Connecting;
                Some(self.attempt)
            }
            ConnectionState::Connecting | ConnectionState::Connected => None,
        }
    }

    /// Explicit teardown; always lands in `Disconnected` and retires the
    /// current attempt.
    pub fn disconnect(&mut self) {
        self.attempt += 1;
        self.state = ConnectionState::Disconnected;
    }

    /// Backend finished setup for `attempt`.
    ///
    /// Only the live attempt moves the state.
    pub fn setup_finished(
        &mut self,
        attempt: ConnectAttempt,
        result: &OperationResult,
    ) -> Transition {
        if attempt != self.attempt {
            return Transition::Stale;
        }

        self.state = if result.is_ok() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        };
        Transition::Applied
    }

    /// Backend dropped the connection on its own.
    pub fn service_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
    }
}
