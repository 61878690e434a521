//! Connection state shared between the supervisor and the scheduler
//!
//! The supervisor holds the only `ConnectionPublisher`; everyone else reads
//! through a `watch::Receiver`, which never blocks and never tears.

use std::fmt;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Joining,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Joining => write!(f, "joining"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// Single writer side of the connection state
pub struct ConnectionPublisher {
    tx: watch::Sender<ConnectionState>,
}

impl ConnectionPublisher {
    /// Create the publisher in the `Disconnected` state
    pub fn new() -> (Self, watch::Receiver<ConnectionState>) {
        let (tx, rx) = watch::channel(ConnectionState::Disconnected);
        (Self { tx }, rx)
    }

    /// Publish `state`. Returns the previous state.
    pub fn publish(&self, state: ConnectionState) -> ConnectionState {
        // send_replace keeps working when no receiver is left
        self.tx.send_replace(state)
    }

    pub fn current(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }
}
