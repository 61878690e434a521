//! Error taxonomy of the node
//!
//! Only `NodeError` is fatal. Everything else is handled where it happens
//! with a diagnostic log line and never reaches `main`.

use std::fmt;

/// Fatal startup conditions. The node stops before doing anything else.
#[derive(Debug)]
pub enum NodeError {
    /// The OS entropy source could not produce the DevNonce
    EntropyUnavailable(String),
    /// The radio transceiver did not answer device detection
    HardwareAbsent,
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::EntropyUnavailable(reason) => {
                write!(f, "entropy source unavailable: {}", reason)
            }
            NodeError::HardwareAbsent => write!(f, "radio transceiver not detected"),
        }
    }
}

impl std::error::Error for NodeError {}

/// A single join handshake did not complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    /// No answer from the network within the handshake window
    Timeout,
    /// Transport failure underneath the session
    Io(String),
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinError::Timeout => write!(f, "join timed out"),
            JoinError::Io(reason) => write!(f, "join transport error: {}", reason),
        }
    }
}

impl std::error::Error for JoinError {}

/// An uplink could not be transmitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// No session has been established
    NoSession,
    /// The uplink was sent but never acknowledged
    NotAcknowledged,
    /// Transport failure underneath the session
    Io(String),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::NoSession => write!(f, "no active session"),
            SendError::NotAcknowledged => write!(f, "uplink not acknowledged"),
            SendError::Io(reason) => write!(f, "uplink transport error: {}", reason),
        }
    }
}

impl std::error::Error for SendError {}

/// A sensor returned a reading it could not vouch for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// Read attempted while the sensor was still asleep
    NotAwake,
    /// Bus or CRC failure reported by the driver
    Bus(String),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::NotAwake => write!(f, "sensor read while asleep"),
            SensorError::Bus(reason) => write!(f, "sensor bus error: {}", reason),
        }
    }
}

impl std::error::Error for SensorError {}

/// The encoder could not produce a payload
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// A value does not fit the field of its data type
    OutOfRange { channel: u8, value: f64 },
    /// The accumulated payload exceeds the allowed frame size
    TooLarge { size: usize, max: usize },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::OutOfRange { channel, value } => {
                write!(f, "value {} on channel {} out of range", value, channel)
            }
            EncodeError::TooLarge { size, max } => {
                write!(f, "payload of {} bytes exceeds {} bytes", size, max)
            }
        }
    }
}

impl std::error::Error for EncodeError {}
