//! Uplink payload encoding

pub mod cayenne;

use crate::error::EncodeError;

/// Accumulating measurement encoder.
///
/// `bytes` does not clear the accumulated state; callers `reset` at the start
/// of every cycle.
pub trait PayloadEncoder: Send + 'static {
    fn reset(&mut self);
    fn add_temperature(&mut self, channel: u8, celsius: f64);
    fn add_relative_humidity(&mut self, channel: u8, percent: f64);
    fn bytes(&self) -> Result<Vec<u8>, EncodeError>;
}
