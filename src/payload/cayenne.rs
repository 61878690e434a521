//! Cayenne Low Power Payload encoder
//!
//! Each entry is `channel(1) | type(1) | value(N)`, values big-endian:
//!   temperature 0x67: i16, 0.1 °C per bit
//!   humidity    0x68: u8,  0.5 %RH per bit

use bytes::{BufMut, BytesMut};

use super::PayloadEncoder;
use crate::error::EncodeError;

pub const LPP_TEMPERATURE: u8 = 0x67;
pub const LPP_RELATIVE_HUMIDITY: u8 = 0x68;

/// EU868 maximum application payload at SF9/125 kHz
pub const DEFAULT_MAX_SIZE: usize = 51;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Entry {
    Temperature { channel: u8, celsius: f64 },
    Humidity { channel: u8, percent: f64 },
}

impl Entry {
    fn encoded_len(&self) -> usize {
        match self {
            Entry::Temperature { .. } => 4,
            Entry::Humidity { .. } => 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CayenneEncoder {
    entries: Vec<Entry>,
    max_size: usize,
}

impl CayenneEncoder {
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_SIZE)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_size,
        }
    }
}

impl Default for CayenneEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadEncoder for CayenneEncoder {
    fn reset(&mut self) {
        self.entries.clear();
    }

    fn add_temperature(&mut self, channel: u8, celsius: f64) {
        self.entries.push(Entry::Temperature { channel, celsius });
    }

    fn add_relative_humidity(&mut self, channel: u8, percent: f64) {
        self.entries.push(Entry::Humidity { channel, percent });
    }

    fn bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let size: usize = self.entries.iter().map(Entry::encoded_len).sum();
        if size > self.max_size {
            return Err(EncodeError::TooLarge {
                size,
                max: self.max_size,
            });
        }

        let mut buf = BytesMut::with_capacity(size);
        for entry in &self.entries {
            match *entry {
                Entry::Temperature { channel, celsius } => {
                    let scaled = (celsius * 10.0).round();
                    if !(i16::MIN as f64..=i16::MAX as f64).contains(&scaled) {
                        return Err(EncodeError::OutOfRange {
                            channel,
                            value: celsius,
                        });
                    }
                    buf.put_u8(channel);
                    buf.put_u8(LPP_TEMPERATURE);
                    buf.put_i16(scaled as i16);
                }
                Entry::Humidity { channel, percent } => {
                    let scaled = (percent * 2.0).round();
                    if !(0.0..=u8::MAX as f64).contains(&scaled) {
                        return Err(EncodeError::OutOfRange {
                            channel,
                            value: percent,
                        });
                    }
                    buf.put_u8(channel);
                    buf.put_u8(LPP_RELATIVE_HUMIDITY);
                    buf.put_u8(scaled as u8);
                }
            }
        }
        Ok(buf.to_vec())
    }
}
