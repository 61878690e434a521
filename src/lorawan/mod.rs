pub mod encoder;

use std::fmt;

/// LoRaWAN MAC Header (MHDR) - Message Type, as far as an end device sends it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MType {
    JoinRequest,
    UnconfirmedDataUp,
}

impl MType {
    /// MHDR byte: MType(3 bits) | RFU(3 bits) | Major(2 bits), Major = LoRaWAN R1
    pub fn mhdr(&self) -> u8 {
        match self {
            MType::JoinRequest => 0x00,       // 000_000_00
            MType::UnconfirmedDataUp => 0x40, // 010_000_00
        }
    }
}

impl fmt::Display for MType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MType::JoinRequest => write!(f, "JoinRequest"),
            MType::UnconfirmedDataUp => write!(f, "UnconfirmedDataUp"),
        }
    }
}

/// Bench DevAddr for a device: the low 32 bits of its DevEUI.
/// A real network assigns this in the JoinAccept.
pub fn bench_dev_addr(device_id: &[u8; 8]) -> u32 {
    u32::from_be_bytes([device_id[4], device_id[5], device_id[6], device_id[7]])
}
