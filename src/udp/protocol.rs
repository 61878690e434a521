//! Semtech UDP Packet Forwarder Protocol (GWMP), uplink direction
//!
//! Reference: https://github.com/Lora-net/packet_forwarder/blob/master/PROTOCOL.TXT
//!
//! The protocol uses a simple binary header followed by JSON payload.
//! All multi-byte integers are big-endian (network byte order).

use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::radio::LoraConfig;

/// Protocol version (always 0x02)
pub const PROTOCOL_VERSION: u8 = 0x02;

/// Packet types (identifier byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    PushData = 0x00,
    PushAck = 0x01,
    PullData = 0x02,
    PullResp = 0x03,
    PullAck = 0x04,
    TxAck = 0x05,
}

impl TryFrom<u8> for PacketType {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(PacketType::PushData),
            0x01 => Ok(PacketType::PushAck),
            0x02 => Ok(PacketType::PullData),
            0x03 => Ok(PacketType::PullResp),
            0x04 => Ok(PacketType::PullAck),
            0x05 => Ok(PacketType::TxAck),
            _ => Err(anyhow::anyhow!("Unknown packet type: 0x{:02x}", value)),
        }
    }
}

/// Gateway identifier (EUI-64, 8 bytes)
pub type GatewayEui = [u8; 8];

/// Rxpk (received packet) as the forwarder reports it upstream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rxpk {
    /// UTC time of packet reception
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Concentrator IF channel
    pub chan: u8,
    /// RF chain
    pub rfch: u8,
    /// Frequency in MHz
    pub freq: f64,
    /// CRC status (1 = OK)
    pub stat: i8,
    /// Modulation (LORA or FSK)
    pub modu: String,
    /// LoRa datarate identifier (e.g., "SF9BW125")
    pub datr: String,
    /// LoRa coding rate (e.g., "4/7")
    pub codr: String,
    /// RSSI in dBm
    pub rssi: f64,
    /// LoRa signal-to-noise ratio
    pub lsnr: f64,
    /// RF packet payload size in bytes
    pub size: u16,
    /// Base64 encoded RF packet payload
    pub data: String,
}

// Link figures reported for the node's own frames on a loopback bench
const BENCH_RSSI_DBM: f64 = -40.0;
const BENCH_LSNR_DB: f64 = 9.5;

impl Rxpk {
    /// Describe a PHY payload sent with the given modem settings
    pub fn from_phy(lora: &LoraConfig, phy: &[u8]) -> Self {
        use base64::Engine;
        Self {
            time: Some(chrono::Utc::now().to_rfc3339()),
            chan: 0,
            rfch: 0,
            freq: lora.frequency_mhz(),
            stat: 1,
            modu: "LORA".to_string(),
            datr: lora.data_rate(),
            codr: lora.coding_rate.as_str().to_string(),
            rssi: BENCH_RSSI_DBM,
            lsnr: BENCH_LSNR_DB,
            size: phy.len() as u16,
            data: base64::engine::general_purpose::STANDARD.encode(phy),
        }
    }
}

/// Push data JSON wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct PushDataPayload {
    pub rxpk: Vec<Rxpk>,
}

/// Build a PUSH_DATA datagram
pub fn push_data(
    random_token: u16,
    gateway_eui: &GatewayEui,
    payload: &PushDataPayload,
) -> anyhow::Result<Vec<u8>> {
    let json = serde_json::to_vec(payload)?;
    let mut buf = BytesMut::with_capacity(12 + json.len());
    buf.put_u8(PROTOCOL_VERSION);
    buf.put_u16(random_token);
    buf.put_u8(PacketType::PushData as u8);
    buf.put_slice(gateway_eui);
    buf.put_slice(&json);
    Ok(buf.to_vec())
}

/// Acknowledgement header sent back by the network server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub random_token: u16,
    pub packet_type: PacketType,
}

/// Parse the 4-byte header of a downstream datagram
pub fn parse_ack(data: &[u8]) -> anyhow::Result<Ack> {
    if data.len() < 4 {
        return Err(anyhow::anyhow!("Packet too short: {} bytes", data.len()));
    }

    let mut buf = data;

    let version = buf.get_u8();
    if version != PROTOCOL_VERSION {
        return Err(anyhow::anyhow!(
            "Unsupported protocol version: 0x{:02x}",
            version
        ));
    }

    let random_token = buf.get_u16();
    let packet_type = PacketType::try_from(buf.get_u8())?;

    Ok(Ack {
        random_token,
        packet_type,
    })
}
