//! Uplink Sink
//!
//! Minimal network-server stand-in for bench runs: acknowledges every
//! Semtech UDP PUSH_DATA from the node and prints what the frames carry,
//! including the Cayenne LPP measurements of data uplinks.
//!
//! Usage: cargo run --bin uplink-sink [bind_addr]

use std::env;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

const PROTOCOL_VERSION: u8 = 0x02;
const PUSH_DATA: u8 = 0x00;
const PUSH_ACK: u8 = 0x01;

const LPP_TEMPERATURE: u8 = 0x67;
const LPP_RELATIVE_HUMIDITY: u8 = 0x68;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let bind_addr: SocketAddr = env::args()
        .nth(1)
        .unwrap_or_else(|| "0.0.0.0:1700".to_string())
        .parse()?;

    let socket = UdpSocket::bind(bind_addr).await?;
    println!("📥 GNSE Uplink Sink");
    println!("  Listening on {}", socket.local_addr()?);
    println!();

    let mut buf = vec![0u8; 65535];
    loop {
        let (len, src) = socket.recv_from(&mut buf).await?;
        let datagram = &buf[..len];

        if len < 12 || datagram[0] != PROTOCOL_VERSION || datagram[3] != PUSH_DATA {
            println!("⚠️  Ignoring {} bytes from {}", len, src);
            continue;
        }

        let ack = [PROTOCOL_VERSION, datagram[1], datagram[2], PUSH_ACK];
        socket.send_to(&ack, src).await?;

        let token = u16::from_be_bytes([datagram[1], datagram[2]]);
        println!(
            "📡 PUSH_DATA token=0x{:04x} gateway={} from {}",
            token,
            hex::encode_upper(&datagram[4..12]),
            src
        );

        match rxpk_frames(&datagram[12..]) {
            Ok(frames) => {
                for (datr, phy) in frames {
                    println!("   {} {}", datr, describe_phy(&phy));
                }
            }
            Err(e) => println!("   ❌ Bad JSON: {}", e),
        }
        println!();
    }
}

/// Decode the rxpk array into (data rate, PHY payload) pairs
fn rxpk_frames(json: &[u8]) -> anyhow::Result<Vec<(String, Vec<u8>)>> {
    use base64::Engine;

    let value: serde_json::Value = serde_json::from_slice(json)?;
    let mut frames = Vec::new();
    if let Some(rxpk) = value["rxpk"].as_array() {
        for pk in rxpk {
            let datr = pk["datr"].as_str().unwrap_or("?").to_string();
            let data = pk["data"].as_str().unwrap_or_default();
            let phy = base64::engine::general_purpose::STANDARD.decode(data)?;
            frames.push((datr, phy));
        }
    }
    Ok(frames)
}

fn describe_phy(phy: &[u8]) -> String {
    let Some(&mhdr) = phy.first() else {
        return "empty frame".to_string();
    };

    match mhdr >> 5 {
        0b000 if phy.len() == 23 => {
            // EUIs and DevNonce travel little-endian
            let mut app_eui = phy[1..9].to_vec();
            app_eui.reverse();
            let mut dev_eui = phy[9..17].to_vec();
            dev_eui.reverse();
            format!(
                "JoinRequest AppEUI={} DevEUI={} DevNonce={}",
                hex::encode_upper(app_eui),
                hex::encode_upper(dev_eui),
                hex::encode_upper(&phy[17..19])
            )
        }
        0b010 | 0b100 if phy.len() >= 12 => {
            let dev_addr = u32::from_le_bytes([phy[1], phy[2], phy[3], phy[4]]);
            let fopts_len = (phy[5] & 0x0F) as usize;
            let fcnt = u16::from_le_bytes([phy[6], phy[7]]);
            let port_at = 8 + fopts_len;
            let mic_at = phy.len() - 4;
            if port_at >= mic_at {
                return format!("Data DevAddr={:08X} FCnt={} (no payload)", dev_addr, fcnt);
            }
            let frm = &phy[port_at + 1..mic_at];
            format!(
                "Data DevAddr={:08X} FCnt={} FPort={} payload={} [{}]",
                dev_addr,
                fcnt,
                phy[port_at],
                hex::encode_upper(frm),
                describe_cayenne(frm)
            )
        }
        _ => format!("MHDR=0x{:02X} {} bytes", mhdr, phy.len()),
    }
}

fn describe_cayenne(mut data: &[u8]) -> String {
    let mut parts = Vec::new();
    while data.len() >= 2 {
        let (channel, kind) = (data[0], data[1]);
        match kind {
            LPP_TEMPERATURE if data.len() >= 4 => {
                let raw = i16::from_be_bytes([data[2], data[3]]);
                parts.push(format!("ch{} {:.1}°C", channel, raw as f64 / 10.0));
                data = &data[4..];
            }
            LPP_RELATIVE_HUMIDITY if data.len() >= 3 => {
                parts.push(format!("ch{} {:.1}%RH", channel, data[2] as f64 / 2.0));
                data = &data[3..];
            }
            _ => {
                parts.push(format!("unknown type 0x{:02X}", kind));
                break;
            }
        }
    }
    parts.join(", ")
}
