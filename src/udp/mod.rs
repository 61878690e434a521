//! Session backend that reaches a network server through the Semtech
//! UDP packet forwarder protocol.
//!
//! The node plays its own single-channel gateway: every PHY frame goes up as
//! a PUSH_DATA rxpk, and the server's PUSH_ACK is the only downstream signal
//! used. On this bench link an acknowledged JoinRequest counts as a completed
//! join (no JoinAccept processing, no keys are derived).

pub mod protocol;

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{lookup_host, UdpSocket};
use tracing::{debug, info, warn};

use crate::config::GwmpConfig;
use crate::error::{JoinError, SendError};
use crate::hexfmt::to_hex;
use crate::identity::SessionIdentity;
use crate::lorawan::encoder::{self, FrameBuilder};
use crate::lorawan::{self as lw, MType};
use crate::radio::host::HostRadio;
use crate::radio::rfswitch::RfSwitch;
use crate::session::NetworkSession;
use protocol::{GatewayEui, PacketType, PushDataPayload, Rxpk};

/// Bound socket plus resolved upstream address
pub struct GwmpLink {
    socket: UdpSocket,
    server: SocketAddr,
    gateway_eui: GatewayEui,
}

impl GwmpLink {
    pub async fn open(cfg: &GwmpConfig) -> anyhow::Result<Self> {
        let gateway_eui = cfg.gateway_eui()?;
        let server = lookup_host(&cfg.server)
            .await
            .map_err(|e| anyhow::anyhow!("Invalid server address '{}': {}", cfg.server, e))?
            .next()
            .ok_or_else(|| anyhow::anyhow!("Server address '{}' did not resolve", cfg.server))?;
        let socket = UdpSocket::bind(&cfg.bind).await?;

        info!(
            "GWMP link {} -> {} (gateway {})",
            socket.local_addr()?,
            server,
            to_hex(&gateway_eui)
        );

        Ok(Self {
            socket,
            server,
            gateway_eui,
        })
    }
}

/// LoRaWAN session over a GWMP link.
///
/// Joins are bench joins: a JoinRequest (zero MIC) that the server
/// acknowledged with PUSH_ACK is taken as joined, and the DevAddr is derived
/// from the DevEUI. No JoinAccept is received, so `Connected` on this
/// backend does not mean a network server accepted the device.
///
/// Unacknowledged uplinks never drop the DevAddr. After `max_missed_acks` in
/// a row `session_active()` reports loss; sending goes on and the first
/// acknowledged uplink makes the session active again.
pub struct GwmpSession<W: RfSwitch> {
    link: GwmpLink,
    ack_timeout: Duration,
    max_missed_acks: u32,
    f_port: u8,
    radio: HostRadio<W>,
    token: u16,
    dev_addr: Option<u32>,
    fcnt: u16,
    missed_acks: u32,
}

impl<W: RfSwitch> GwmpSession<W> {
    pub fn new(link: GwmpLink, cfg: &GwmpConfig, radio: HostRadio<W>) -> Self {
        Self {
            link,
            ack_timeout: Duration::from_millis(cfg.ack_timeout_ms),
            max_missed_acks: cfg.max_missed_acks.max(1),
            f_port: cfg.f_port,
            radio,
            token: 0,
            dev_addr: None,
            fcnt: 0,
            missed_acks: 0,
        }
    }

    /// Push one PHY frame; `Ok(true)` once the matching PUSH_ACK arrived
    async fn push(&mut self, phy: &[u8]) -> anyhow::Result<bool> {
        self.token = self.token.wrapping_add(1);
        let token = self.token;

        let rxpk = Rxpk::from_phy(self.radio.lora_config(), phy);
        let packet = protocol::push_data(
            token,
            &self.link.gateway_eui,
            &PushDataPayload { rxpk: vec![rxpk] },
        )?;

        let link = &self.link;
        let packet = &packet;
        self.radio
            .transmit(|irq| async move {
                let sent = link.socket.send_to(packet, link.server).await;
                irq.raise();
                sent
            })
            .await?;
        debug!("PUSH_DATA token 0x{:04x}, {} bytes", token, packet.len());

        self.await_ack(token).await
    }

    async fn await_ack(&mut self, token: u16) -> anyhow::Result<bool> {
        let deadline = tokio::time::Instant::now() + self.ack_timeout;
        let mut buf = [0u8; 64];

        loop {
            let (len, from) =
                match tokio::time::timeout_at(deadline, self.link.socket.recv_from(&mut buf)).await {
                    Ok(received) => received?,
                    Err(_) => return Ok(false),
                };

            match protocol::parse_ack(&buf[..len]) {
                Ok(ack) if ack.packet_type == PacketType::PushAck && ack.random_token == token => {
                    return Ok(true);
                }
                Ok(ack) => debug!(
                    "Ignoring {:?} (token 0x{:04x}) from {}",
                    ack.packet_type, ack.random_token, from
                ),
                Err(e) => debug!("Ignoring datagram from {}: {}", from, e),
            }
        }
    }
}

impl<W: RfSwitch + 'static> NetworkSession for GwmpSession<W> {
    async fn join(&mut self, identity: &SessionIdentity) -> Result<(), JoinError> {
        let phy = encoder::join_request(identity);
        info!(
            "{} DevEUI={} DevNonce={}",
            MType::JoinRequest,
            to_hex(&identity.device_id),
            to_hex(&identity.session_nonce)
        );

        match self.push(&phy).await {
            Ok(true) => {
                let dev_addr = lw::bench_dev_addr(&identity.device_id);
                info!(
                    "Bench join acknowledged (no JoinAccept), DevAddr={:08X}",
                    dev_addr
                );
                self.dev_addr = Some(dev_addr);
                self.fcnt = 0;
                self.missed_acks = 0;
                Ok(())
            }
            Ok(false) => Err(JoinError::Timeout),
            Err(e) => Err(JoinError::Io(e.to_string())),
        }
    }

    async fn send_uplink(&mut self, payload: &[u8]) -> Result<(), SendError> {
        let dev_addr = self.dev_addr.ok_or(SendError::NoSession)?;

        let fcnt = self.fcnt;
        let phy = FrameBuilder::new_uplink(dev_addr, fcnt, self.f_port, payload.to_vec()).build();
        // the counter moves on whether or not the server answers
        self.fcnt = self.fcnt.wrapping_add(1);

        match self.push(&phy).await {
            Ok(true) => {
                debug!("{} FCnt={} acknowledged", MType::UnconfirmedDataUp, fcnt);
                if !self.session_active() {
                    info!(
                        "Server acknowledging again after {} missed uplink(s)",
                        self.missed_acks
                    );
                }
                self.missed_acks = 0;
                Ok(())
            }
            Ok(false) => {
                self.missed_acks = self.missed_acks.saturating_add(1);
                if self.missed_acks == self.max_missed_acks {
                    warn!(
                        "{} uplinks in a row unacknowledged, session considered lost",
                        self.missed_acks
                    );
                }
                Err(SendError::NotAcknowledged)
            }
            Err(e) => Err(SendError::Io(e.to_string())),
        }
    }

    fn session_active(&self) -> bool {
        self.dev_addr.is_some() && self.missed_acks < self.max_missed_acks
    }
}
