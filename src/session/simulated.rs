//! In-process session for bench runs without a network server

use std::time::Duration;
use tracing::{info, warn};

use super::NetworkSession;
use crate::config::SimulatedSessionConfig;
use crate::error::{JoinError, SendError};
use crate::hexfmt::to_hex;
use crate::identity::SessionIdentity;
use crate::radio::host::HostRadio;
use crate::radio::rfswitch::RfSwitch;

pub struct SimulatedSession<W: RfSwitch> {
    radio: HostRadio<W>,
    failures_left: u32,
    join_latency: Duration,
    drop_after_uplinks: Option<u32>,
    joined: bool,
    join_attempts: u32,
    fcnt: u32,
}

impl<W: RfSwitch> SimulatedSession<W> {
    pub fn new(cfg: &SimulatedSessionConfig, radio: HostRadio<W>) -> Self {
        Self {
            radio,
            failures_left: cfg.join_failures,
            join_latency: Duration::from_millis(cfg.join_latency_ms),
            drop_after_uplinks: cfg.drop_after_uplinks,
            joined: false,
            join_attempts: 0,
            fcnt: 0,
        }
    }

    pub fn join_attempts(&self) -> u32 {
        self.join_attempts
    }

    pub fn uplinks_sent(&self) -> u32 {
        self.fcnt
    }
}

impl<W: RfSwitch + 'static> NetworkSession for SimulatedSession<W> {
    async fn join(&mut self, identity: &SessionIdentity) -> Result<(), JoinError> {
        self.join_attempts += 1;
        info!(
            "sim: JoinRequest #{} DevEUI={} DevNonce={}",
            self.join_attempts,
            to_hex(&identity.device_id),
            to_hex(&identity.session_nonce)
        );

        let latency = self.join_latency;
        self.radio
            .transmit(|irq| async move {
                tokio::time::sleep(latency).await;
                irq.raise();
            })
            .await;

        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(JoinError::Timeout);
        }
        self.joined = true;
        self.fcnt = 0;
        Ok(())
    }

    async fn send_uplink(&mut self, payload: &[u8]) -> Result<(), SendError> {
        if !self.joined {
            return Err(SendError::NoSession);
        }
        self.radio.transmit(|irq| async move { irq.raise() }).await;
        self.fcnt += 1;
        info!("sim: uplink FCnt={} payload={}", self.fcnt, to_hex(payload));

        if let Some(limit) = self.drop_after_uplinks {
            if self.fcnt >= limit {
                warn!("sim: dropping session after {} uplinks", self.fcnt);
                self.joined = false;
            }
        }
        Ok(())
    }

    fn session_active(&self) -> bool {
        self.joined
    }
}
