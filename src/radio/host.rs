//! Host stand-in for the SX126x transceiver
//!
//! There is no RF on a workstation: a "transmission" is whatever future the
//! session hands in (a UDP datagram, or nothing at all). That future is the
//! transport side and raises the TX-done interrupt once its frame has left.
//! The state machine and the front-end switching are the same as on the board.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::irq::RadioIrq;
use super::rfswitch::{RfSwitch, RFSWITCH_RX, RFSWITCH_TX_HP, RFSWITCH_TX_LP};
use super::{LoraConfig, Radio};

/// Highest power the low-power PA path is used for
const TX_LP_MAX_DBM: i8 = 14;

/// How long after the air future completes a TX-done interrupt may still arrive
const TX_DONE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioState {
    Sleep,
    Standby,
    Rx,
    Tx,
}

pub struct HostRadio<W: RfSwitch> {
    present: bool,
    state: RadioState,
    config: LoraConfig,
    switch: W,
    irq: RadioIrq,
}

impl<W: RfSwitch> HostRadio<W> {
    /// `present = false` simulates a board whose transceiver does not answer
    pub fn new(present: bool, mut switch: W) -> Self {
        switch.init_rf_switch();
        Self {
            present,
            state: RadioState::Sleep,
            config: LoraConfig::default(),
            switch,
            irq: RadioIrq::new(),
        }
    }

    pub fn state(&self) -> RadioState {
        self.state
    }

    pub fn lora_config(&self) -> &LoraConfig {
        &self.config
    }

    pub fn switch(&self) -> &W {
        &self.switch
    }

    fn tx_switch_mode(&self) -> u8 {
        if self.config.tx_power_dbm > TX_LP_MAX_DBM {
            RFSWITCH_TX_HP
        } else {
            RFSWITCH_TX_LP
        }
    }

    /// Run one transmission: front end to TX, then back to RX once the
    /// TX-done interrupt has been handled.
    ///
    /// `air` receives the interrupt line and is expected to raise it when the
    /// frame is out. A missing interrupt is treated like the chip's TX timeout.
    pub async fn transmit<A, F, T>(&mut self, air: A) -> T
    where
        A: FnOnce(RadioIrq) -> F,
        F: Future<Output = T>,
    {
        self.switch.set_rf_switch_mode(self.tx_switch_mode());
        self.state = RadioState::Tx;

        let out = air(self.irq.clone()).await;

        if tokio::time::timeout(TX_DONE_TIMEOUT, self.irq.wait())
            .await
            .is_err()
        {
            warn!("radio: no tx-done interrupt within {:?}", TX_DONE_TIMEOUT);
        }
        self.on_interrupt();
        out
    }

    fn on_interrupt(&mut self) {
        match self.state {
            RadioState::Tx => {
                self.switch.set_rf_switch_mode(RFSWITCH_RX);
                self.state = RadioState::Rx;
                debug!("radio: tx done, back to rx");
            }
            other => debug!("radio: interrupt in state {:?}, nothing to do", other),
        }
    }
}

impl<W: RfSwitch + 'static> Radio for HostRadio<W> {
    fn detect_device(&mut self) -> bool {
        if self.present {
            self.state = RadioState::Standby;
        }
        self.present
    }

    fn configure(&mut self, config: &LoraConfig) {
        self.config = config.clone();
        self.switch.set_rf_switch_mode(RFSWITCH_RX);
        self.state = RadioState::Standby;
        info!(
            "radio: {:.1} MHz {} CR{} preamble={} sync=0x{:04X} power={} dBm",
            config.frequency_mhz(),
            config.data_rate(),
            config.coding_rate.as_str(),
            config.preamble_len,
            config.sync_word.value(),
            config.tx_power_dbm
        );
    }
}
