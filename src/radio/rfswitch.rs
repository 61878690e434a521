//! RF front-end switch for the Nucleo WL55JC board
//!
//! ```text
//!                   Tx_HP   Tx_LP   RX
//!  FE_CTRL1 (PC4)    OFF     ON     ON
//!  FE_CTRL2 (PC5)    ON      ON     OFF
//!  FE_CTRL3 (PC3)    ON      ON     ON
//! ```

use tracing::{debug, trace};

/// Raw switch codes as handed over by the transceiver driver
pub const RFSWITCH_RX: u8 = 0;
pub const RFSWITCH_TX_LP: u8 = 1;
pub const RFSWITCH_TX_HP: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioMode {
    Rx,
    TxLowPower,
    TxHighPower,
}

impl RadioMode {
    pub fn from_raw(code: u8) -> Option<Self> {
        match code {
            RFSWITCH_RX => Some(RadioMode::Rx),
            RFSWITCH_TX_LP => Some(RadioMode::TxLowPower),
            RFSWITCH_TX_HP => Some(RadioMode::TxHighPower),
            _ => None,
        }
    }

    pub fn raw(&self) -> u8 {
        match self {
            RadioMode::Rx => RFSWITCH_RX,
            RadioMode::TxLowPower => RFSWITCH_TX_LP,
            RadioMode::TxHighPower => RFSWITCH_TX_HP,
        }
    }

    /// Levels of (FE_CTRL1, FE_CTRL2, FE_CTRL3) for this mode
    pub fn line_levels(&self) -> [bool; 3] {
        match self {
            RadioMode::Rx => [true, false, true],
            RadioMode::TxLowPower => [true, true, true],
            RadioMode::TxHighPower => [false, true, true],
        }
    }
}

/// One GPIO driving a front-end control input. Writes cannot fail.
pub trait ControlLine: Send {
    fn configure_output(&mut self) {}
    fn set(&mut self, high: bool);
    fn level(&self) -> bool;
}

/// The contract a transceiver driver expects from an antenna switch
pub trait RfSwitch: Send {
    fn init_rf_switch(&mut self);
    fn set_rf_switch_mode(&mut self, mode: u8);
}

pub struct FrontEndSwitch<L: ControlLine> {
    lines: [L; 3],
}

impl<L: ControlLine> FrontEndSwitch<L> {
    /// `lines` are FE_CTRL1, FE_CTRL2, FE_CTRL3 in that order
    pub fn new(lines: [L; 3]) -> Self {
        Self { lines }
    }

    pub fn set_mode(&mut self, mode: RadioMode) {
        trace!("rf switch -> {:?}", mode);
        for (line, level) in self.lines.iter_mut().zip(mode.line_levels()) {
            line.set(level);
        }
    }

    pub fn levels(&self) -> [bool; 3] {
        [
            self.lines[0].level(),
            self.lines[1].level(),
            self.lines[2].level(),
        ]
    }
}

impl<L: ControlLine> RfSwitch for FrontEndSwitch<L> {
    fn init_rf_switch(&mut self) {
        for line in self.lines.iter_mut() {
            line.configure_output();
        }
    }

    fn set_rf_switch_mode(&mut self, mode: u8) {
        match RadioMode::from_raw(mode) {
            Some(mode) => self.set_mode(mode),
            // Unknown codes leave the lines untouched
            None => debug!("ignoring unknown rf switch mode {}", mode),
        }
    }
}

/// Host stand-in for a GPIO: remembers its level and traces changes
#[derive(Debug)]
pub struct LoggedLine {
    name: &'static str,
    level: bool,
}

impl LoggedLine {
    pub fn new(name: &'static str) -> Self {
        Self { name, level: false }
    }

    /// The three WL55JC front-end lines
    pub fn wl55jc() -> [LoggedLine; 3] {
        [
            LoggedLine::new("FE_CTRL1/PC4"),
            LoggedLine::new("FE_CTRL2/PC5"),
            LoggedLine::new("FE_CTRL3/PC3"),
        ]
    }
}

impl ControlLine for LoggedLine {
    fn configure_output(&mut self) {
        trace!("{} configured as output", self.name);
    }

    fn set(&mut self, high: bool) {
        if self.level != high {
            trace!("{} -> {}", self.name, if high { "high" } else { "low" });
        }
        self.level = high;
    }

    fn level(&self) -> bool {
        self.level
    }
}
