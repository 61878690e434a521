//! Transceiver-facing pieces: modem parameters, front-end switch,
//! interrupt line, and the host stand-in for the SX126x driver

pub mod config;
pub mod host;
pub mod irq;
pub mod rfswitch;

pub use config::LoraConfig;

/// What startup needs from the transceiver driver
pub trait Radio: Send + 'static {
    /// Probe the chip. `false` means the hardware is missing or dead.
    fn detect_device(&mut self) -> bool;

    /// Apply the static modem configuration
    fn configure(&mut self, config: &LoraConfig);
}
