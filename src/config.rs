use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::identity::ProviderProfile;
use crate::radio::LoraConfig;
use crate::sensors::{ChannelTags, SensorRole};
use crate::supervisor::SessionLossPolicy;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub node: NodeConfig,
    pub timing: TimingConfig,
    pub radio: RadioConfig,
    pub session: SessionConfig,
    pub sensors: Vec<SensorConfig>,
    pub indicator: IndicatorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub provider: ProviderProfile,
    pub session_loss: SessionLossPolicy,
    /// Drop readings whose driver reported an error instead of encoding them
    pub skip_failed_readings: bool,
    pub payload_max_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub join_backoff_secs: u64,
    pub connected_poll_secs: u64,
    pub sample_interval_secs: u64,
    pub startup_grace_secs: u64,
}

impl TimingConfig {
    pub fn join_backoff(&self) -> Duration {
        Duration::from_secs(self.join_backoff_secs)
    }

    pub fn connected_poll(&self) -> Duration {
        Duration::from_secs(self.connected_poll_secs)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs)
    }

    pub fn startup_grace(&self) -> Duration {
        Duration::from_secs(self.startup_grace_secs)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Simulate a board whose transceiver does not answer detection
    pub present: bool,
    pub lora: LoraConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Simulated,
    Gwmp,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub backend: SessionBackend,
    pub simulated: SimulatedSessionConfig,
    pub gwmp: GwmpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulatedSessionConfig {
    /// Join attempts that fail before one succeeds
    pub join_failures: u32,
    pub join_latency_ms: u64,
    /// Report the session lost after this many uplinks
    pub drop_after_uplinks: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GwmpConfig {
    /// Network server (packet forwarder upstream) address
    pub server: String,
    /// Local bind address
    pub bind: String,
    /// Gateway EUI as 16 hex characters
    pub gateway_eui: String,
    pub ack_timeout_ms: u64,
    /// Consecutive unacknowledged uplinks after which the session counts as lost
    pub max_missed_acks: u32,
    pub f_port: u8,
}

impl GwmpConfig {
    pub fn gateway_eui(&self) -> anyhow::Result<[u8; 8]> {
        let bytes = hex::decode(&self.gateway_eui)
            .map_err(|e| anyhow::anyhow!("Invalid gateway EUI '{}': {}", self.gateway_eui, e))?;
        bytes
            .try_into()
            .map_err(|b: Vec<u8>| anyhow::anyhow!("Gateway EUI must be 8 bytes, got {}", b.len()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub name: String,
    pub role: SensorRole,
    pub temperature_channel: u8,
    pub humidity_channel: u8,
    pub baseline_milli_celsius: i32,
    pub baseline_centi_percent: i32,
    pub jitter_milli_celsius: i32,
    pub jitter_centi_percent: i32,
    pub needs_wake: bool,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl SensorConfig {
    pub fn channels(&self) -> ChannelTags {
        ChannelTags {
            temperature: self.temperature_channel,
            humidity: self.humidity_channel,
        }
    }

    /// Keep the simulated values inside what an SHTC3 can report
    pub fn validate(&self) -> anyhow::Result<()> {
        let checks = [
            ("baseline_milli_celsius", self.baseline_milli_celsius, -40_000..=125_000),
            ("baseline_centi_percent", self.baseline_centi_percent, 0..=10_000),
            ("jitter_milli_celsius", self.jitter_milli_celsius, 0..=50_000),
            ("jitter_centi_percent", self.jitter_centi_percent, 0..=10_000),
        ];
        for (field, value, range) in checks {
            if !range.contains(&value) {
                anyhow::bail!(
                    "sensor '{}': {} must be within {}..={}, got {}",
                    self.name,
                    field,
                    range.start(),
                    range.end(),
                    value
                );
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub startup_blinks: u32,
    pub blink_period_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {:?}: {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let t = &self.timing;
        if !(10..=20).contains(&t.startup_grace_secs) {
            anyhow::bail!(
                "startup_grace_secs must be within 10..=20, got {}",
                t.startup_grace_secs
            );
        }
        if t.join_backoff_secs == 0 || t.connected_poll_secs == 0 || t.sample_interval_secs == 0 {
            anyhow::bail!("timing intervals must be non-zero");
        }
        if self.sensors.is_empty() {
            anyhow::bail!("at least one sensor must be configured");
        }
        for sensor in &self.sensors {
            sensor.validate()?;
        }
        if self.node.payload_max_size == 0 {
            anyhow::bail!("payload_max_size must be non-zero");
        }
        if self.session.backend == SessionBackend::Gwmp {
            self.session.gwmp.gateway_eui()?;
        }
        self.radio.lora.validate()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            timing: TimingConfig::default(),
            radio: RadioConfig::default(),
            session: SessionConfig::default(),
            sensors: vec![SensorConfig::default()],
            indicator: IndicatorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            provider: ProviderProfile::default(),
            session_loss: SessionLossPolicy::default(),
            skip_failed_readings: false,
            payload_max_size: crate::payload::cayenne::DEFAULT_MAX_SIZE,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            join_backoff_secs: 300,
            connected_poll_secs: 3,
            sample_interval_secs: 180,
            startup_grace_secs: 10,
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            present: true,
            lora: LoraConfig::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Simulated,
            simulated: SimulatedSessionConfig::default(),
            gwmp: GwmpConfig::default(),
        }
    }
}

impl Default for SimulatedSessionConfig {
    fn default() -> Self {
        Self {
            join_failures: 0,
            join_latency_ms: 1_500,
            drop_after_uplinks: None,
        }
    }
}

impl Default for GwmpConfig {
    fn default() -> Self {
        Self {
            server: "127.0.0.1:1700".to_string(),
            bind: "0.0.0.0:0".to_string(),
            gateway_eui: "AA555A0000000001".to_string(),
            ack_timeout_ms: 2_000,
            max_missed_acks: 3,
            f_port: 1,
        }
    }
}

/// The onboard SHTC3 of the GNSE board
impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            name: "shtc3".to_string(),
            role: SensorRole::Onboard,
            temperature_channel: 1,
            humidity_channel: 2,
            baseline_milli_celsius: 22_100,
            baseline_centi_percent: 6_000,
            jitter_milli_celsius: 300,
            jitter_centi_percent: 150,
            needs_wake: true,
            seed: None,
        }
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            startup_blinks: 2,
            blink_period_ms: 200,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timing.join_backoff(), Duration::from_secs(300));
        assert_eq!(config.timing.sample_interval(), Duration::from_secs(180));
        assert_eq!(config.node.provider, ProviderProfile::Orange);
        assert_eq!(config.node.session_loss, SessionLossPolicy::Ignore);
    }

    #[test]
    fn test_two_sensor_file() {
        let config: Config = toml::from_str(
            r#"
            [node]
            provider = "ttn"
            session_loss = "rejoin"

            [timing]
            startup_grace_secs = 15

            [radio.lora]
            tx_power_dbm = 14

            [session]
            backend = "gwmp"

            [session.gwmp]
            server = "10.0.0.2:1700"

            [[sensors]]
            name = "soil"
            role = "external"
            needs_wake = false

            [[sensors]]
            name = "shtc3"
            role = "onboard"
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.node.provider, ProviderProfile::Ttn);
        assert_eq!(config.node.session_loss, SessionLossPolicy::Rejoin);
        assert_eq!(config.timing.startup_grace(), Duration::from_secs(15));
        assert_eq!(config.timing.join_backoff_secs, 300);
        assert_eq!(config.radio.lora.tx_power_dbm, 14);
        assert_eq!(config.session.backend, SessionBackend::Gwmp);
        assert_eq!(config.session.gwmp.ack_timeout_ms, 2_000);
        assert_eq!(config.sensors.len(), 2);
        assert_eq!(config.sensors[0].role, SensorRole::External);
        assert_eq!(config.sensors[0].channels(), config.sensors[1].channels());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_grace_out_of_range_rejected() {
        let mut config = Config::default();
        config.timing.startup_grace_secs = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sensor_bounds_rejected() {
        let config: Config = toml::from_str(
            r#"
            [[sensors]]
            name = "soil"
            jitter_milli_celsius = -2147483648
            "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("jitter_milli_celsius"), "{}", err);

        let mut config = Config::default();
        config.sensors[0].baseline_milli_celsius = i32::MAX;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sensors[0].baseline_centi_percent = -1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sensors[0].jitter_centi_percent = 10_001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_sensor_list_rejected() {
        let config: Config = toml::from_str("sensors = []").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_gateway_eui_parsing() {
        let mut gwmp = GwmpConfig::default();
        assert_eq!(
            gwmp.gateway_eui().unwrap(),
            [0xAA, 0x55, 0x5A, 0x00, 0x00, 0x00, 0x00, 0x01]
        );
        gwmp.gateway_eui = "AA55".to_string();
        assert!(gwmp.gateway_eui().is_err());
    }
}
