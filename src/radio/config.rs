//! Static LoRa modem parameters applied once before the first join

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Bandwidth {
    #[serde(rename = "125")]
    Khz125,
    #[serde(rename = "250")]
    Khz250,
    #[serde(rename = "500")]
    Khz500,
}

impl Bandwidth {
    pub fn khz(&self) -> u32 {
        match self {
            Bandwidth::Khz125 => 125,
            Bandwidth::Khz250 => 250,
            Bandwidth::Khz500 => 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CodingRate {
    #[serde(rename = "4/5")]
    Cr45,
    #[serde(rename = "4/6")]
    Cr46,
    #[serde(rename = "4/7")]
    Cr47,
    #[serde(rename = "4/8")]
    Cr48,
}

impl CodingRate {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodingRate::Cr45 => "4/5",
            CodingRate::Cr46 => "4/6",
            CodingRate::Cr47 => "4/7",
            CodingRate::Cr48 => "4/8",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncWord {
    /// LoRaWAN public networks
    Public,
    Private,
}

impl SyncWord {
    /// SX126x register value
    pub fn value(&self) -> u16 {
        match self {
            SyncWord::Public => 0x3444,
            SyncWord::Private => 0x1424,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoraConfig {
    pub frequency_hz: u32,
    pub bandwidth: Bandwidth,
    pub spreading_factor: u8,
    pub coding_rate: CodingRate,
    pub explicit_header: bool,
    pub preamble_len: u16,
    pub low_data_rate_optimize: bool,
    pub iq_inverted: bool,
    pub crc: bool,
    pub sync_word: SyncWord,
    pub tx_power_dbm: i8,
}

impl Default for LoraConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 868_100_000,
            bandwidth: Bandwidth::Khz125,
            spreading_factor: 9,
            coding_rate: CodingRate::Cr47,
            explicit_header: true,
            preamble_len: 12,
            low_data_rate_optimize: false,
            iq_inverted: false,
            crc: true,
            sync_word: SyncWord::Public,
            tx_power_dbm: 20,
        }
    }
}

impl LoraConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(5..=12).contains(&self.spreading_factor) {
            anyhow::bail!("spreading factor SF{} not in SF5..SF12", self.spreading_factor);
        }
        if !(150_000_000..=960_000_000).contains(&self.frequency_hz) {
            anyhow::bail!("frequency {} Hz outside 150-960 MHz", self.frequency_hz);
        }
        if !(-9..=22).contains(&self.tx_power_dbm) {
            anyhow::bail!("tx power {} dBm outside -9..22 dBm", self.tx_power_dbm);
        }
        Ok(())
    }

    /// Data rate identifier as used in packet forwarder JSON, e.g. "SF9BW125"
    pub fn data_rate(&self) -> String {
        format!("SF{}BW{}", self.spreading_factor, self.bandwidth.khz())
    }

    pub fn frequency_mhz(&self) -> f64 {
        self.frequency_hz as f64 / 1_000_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_eu868_deployment() {
        let cfg = LoraConfig::default();
        assert_eq!(cfg.frequency_hz, 868_100_000);
        assert_eq!(cfg.data_rate(), "SF9BW125");
        assert_eq!(cfg.coding_rate.as_str(), "4/7");
        assert_eq!(cfg.sync_word.value(), 0x3444);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_table() {
        let cfg: LoraConfig = toml::from_str(
            r#"
            spreading_factor = 7
            bandwidth = "250"
            coding_rate = "4/5"
            sync_word = "private"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.data_rate(), "SF7BW250");
        assert_eq!(cfg.coding_rate, CodingRate::Cr45);
        assert_eq!(cfg.sync_word, SyncWord::Private);
        assert_eq!(cfg.tx_power_dbm, 20);
    }

    #[test]
    fn test_validate_rejects_bad_sf() {
        let cfg = LoraConfig {
            spreading_factor: 13,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
