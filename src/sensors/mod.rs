//! Temperature / humidity sensors and their sampling order

pub mod simulated;

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::SensorError;

/// What a driver hands back for one measurement. Values are returned even
/// when `status` is an error, the way SHTC3-style drivers do.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub temperature_milli_celsius: i32,
    pub humidity_centi_percent: i32,
    pub status: Result<(), SensorError>,
}

pub trait TemperatureHumiditySensor: Send + 'static {
    fn name(&self) -> &str;

    /// Whether `wake` must be called before every read
    fn needs_wake(&self) -> bool {
        false
    }

    fn wake(&mut self) {}

    fn read_temperature_humidity(&mut self) -> RawSample;
}

/// Where a sensor sits. Sampling order follows declaration order:
/// the external probe is read before the onboard sensor heats the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorRole {
    External,
    Onboard,
}

/// Cayenne channels a sensor's measurements are tagged with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelTags {
    pub temperature: u8,
    pub humidity: u8,
}

impl Default for ChannelTags {
    fn default() -> Self {
        Self {
            temperature: 1,
            humidity: 2,
        }
    }
}

/// One reading, consumed by the encoder in the same cycle
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub role: SensorRole,
    pub channels: ChannelTags,
    pub temperature_milli_celsius: i32,
    pub humidity_centi_percent: i32,
    pub status: Result<(), SensorError>,
}

impl SensorReading {
    pub fn celsius(&self) -> f64 {
        self.temperature_milli_celsius as f64 / 1000.0
    }

    pub fn percent(&self) -> f64 {
        self.humidity_centi_percent as f64 / 100.0
    }
}

pub struct SensorSlot {
    pub role: SensorRole,
    pub channels: ChannelTags,
    sensor: Box<dyn TemperatureHumiditySensor>,
}

impl SensorSlot {
    pub fn new(
        role: SensorRole,
        channels: ChannelTags,
        sensor: impl TemperatureHumiditySensor,
    ) -> Self {
        Self {
            role,
            channels,
            sensor: Box::new(sensor),
        }
    }

    pub fn name(&self) -> &str {
        self.sensor.name()
    }

    pub fn wake_if_needed(&mut self) {
        if self.sensor.needs_wake() {
            self.sensor.wake();
        }
    }

    pub fn sample(&mut self) -> SensorReading {
        let raw = self.sensor.read_temperature_humidity();
        SensorReading {
            role: self.role,
            channels: self.channels,
            temperature_milli_celsius: raw.temperature_milli_celsius,
            humidity_centi_percent: raw.humidity_centi_percent,
            status: raw.status,
        }
    }
}

/// Put sensors in sampling order. Stable: equal roles keep their order.
pub fn order_for_sampling(slots: &mut [SensorSlot]) {
    slots.sort_by_key(|slot| slot.role);
}

/// Channels that more than one sensor writes to
pub fn shared_channels(slots: &[SensorSlot]) -> Vec<u8> {
    let mut users: BTreeMap<u8, usize> = BTreeMap::new();
    for slot in slots {
        *users.entry(slot.channels.temperature).or_default() += 1;
        if slot.channels.humidity != slot.channels.temperature {
            *users.entry(slot.channels.humidity).or_default() += 1;
        }
    }
    users
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(channel, _)| channel)
        .collect()
}
