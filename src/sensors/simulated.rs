//! Simulated SHTC3-like sensor for host runs

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{RawSample, TemperatureHumiditySensor};
use crate::config::SensorConfig;
use crate::error::SensorError;

pub struct SimulatedSensor {
    name: String,
    baseline_milli_celsius: i32,
    baseline_centi_percent: i32,
    jitter_milli_celsius: i32,
    jitter_centi_percent: i32,
    needs_wake: bool,
    awake: bool,
    rng: StdRng,
}

impl SimulatedSensor {
    pub fn from_config(cfg: &SensorConfig) -> Self {
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            name: cfg.name.clone(),
            baseline_milli_celsius: cfg.baseline_milli_celsius,
            baseline_centi_percent: cfg.baseline_centi_percent,
            jitter_milli_celsius: cfg.jitter_milli_celsius.saturating_abs(),
            jitter_centi_percent: cfg.jitter_centi_percent.saturating_abs(),
            needs_wake: cfg.needs_wake,
            awake: false,
            rng,
        }
    }
}

impl TemperatureHumiditySensor for SimulatedSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn needs_wake(&self) -> bool {
        self.needs_wake
    }

    fn wake(&mut self) {
        self.awake = true;
    }

    fn read_temperature_humidity(&mut self) -> RawSample {
        if self.needs_wake && !self.awake {
            return RawSample {
                temperature_milli_celsius: 0,
                humidity_centi_percent: 0,
                status: Err(SensorError::NotAwake),
            };
        }
        // goes back to sleep after each measurement
        self.awake = false;

        let jt = self.jitter_milli_celsius;
        let jh = self.jitter_centi_percent;
        let temperature = self
            .baseline_milli_celsius
            .saturating_add(self.rng.gen_range(-jt..=jt));
        let humidity = self
            .baseline_centi_percent
            .saturating_add(self.rng.gen_range(-jh..=jh))
            .clamp(0, 10_000);

        RawSample {
            temperature_milli_celsius: temperature,
            humidity_centi_percent: humidity,
            status: Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::SensorRole;

    fn config(needs_wake: bool) -> SensorConfig {
        SensorConfig {
            name: "shtc3".to_string(),
            role: SensorRole::Onboard,
            temperature_channel: 1,
            humidity_channel: 2,
            baseline_milli_celsius: 22_100,
            baseline_centi_percent: 6_000,
            jitter_milli_celsius: 200,
            jitter_centi_percent: 100,
            needs_wake,
            seed: Some(7),
        }
    }

    #[test]
    fn test_read_without_wake_reports_error() {
        let mut s = SimulatedSensor::from_config(&config(true));
        let sample = s.read_temperature_humidity();
        assert_eq!(sample.status, Err(SensorError::NotAwake));
    }

    #[test]
    fn test_wake_then_read_stays_in_jitter_band() {
        let mut s = SimulatedSensor::from_config(&config(true));
        for _ in 0..100 {
            s.wake();
            let sample = s.read_temperature_humidity();
            assert!(sample.status.is_ok());
            assert!((21_900..=22_300).contains(&sample.temperature_milli_celsius));
            assert!((5_900..=6_100).contains(&sample.humidity_centi_percent));
        }
    }

    #[test]
    fn test_sensor_sleeps_after_measurement() {
        let mut s = SimulatedSensor::from_config(&config(true));
        s.wake();
        assert!(s.read_temperature_humidity().status.is_ok());
        assert!(s.read_temperature_humidity().status.is_err());
    }

    #[test]
    fn test_extreme_settings_saturate() {
        let mut s = SimulatedSensor::from_config(&SensorConfig {
            baseline_milli_celsius: i32::MAX,
            baseline_centi_percent: i32::MIN,
            jitter_milli_celsius: i32::MIN,
            jitter_centi_percent: i32::MIN,
            ..config(false)
        });
        for _ in 0..100 {
            let sample = s.read_temperature_humidity();
            assert!(sample.status.is_ok());
            assert!(sample.temperature_milli_celsius >= 0);
            assert!((0..=10_000).contains(&sample.humidity_centi_percent));
        }
    }

    #[test]
    fn test_same_seed_same_values() {
        let mut a = SimulatedSensor::from_config(&config(false));
        let mut b = SimulatedSensor::from_config(&config(false));
        assert_eq!(a.read_temperature_humidity(), b.read_temperature_humidity());
    }
}
