//! Periodic sample, encode and uplink cycle.
//!
//! The scheduler never joins. It reads the connection state published by the
//! supervisor and transmits only while Connected; cycles taken while
//! disconnected still sample and encode, and are then dropped.

use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::{pause, Clock};
use crate::config::Config;
use crate::error::{EncodeError, SendError};
use crate::hexfmt::to_hex;
use crate::payload::PayloadEncoder;
use crate::sensors::{order_for_sampling, shared_channels, SensorSlot};
use crate::session::{NetworkSession, SharedSession};
use crate::state::ConnectionState;

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub sample_interval: Duration,
    pub startup_grace: Duration,
    pub skip_failed_readings: bool,
}

impl SchedulerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sample_interval: config.timing.sample_interval(),
            startup_grace: config.timing.startup_grace(),
            skip_failed_readings: config.node.skip_failed_readings,
        }
    }
}

/// How one cycle ended
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Sent { bytes: usize },
    SendFailed(SendError),
    NotConnected,
    EncodeFailed(EncodeError),
}

pub struct SamplingScheduler<S, E, C> {
    sensors: Vec<SensorSlot>,
    encoder: E,
    session: SharedSession<S>,
    connection: watch::Receiver<ConnectionState>,
    clock: C,
    settings: SchedulerSettings,
    cycles: u64,
}

impl<S, E, C> SamplingScheduler<S, E, C>
where
    S: NetworkSession,
    E: PayloadEncoder,
    C: Clock,
{
    /// Sensors are put in sampling order here, once
    pub fn new(
        mut sensors: Vec<SensorSlot>,
        encoder: E,
        session: SharedSession<S>,
        connection: watch::Receiver<ConnectionState>,
        clock: C,
        settings: SchedulerSettings,
    ) -> Self {
        order_for_sampling(&mut sensors);

        let shared = shared_channels(&sensors);
        if !shared.is_empty() {
            warn!(
                "Cayenne channel(s) {:?} carry readings from more than one sensor; \
                 receivers cannot tell them apart",
                shared
            );
        }

        Self {
            sensors,
            encoder,
            session,
            connection,
            clock,
            settings,
            cycles: 0,
        }
    }

    /// Run one sampling cycle
    pub async fn cycle(&mut self) -> CycleOutcome {
        self.cycles += 1;

        for slot in self.sensors.iter_mut() {
            slot.wake_if_needed();
        }
        let readings: Vec<_> = self.sensors.iter_mut().map(|slot| slot.sample()).collect();

        self.encoder.reset();
        for reading in &readings {
            if let Err(e) = &reading.status {
                if self.settings.skip_failed_readings {
                    warn!("{:?} sensor: {}, reading dropped", reading.role, e);
                    continue;
                }
                warn!("{:?} sensor: {}, encoding reading as reported", reading.role, e);
            }
            debug!(
                "{:?}: {:.2} °C, {:.2} %RH",
                reading.role,
                reading.celsius(),
                reading.percent()
            );
            self.encoder
                .add_temperature(reading.channels.temperature, reading.celsius());
            self.encoder
                .add_relative_humidity(reading.channels.humidity, reading.percent());
        }

        let payload = match self.encoder.bytes() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Payload encoding failed: {}, nothing sent", e);
                return CycleOutcome::EncodeFailed(e);
            }
        };

        let connected = self.connection.borrow().is_connected();
        if !connected {
            info!("Waiting for LoRaWAN connectivity, payload {} dropped", to_hex(&payload));
            return CycleOutcome::NotConnected;
        }

        info!("Sending Cayenne: {}", to_hex(&payload));
        let result = self.session.lock().await.send_uplink(&payload).await;
        match result {
            Ok(()) => CycleOutcome::Sent {
                bytes: payload.len(),
            },
            Err(e) => {
                warn!("Uplink failed: {}", e);
                CycleOutcome::SendFailed(e)
            }
        }
    }

    /// Wait out the startup grace, then cycle every interval until
    /// `cancel` fires. Returns the number of cycles run.
    pub async fn run(mut self, cancel: CancellationToken) -> u64 {
        info!(
            "Sampling {} sensor(s) every {}s after {}s grace",
            self.sensors.len(),
            self.settings.sample_interval.as_secs(),
            self.settings.startup_grace.as_secs()
        );
        if !pause(&self.clock, self.settings.startup_grace, &cancel).await {
            return self.cycles;
        }

        loop {
            let outcome = self.cycle().await;
            debug!("Cycle {}: {:?}", self.cycles, outcome);

            info!("Sleep {}s", self.settings.sample_interval.as_secs());
            if !pause(&self.clock, self.settings.sample_interval, &cancel).await {
                break;
            }
        }
        self.cycles
    }
}
