//! Test doubles shared across module tests

use rand::RngCore;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::error::{EncodeError, JoinError, SendError, SensorError};
use crate::identity::SessionIdentity;
use crate::indicator::Indicator;
use crate::payload::PayloadEncoder;
use crate::radio::{LoraConfig, Radio};
use crate::sensors::{RawSample, TemperatureHumiditySensor};
use crate::session::NetworkSession;

/// Records every requested delay instead of sleeping. Cancels `cancel`
/// once `stop_after` delays were requested.
#[derive(Clone)]
pub struct RecordingClock {
    sleeps: Arc<Mutex<Vec<Duration>>>,
    stop_after: usize,
    cancel: CancellationToken,
}

impl RecordingClock {
    pub fn new(cancel: CancellationToken, stop_after: usize) -> Self {
        Self {
            sleeps: Arc::new(Mutex::new(Vec::new())),
            stop_after,
            cancel,
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        let count = {
            let mut sleeps = self.sleeps.lock().unwrap();
            sleeps.push(duration);
            sleeps.len()
        };
        if count >= self.stop_after {
            self.cancel.cancel();
        }
        // let other tasks run, as a real sleep would
        tokio::task::yield_now().await;
    }
}

/// Entropy source that always fails
pub struct BrokenEntropy;

impl RngCore for BrokenEntropy {
    fn next_u32(&mut self) -> u32 {
        panic!("BrokenEntropy has no output")
    }

    fn next_u64(&mut self) -> u64 {
        panic!("BrokenEntropy has no output")
    }

    fn fill_bytes(&mut self, _dest: &mut [u8]) {
        panic!("BrokenEntropy has no output")
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
        Err(rand::Error::new(std::io::Error::other("rng peripheral fault")))
    }
}

#[derive(Clone, Default)]
pub struct RecordingIndicator {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingIndicator {
    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }

    pub fn toggles(&self) -> usize {
        self.events().iter().filter(|e| **e == "toggle").count()
    }

    fn push(&self, event: &'static str) {
        self.events.lock().unwrap().push(event);
    }
}

impl Indicator for RecordingIndicator {
    fn configure(&mut self) {
        self.push("configure");
    }

    fn set_high(&mut self) {
        self.push("high");
    }

    fn set_low(&mut self) {
        self.push("low");
    }

    fn toggle(&mut self) {
        self.push("toggle");
    }
}

/// Sensor returning the same values on every read
pub struct FixedSensor {
    name: &'static str,
    milli_celsius: i32,
    centi_percent: i32,
    status: Result<(), SensorError>,
    needs_wake: bool,
    log: Option<Arc<Mutex<Vec<String>>>>,
}

impl FixedSensor {
    pub fn new(name: &'static str, milli_celsius: i32, centi_percent: i32) -> Self {
        Self {
            name,
            milli_celsius,
            centi_percent,
            status: Ok(()),
            needs_wake: false,
            log: None,
        }
    }

    pub fn failing(mut self, error: SensorError) -> Self {
        self.status = Err(error);
        self
    }

    pub fn needing_wake(mut self) -> Self {
        self.needs_wake = true;
        self
    }

    /// Append "wake:<name>" and "read:<name>" to `log`
    pub fn logging_to(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
        self.log = Some(log);
        self
    }

    fn note(&self, what: &str) {
        if let Some(log) = &self.log {
            log.lock().unwrap().push(format!("{}:{}", what, self.name));
        }
    }
}

impl TemperatureHumiditySensor for FixedSensor {
    fn name(&self) -> &str {
        self.name
    }

    fn needs_wake(&self) -> bool {
        self.needs_wake
    }

    fn wake(&mut self) {
        self.note("wake");
    }

    fn read_temperature_humidity(&mut self) -> RawSample {
        self.note("read");
        RawSample {
            temperature_milli_celsius: self.milli_celsius,
            humidity_centi_percent: self.centi_percent,
            status: self.status.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EncoderCall {
    Reset,
    Temperature(u8, f64),
    Humidity(u8, f64),
    Bytes,
}

/// Encoder that records its calls and returns a canned result
pub struct RecordingEncoder {
    calls: Arc<Mutex<Vec<EncoderCall>>>,
    output: Result<Vec<u8>, EncodeError>,
}

impl RecordingEncoder {
    pub fn new(output: Result<Vec<u8>, EncodeError>) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            output,
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<EncoderCall>>> {
        self.calls.clone()
    }

    fn push(&self, call: EncoderCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PayloadEncoder for RecordingEncoder {
    fn reset(&mut self) {
        self.push(EncoderCall::Reset);
    }

    fn add_temperature(&mut self, channel: u8, celsius: f64) {
        self.push(EncoderCall::Temperature(channel, celsius));
    }

    fn add_relative_humidity(&mut self, channel: u8, percent: f64) {
        self.push(EncoderCall::Humidity(channel, percent));
    }

    fn bytes(&self) -> Result<Vec<u8>, EncodeError> {
        self.push(EncoderCall::Bytes);
        self.output.clone()
    }
}

#[derive(Debug, Default)]
pub struct SessionLog {
    pub join_calls: u32,
    pub uplinks: Vec<Vec<u8>>,
}

/// Session whose join and send outcomes are scripted up front
pub struct ScriptedSession {
    log: Arc<Mutex<SessionLog>>,
    join_failures: u32,
    send_result: Result<(), SendError>,
    lose_after_checks: Option<u32>,
    checks: AtomicU32,
}

impl ScriptedSession {
    /// Fail the first `join_failures` joins, then succeed
    pub fn new(join_failures: u32) -> Self {
        Self {
            log: Arc::new(Mutex::new(SessionLog::default())),
            join_failures,
            send_result: Ok(()),
            lose_after_checks: None,
            checks: AtomicU32::new(0),
        }
    }

    pub fn never_joins() -> Self {
        Self::new(u32::MAX)
    }

    pub fn with_send_result(mut self, result: Result<(), SendError>) -> Self {
        self.send_result = result;
        self
    }

    /// Report the session lost on the `n`th liveness check after each join
    pub fn losing_after_checks(mut self, n: u32) -> Self {
        self.lose_after_checks = Some(n);
        self
    }

    pub fn log(&self) -> Arc<Mutex<SessionLog>> {
        self.log.clone()
    }
}

impl NetworkSession for ScriptedSession {
    async fn join(&mut self, _identity: &SessionIdentity) -> Result<(), JoinError> {
        let attempt = {
            let mut log = self.log.lock().unwrap();
            log.join_calls += 1;
            log.join_calls
        };
        if attempt <= self.join_failures {
            return Err(JoinError::Timeout);
        }
        self.checks.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn send_uplink(&mut self, payload: &[u8]) -> Result<(), SendError> {
        self.log.lock().unwrap().uplinks.push(payload.to_vec());
        self.send_result.clone()
    }

    fn session_active(&self) -> bool {
        let checks = self.checks.fetch_add(1, Ordering::SeqCst) + 1;
        match self.lose_after_checks {
            Some(limit) => checks < limit,
            None => true,
        }
    }
}

/// Radio double counting detect and configure calls
pub struct StubRadio {
    present: bool,
    detects: Arc<AtomicUsize>,
    configured: Option<LoraConfig>,
}

impl StubRadio {
    pub fn new(present: bool) -> Self {
        Self {
            present,
            detects: Arc::new(AtomicUsize::new(0)),
            configured: None,
        }
    }

    pub fn detects(&self) -> Arc<AtomicUsize> {
        self.detects.clone()
    }

    pub fn configured(&self) -> Option<&LoraConfig> {
        self.configured.as_ref()
    }
}

impl Radio for StubRadio {
    fn detect_device(&mut self) -> bool {
        self.detects.fetch_add(1, Ordering::SeqCst);
        self.present
    }

    fn configure(&mut self, config: &LoraConfig) {
        self.configured = Some(config.clone());
    }
}
