//! Startup sequence and task wiring

use rand::RngCore;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::Config;
use crate::entropy::RandomIdProvider;
use crate::error::NodeError;
use crate::hexfmt::to_hex;
use crate::identity::{ProviderProfile, SessionIdentity};
use crate::indicator::{startup_blink, Indicator};
use crate::payload::PayloadEncoder;
use crate::radio::{LoraConfig, Radio};
use crate::scheduler::{SamplingScheduler, SchedulerSettings};
use crate::sensors::SensorSlot;
use crate::session::{self, NetworkSession};
use crate::state::ConnectionPublisher;
use crate::supervisor::{ConnectivitySupervisor, SupervisorSettings};

#[derive(Debug, Clone)]
pub struct NodeSettings {
    pub profile: ProviderProfile,
    pub lora: LoraConfig,
    pub startup_blinks: u32,
    pub blink_period: Duration,
    pub supervisor: SupervisorSettings,
    pub scheduler: SchedulerSettings,
}

impl NodeSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            profile: config.node.provider,
            lora: config.radio.lora.clone(),
            startup_blinks: config.indicator.startup_blinks,
            blink_period: Duration::from_millis(config.indicator.blink_period_ms),
            supervisor: SupervisorSettings::from_config(config),
            scheduler: SchedulerSettings::from_config(config),
        }
    }
}

/// Hardware-facing pieces handed to `run`
pub struct NodeParts<R, I, E> {
    pub radio: R,
    pub indicator: I,
    pub sensors: Vec<SensorSlot>,
    pub encoder: E,
}

/// Bring the node up and run it until `cancel` fires.
///
/// `attach` turns the configured radio into the network session; it is only
/// called once the radio answered detection. The supervisor runs on its own
/// task, the scheduler on the caller's.
pub async fn run<R, S, I, E, C, G>(
    settings: &NodeSettings,
    entropy: &mut RandomIdProvider<G>,
    parts: NodeParts<R, I, E>,
    attach: impl FnOnce(R) -> S,
    clock: C,
    cancel: CancellationToken,
) -> Result<(), NodeError>
where
    R: Radio,
    S: NetworkSession,
    I: Indicator,
    E: PayloadEncoder,
    C: Clock,
    G: RngCore,
{
    let NodeParts {
        mut radio,
        mut indicator,
        sensors,
        encoder,
    } = parts;

    startup_blink(
        &mut indicator,
        &clock,
        settings.startup_blinks,
        settings.blink_period,
    )
    .await;

    let profile = settings.profile;
    info!("Provider: {}", profile);
    info!("AppEUI: {}", to_hex(&profile.network_id()));
    info!("DevEUI: {}", to_hex(&profile.device_id()));
    debug!("AppKey: {}", to_hex(&profile.session_key()));

    let nonce = entropy.rand16().map_err(|e| {
        error!("Cannot draw DevNonce: {}", e);
        e
    })?;
    info!("DevNonce: {}", to_hex(&nonce));
    let identity = SessionIdentity::new(profile, nonce);

    if !radio.detect_device() {
        error!("sx126x not detected");
        return Err(NodeError::HardwareAbsent);
    }
    radio.configure(&settings.lora);

    let session = session::shared(attach(radio));

    let (publisher, connection) = ConnectionPublisher::new();
    let supervisor = ConnectivitySupervisor::new(
        session.clone(),
        identity,
        indicator,
        publisher,
        clock.clone(),
        settings.supervisor.clone(),
    );
    let supervisor_task = tokio::spawn(supervisor.run(cancel.clone()));

    let scheduler = SamplingScheduler::new(
        sensors,
        encoder,
        session,
        connection,
        clock,
        settings.scheduler.clone(),
    );
    let cycles = scheduler.run(cancel.clone()).await;

    // the scheduler only returns once cancelled; bring the supervisor down too
    cancel.cancel();
    match supervisor_task.await {
        Ok(stats) => info!(
            "Node stopped: {} cycle(s), {} join attempt(s)",
            cycles, stats.join_attempts
        ),
        Err(e) => warn!("Supervisor task ended abnormally: {}", e),
    }
    Ok(())
}
