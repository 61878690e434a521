mod clock;
mod config;
mod entropy;
mod error;
mod hexfmt;
mod identity;
mod indicator;
mod lorawan;
mod node;
mod payload;
mod radio;
mod scheduler;
mod sensors;
mod session;
mod state;
mod supervisor;
mod udp;

#[cfg(test)]
mod testing;

use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use clock::TokioClock;
use config::{Config, SessionBackend};
use entropy::RandomIdProvider;
use indicator::LogIndicator;
use node::{NodeParts, NodeSettings};
use payload::cayenne::CayenneEncoder;
use radio::host::HostRadio;
use radio::rfswitch::{FrontEndSwitch, LoggedLine};
use sensors::simulated::SimulatedSensor;
use sensors::SensorSlot;
use session::simulated::SimulatedSession;
use udp::{GwmpLink, GwmpSession};

#[derive(Parser)]
#[command(name = "gnse-node")]
#[command(about = "LoRaWAN temperature / humidity node for the Generic Node Sensor Edition")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config from {:?}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("GNSE node v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");
    info!("LoRaWAN Cayenne LPP sensor node");
    info!("===========================================");

    let settings = NodeSettings::from_config(&config);
    let parts = NodeParts {
        radio: HostRadio::new(config.radio.present, FrontEndSwitch::new(LoggedLine::wl55jc())),
        indicator: LogIndicator::new(),
        sensors: config
            .sensors
            .iter()
            .map(|s| SensorSlot::new(s.role, s.channels(), SimulatedSensor::from_config(s)))
            .collect(),
        encoder: CayenneEncoder::with_max_size(config.node.payload_max_size),
    };
    let mut entropy = RandomIdProvider::new();

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down...");
            shutdown.cancel();
        }
    });

    let result = match config.session.backend {
        SessionBackend::Simulated => {
            info!("Session backend: simulated");
            let cfg = config.session.simulated.clone();
            node::run(
                &settings,
                &mut entropy,
                parts,
                move |radio| SimulatedSession::new(&cfg, radio),
                TokioClock,
                cancel,
            )
            .await
        }
        SessionBackend::Gwmp => {
            info!("Session backend: GWMP via {}", config.session.gwmp.server);
            let cfg = config.session.gwmp.clone();
            let link = GwmpLink::open(&cfg).await?;
            node::run(
                &settings,
                &mut entropy,
                parts,
                move |radio| GwmpSession::new(link, &cfg, radio),
                TokioClock,
                cancel,
            )
            .await
        }
    };

    if let Err(e) = &result {
        error!("Node halted: {}", e);
    }
    Ok(result?)
}
