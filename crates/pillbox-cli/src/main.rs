//! Pillbox dispenser controller binary.
//!
//! Wires the hardware port, devices, schedule store, and the two control
//! loops together, then runs until Ctrl-C. Shutdown order matters: the
//! loops stop first (finishing any tick in progress), then the actuator
//! parks the servo closed, then the database pool closes.

mod config;

use anyhow::Context;
use config::{Backend, DevicePins, PillboxConfig};
use pillbox_devices::{
    AnyClimateProbe, ClimateSensor, DispenseActuator, RangeSensor, SimProbe,
};
use pillbox_engine::{LogNotifier, ScheduleEngine, SensorMonitor, SystemClock};
use pillbox_hardware::{AnyHardwarePort, SimPort, SimPortHandle, shared};
use pillbox_storage::{Database, DatabaseConfig, SqliteScheduleRepository};
use std::path::Path;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Distance the simulator reports, chosen to read as a half-full container.
const SIM_DISTANCE_CM: f64 = 10.0;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Build the hardware port for the configured backend.
///
/// An `rpi` backend that cannot be opened (or was not compiled in) falls
/// back to the simulator so the controller still comes up for development.
fn build_port(config: &PillboxConfig, pins: &DevicePins) -> (AnyHardwarePort, Option<SimPortHandle>) {
    match config.backend {
        Backend::Sim => sim_port(pins),
        Backend::Rpi => {
            #[cfg(feature = "rpi")]
            {
                match pillbox_hardware::GpioPort::new(&[pins.servo, pins.trigger], &[pins.echo]) {
                    Ok(gpio) => {
                        info!("using GPIO hardware port");
                        return (AnyHardwarePort::Gpio(gpio), None);
                    }
                    Err(e) => warn!(error = %e, "GPIO unavailable, falling back to simulator"),
                }
            }
            #[cfg(not(feature = "rpi"))]
            warn!("rpi backend requested but this build has no rpi feature, using simulator");
            sim_port(pins)
        }
    }
}

fn sim_port(pins: &DevicePins) -> (AnyHardwarePort, Option<SimPortHandle>) {
    let (sim, handle) = SimPort::new();
    handle.simulate_distance(pins.trigger, pins.echo, SIM_DISTANCE_CM);
    info!("using simulated hardware port");
    (AnyHardwarePort::Sim(sim), Some(handle))
}

/// Build the climate probe for the configured backend.
fn build_probe(config: &PillboxConfig, pins: &DevicePins) -> AnyClimateProbe {
    match config.backend {
        Backend::Sim => AnyClimateProbe::Sim(SimProbe::new()),
        Backend::Rpi => {
            #[cfg(feature = "rpi")]
            {
                match pillbox_devices::Dht22Probe::new(pins.climate) {
                    Ok(probe) => return AnyClimateProbe::Dht22(probe),
                    Err(e) => warn!(error = %e, "DHT22 unavailable, using simulated probe"),
                }
            }
            #[cfg(not(feature = "rpi"))]
            let _ = pins;
            AnyClimateProbe::Sim(SimProbe::new())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config_path = std::env::args().nth(1);
    let config = PillboxConfig::load_or_default(config_path.as_deref().map(Path::new))?;
    let pins = config.pins()?;
    info!(
        backend = ?config.backend,
        servo = %pins.servo,
        trigger = %pins.trigger,
        echo = %pins.echo,
        climate = %pins.climate,
        "starting pillbox controller"
    );

    let (port, _sim_handle) = build_port(&config, &pins);
    let port = shared(port);

    let db = Database::new(DatabaseConfig::new(&config.database_path))
        .await
        .context("opening schedule database")?;
    let repo = SqliteScheduleRepository::new(db.pool().clone());

    let range = RangeSensor::new(port.clone(), pins.trigger, pins.echo);
    let climate = ClimateSensor::new(build_probe(&config, &pins));
    let actuator = DispenseActuator::new(port.clone(), pins.servo);

    let (events_tx, mut events_rx) = mpsc::channel(32);
    let monitor = SensorMonitor::new(range, climate, events_tx);
    let engine = ScheduleEngine::new(repo, LogNotifier, SystemClock, actuator.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor_task = tokio::spawn(monitor.run(shutdown_rx.clone()));
    let engine_task = tokio::spawn(engine.run(shutdown_rx));

    // Log container level transitions; the raw 2 s stream stays at debug.
    // A tick with no reading keeps the previous level rather than
    // overwriting it.
    let status_task = tokio::spawn(async move {
        let mut last = None;
        while let Some(event) = events_rx.recv().await {
            if let Some(status) = event.container
                && last != Some(status)
            {
                info!(%status, "container level changed");
                last = Some(status);
            }
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown requested");

    let _ = shutdown_tx.send(true);
    monitor_task.await.context("sensor monitor task")?;
    engine_task.await.context("schedule engine task")?;
    status_task.await.context("status task")?;

    // Park the servo closed before the process exits.
    if let Err(e) = actuator.shutdown().await {
        warn!(error = %e, "actuator shutdown failed");
    }
    db.close().await;

    info!("pillbox controller stopped");
    Ok(())
}
