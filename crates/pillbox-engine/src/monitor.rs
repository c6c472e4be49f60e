//! Periodic sensor sampling loop.
//!
//! Every tick the monitor takes one distance measurement and one climate
//! read and publishes the combined snapshot on an mpsc channel. A sensor
//! that fails this tick contributes `None` to the snapshot; the loop itself
//! never stops on a sensor error, only on shutdown or when the event
//! receiver goes away.

use pillbox_core::constants::SENSOR_TICK_INTERVAL;
use pillbox_core::{ClimateReading, ContainerStatus, DistanceReading};
use pillbox_devices::{ClimateProbe, ClimateSensor, RangeSensor};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// One sampling cycle's worth of sensor data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorEvent {
    /// Raw distance measurement, if the ranging succeeded.
    pub distance: Option<DistanceReading>,

    /// Fill level derived from the distance, if available.
    pub container: Option<ContainerStatus>,

    /// Climate sample, if one of the read attempts succeeded.
    pub climate: Option<ClimateReading>,
}

/// Periodic sampler publishing [`SensorEvent`]s.
pub struct SensorMonitor<P> {
    range: RangeSensor,
    climate: ClimateSensor<P>,
    events: mpsc::Sender<SensorEvent>,
    tick_interval: Duration,
}

impl<P: ClimateProbe> SensorMonitor<P> {
    /// Create a monitor with the default 2 s cadence.
    pub fn new(
        range: RangeSensor,
        climate: ClimateSensor<P>,
        events: mpsc::Sender<SensorEvent>,
    ) -> Self {
        Self {
            range,
            climate,
            events,
            tick_interval: SENSOR_TICK_INTERVAL,
        }
    }

    /// Set a custom sampling interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Take one sample from each sensor.
    pub async fn sample(&mut self) -> SensorEvent {
        let distance = match self.range.measure_distance().await {
            Ok(reading) => Some(reading),
            Err(e) => {
                warn!(error = %e, "distance measurement unavailable");
                None
            }
        };
        let container = distance.map(|d| d.status());
        let climate = self.climate.read().await;

        debug!(?container, ?climate, "sensor sample");
        SensorEvent {
            distance,
            container,
            climate,
        }
    }

    /// Run the sampling loop until shutdown is signalled or the receiver
    /// is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval = ?self.tick_interval, "sensor monitor started");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let event = self.sample().await;
                    if self.events.send(event).await.is_err() {
                        info!("sensor event receiver dropped, monitor stopping");
                        break;
                    }
                }
                _ = shutdown.changed() => {
                    info!("sensor monitor stopping");
                    break;
                }
            }
        }
    }
}
