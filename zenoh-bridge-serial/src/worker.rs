//! Scheduled worker driving the publication cycle.

use std::sync::Arc;

use sensorgate_bridge_framework::{LivelinessManager, PeriodicTask, VariablePublisher};

use crate::cycle::{CycleError, CycleOutcome, PublicationCycle};
use crate::source::ByteSource;

/// Periodic task running one [`PublicationCycle`] per tick.
///
/// Also tracks whether the device behind the port is producing records. The
/// device is reported alive after its first published record and offline
/// again after `stale_after_cycles` ticks in a row without one.
pub struct SerialBridge<S, P> {
    device: String,
    cycle: PublicationCycle<S, P>,
    liveliness: Option<Arc<LivelinessManager>>,
    stale_after_cycles: u32,
    idle_cycles: u32,
    device_alive: bool,
}

impl<S: ByteSource, P: VariablePublisher> SerialBridge<S, P> {
    pub fn new(
        device: impl Into<String>,
        cycle: PublicationCycle<S, P>,
        stale_after_cycles: u32,
    ) -> Self {
        Self {
            device: device.into(),
            cycle,
            liveliness: None,
            stale_after_cycles,
            idle_cycles: 0,
            device_alive: false,
        }
    }

    /// Publish device presence through liveliness tokens.
    pub fn with_liveliness(mut self, liveliness: Arc<LivelinessManager>) -> Self {
        self.liveliness = Some(liveliness);
        self
    }

    pub fn cycle(&self) -> &PublicationCycle<S, P> {
        &self.cycle
    }

    pub fn is_device_alive(&self) -> bool {
        self.device_alive
    }

    /// Run one cycle and update device presence.
    pub async fn tick(&mut self) {
        let published = {
            let result = self.cycle.run_once().await;
            self.log_outcome(&result);
            matches!(result, Ok(CycleOutcome::Published(_)))
        };
        self.update_presence(published).await;
    }

    fn log_outcome(&self, result: &Result<CycleOutcome, CycleError>) {
        let device = self.device.as_str();

        match result {
            Ok(CycleOutcome::Pending { buffered }) => {
                tracing::debug!(device, buffered, "Waiting for complete frame");
            }
            Ok(CycleOutcome::Published(report)) => {
                let record = &report.record;
                tracing::info!(
                    device,
                    temperature = record.temperature,
                    humidity = record.humidity,
                    accel_x = record.accel_x,
                    accel_y = record.accel_y,
                    accel_z = record.accel_z,
                    "Sensor record published"
                );
                if report.failed > 0 {
                    tracing::warn!(
                        device,
                        written = report.written,
                        failed = report.failed,
                        "Some variables were not updated"
                    );
                }
            }
            Err(e @ CycleError::TransportOpen(_)) => {
                tracing::error!(device, error = %e, "Serial port unavailable");
            }
            Err(e @ CycleError::BufferOverflow { .. }) => {
                let stats = self.cycle.stats();
                tracing::warn!(
                    device,
                    error = %e,
                    overflows = stats.overflows,
                    "Discarded unframed bytes"
                );
            }
            Err(e) => {
                tracing::warn!(device, error = %e, "Cycle failed");
            }
        }
    }

    async fn update_presence(&mut self, published: bool) {
        if published {
            self.idle_cycles = 0;
            if !self.device_alive {
                self.device_alive = declare_alive(self.liveliness.as_deref(), &self.device).await;
            }
            return;
        }

        self.idle_cycles = self.idle_cycles.saturating_add(1);

        if self.device_alive
            && self.stale_after_cycles > 0
            && self.idle_cycles >= self.stale_after_cycles
        {
            tracing::warn!(
                device = %self.device,
                idle_cycles = self.idle_cycles,
                "No records from device, marking offline"
            );
            if let Some(ref liveliness) = self.liveliness {
                liveliness.undeclare_device(&self.device).await;
            }
            self.device_alive = false;
        }
    }
}

async fn declare_alive(liveliness: Option<&LivelinessManager>, device: &str) -> bool {
    let Some(liveliness) = liveliness else {
        return true;
    };

    match liveliness.declare_device_alive(device).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(device, error = %e, "Failed to declare device alive");
            false
        }
    }
}

impl<S: ByteSource + 'static, P: VariablePublisher + 'static> PeriodicTask for SerialBridge<S, P> {
    async fn run(&mut self) {
        self.tick().await;
    }
}
