//! Zenoh bridge for serial sensor devices.
//!
//! Polls a serial port for JSON sensor records and publishes every field as a
//! Zenoh variable node.

use std::sync::Arc;

use anyhow::{Context, Result};
use sensorgate_bridge_framework::{BridgeArgs, BridgeConfig, BridgeRunner, VariableServer};

use zenoh_bridge_serial::config::SerialBridgeConfig;
use zenoh_bridge_serial::cycle::PublicationCycle;
use zenoh_bridge_serial::source::SerialByteSource;
use zenoh_bridge_serial::worker::SerialBridge;

#[tokio::main]
async fn main() -> Result<()> {
    let args = BridgeArgs::parse_with_default("serial.json5");

    let config = SerialBridgeConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    let mut runner = BridgeRunner::new_with_args("serial", config, Some(&args))
        .await?
        .with_status_publishing();

    let serial = runner.config().serial.clone();
    let format = runner.config().serialization;
    let settings = serial.settings()?;

    let liveliness = Arc::new(runner.liveliness().await?);

    let server = VariableServer::new(
        runner.session().clone(),
        serial.key_prefix.clone(),
        serial.device.clone(),
        format,
        runner.config().publisher.clone(),
    );

    let cycle = PublicationCycle::new(
        SerialByteSource::new(settings),
        server,
        serial.buffer_capacity,
        serial.read_timeout(),
    );

    if let Err(e) = cycle.create_nodes().await {
        runner
            .report_error(format!("Failed to create variable nodes: {}", e))
            .await;
        return Err(e).context("Failed to create variable nodes");
    }

    tracing::info!(
        device = %serial.device,
        port = %serial.port,
        baud_rate = serial.baud_rate,
        prefix = %serial.key_prefix,
        "Serial bridge ready"
    );

    let bridge = SerialBridge::new(&serial.device, cycle, serial.stale_after_cycles)
        .with_liveliness(liveliness);

    runner.schedule_repeating("serial-poll", serial.poll_interval(), bridge);

    let metadata = serde_json::json!({
        "device": serial.device,
        "port": serial.port,
        "baud_rate": serial.baud_rate,
        "poll_interval_ms": serial.poll_interval_ms,
        "serialization": format,
    });

    runner.run_with_metadata(Some(metadata)).await?;

    Ok(())
}
