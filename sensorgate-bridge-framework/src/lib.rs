//! SensorGate Bridge Framework
//!
//! Common abstractions for building device bridges that expose readings as
//! Zenoh variables.
//!
//! # Overview
//!
//! This framework provides:
//! - [`BridgeConfig`] trait for configuration loading and validation
//! - [`BridgeRunner`] for managing bridge lifecycle (startup, scheduling, shutdown)
//! - [`VariablePublisher`] and its Zenoh implementation [`VariableServer`]
//! - [`PeriodicTask`] for work driven by a fixed-period timer
//! - [`LivelinessManager`] for bridge and device presence
//! - [`BridgeArgs`] for common CLI argument parsing
//! - [`BridgeStatus`] for standardized status reporting
//!
//! # Example
//!
//! ```ignore
//! use sensorgate_bridge_framework::{BridgeArgs, BridgeConfig, BridgeRunner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = BridgeArgs::parse_with_default("mybridge.json5");
//!     let config = MyBridgeConfig::load(&args.config)?;
//!
//!     let mut runner = BridgeRunner::new_with_args("mybridge", config, Some(&args)).await?;
//!     runner.schedule_repeating("poll", period, my_task);
//!
//!     // Run until Ctrl+C
//!     runner.run().await?;
//!     Ok(())
//! }
//! ```

mod args;
mod config;
mod error;
mod liveliness;
mod publisher;
mod runner;
mod schedule;
mod status;
mod variables;

pub use args::BridgeArgs;
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use liveliness::LivelinessManager;
pub use publisher::Publisher;
pub use runner::BridgeRunner;
pub use schedule::{PeriodicTask, run_periodic};
pub use status::{BridgeStatus, StatusPublisher};
pub use variables::{VariablePublisher, VariableServer, VariableServerConfig};

// Re-export commonly used types from sensorgate-common
pub use sensorgate_common::{Format, LogFormat, LoggingConfig, VariableSample, ZenohConfig};
