//! Configuration for the serial bridge.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_serial::{DataBits, Parity, StopBits};

use sensorgate_bridge_framework::{
    BridgeConfig, BridgeError, Format, LoggingConfig, Result, VariableServerConfig, ZenohConfig,
};
use sensorgate_common::validate_chunk;

use crate::buffer::{DEFAULT_CAPACITY, MIN_CAPACITY};
use crate::source::SerialSettings;

/// Complete bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialBridgeConfig {
    /// Zenoh connection settings
    #[serde(default)]
    pub zenoh: ZenohConfig,

    /// Serial device settings
    pub serial: SerialConfig,

    /// Variable node publishers
    #[serde(default)]
    pub publisher: VariableServerConfig,

    /// Payload encoding of node values
    #[serde(default)]
    pub serialization: Format,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial device and polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Key expression prefix (default: "sensorgate/serial")
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Device name (used in key expressions)
    pub device: String,

    /// Serial port path (e.g., "/dev/ttyACM0" or "COM4")
    pub port: String,

    /// Baud rate (default: 9600)
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Data bits: 5-8 (default: 8)
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,

    /// Parity: "none", "even", or "odd" (default: "none")
    #[serde(default = "default_parity")]
    pub parity: String,

    /// Stop bits: 1 or 2 (default: 1)
    #[serde(default = "default_stop_bits")]
    pub stop_bits: u8,

    /// Time between polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Longest a single poll waits for data, in milliseconds
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Silence after which a poll returns what it has, in milliseconds
    #[serde(default = "default_inter_byte_timeout_ms")]
    pub inter_byte_timeout_ms: u64,

    /// Frame buffer size in bytes
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Cycles without a record before the device is reported offline (0 = never)
    #[serde(default = "default_stale_after_cycles")]
    pub stale_after_cycles: u32,
}

fn default_key_prefix() -> String {
    "sensorgate/serial".to_string()
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_data_bits() -> u8 {
    8
}

fn default_parity() -> String {
    "none".to_string()
}

fn default_stop_bits() -> u8 {
    1
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_read_timeout_ms() -> u64 {
    500
}

fn default_inter_byte_timeout_ms() -> u64 {
    50
}

fn default_buffer_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_stale_after_cycles() -> u32 {
    10
}

fn parse_parity(parity: &str) -> Option<Parity> {
    match parity.to_lowercase().as_str() {
        "none" => Some(Parity::None),
        "even" => Some(Parity::Even),
        "odd" => Some(Parity::Odd),
        _ => None,
    }
}

fn parse_data_bits(bits: u8) -> Option<DataBits> {
    match bits {
        5 => Some(DataBits::Five),
        6 => Some(DataBits::Six),
        7 => Some(DataBits::Seven),
        8 => Some(DataBits::Eight),
        _ => None,
    }
}

fn parse_stop_bits(bits: u8) -> Option<StopBits> {
    match bits {
        1 => Some(StopBits::One),
        2 => Some(StopBits::Two),
        _ => None,
    }
}

impl SerialConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn inter_byte_timeout(&self) -> Duration {
        Duration::from_millis(self.inter_byte_timeout_ms)
    }

    /// Line settings for opening the port.
    pub fn settings(&self) -> Result<SerialSettings> {
        let data_bits = parse_data_bits(self.data_bits).ok_or_else(|| {
            BridgeError::validation(format!(
                "serial.data_bits: {} is not supported (use 5, 6, 7 or 8)",
                self.data_bits
            ))
        })?;
        let parity = parse_parity(&self.parity).ok_or_else(|| {
            BridgeError::validation(format!(
                "serial.parity: invalid parity '{}' (use none, even, or odd)",
                self.parity
            ))
        })?;
        let stop_bits = parse_stop_bits(self.stop_bits).ok_or_else(|| {
            BridgeError::validation(format!(
                "serial.stop_bits: {} is not supported (use 1 or 2)",
                self.stop_bits
            ))
        })?;

        Ok(SerialSettings {
            port: self.port.clone(),
            baud_rate: self.baud_rate,
            data_bits,
            parity,
            stop_bits,
            inter_byte_timeout: self.inter_byte_timeout(),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.key_prefix.is_empty() {
            return Err(BridgeError::validation("serial.key_prefix cannot be empty"));
        }
        for chunk in self.key_prefix.split('/') {
            validate_chunk(chunk).map_err(|e| {
                BridgeError::validation(format!("serial.key_prefix '{}': {}", self.key_prefix, e))
            })?;
        }

        validate_chunk(&self.device)
            .map_err(|e| BridgeError::validation(format!("serial.device: {}", e)))?;

        if self.port.is_empty() {
            return Err(BridgeError::validation("serial.port cannot be empty"));
        }

        if self.baud_rate == 0 {
            return Err(BridgeError::validation("serial.baud_rate must be > 0"));
        }

        if self.poll_interval_ms == 0 {
            return Err(BridgeError::validation("serial.poll_interval_ms must be > 0"));
        }

        if self.read_timeout_ms == 0 {
            return Err(BridgeError::validation("serial.read_timeout_ms must be > 0"));
        }

        if self.buffer_capacity < MIN_CAPACITY {
            return Err(BridgeError::validation(format!(
                "serial.buffer_capacity must be >= {}",
                MIN_CAPACITY
            )));
        }

        self.settings().map(|_| ())
    }
}

impl BridgeConfig for SerialBridgeConfig {
    fn zenoh(&self) -> &ZenohConfig {
        &self.zenoh
    }

    fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    fn key_prefix(&self) -> &str {
        &self.serial.key_prefix
    }

    fn validate(&self) -> Result<()> {
        self.serial.validate()?;

        if self.publisher.cache_size == 0 {
            return Err(BridgeError::validation("publisher.cache_size must be > 0"));
        }

        if self.publisher.miss_detection && self.publisher.heartbeat_ms == 0 {
            return Err(BridgeError::validation(
                "publisher.heartbeat_ms must be > 0 when miss_detection is enabled",
            ));
        }

        Ok(())
    }
}
