//! Zenoh bridge for JSON sensor frames on a serial port.
//!
//! A microcontroller prints records like
//! `{"temperature":23.5,"humidity":40.0,"accelX":0.1,"accelY":-0.2,"accelZ":9.8}`
//! on a serial line. This bridge polls the port on a fixed period, reassembles
//! records across reads, decodes them and writes each field to a scalar
//! variable node.
//!
//! # Key Expressions
//!
//! ```text
//! sensorgate/serial/<device>/<node>
//! ```
//!
//! Where:
//! - `<device>` - Device name from configuration
//! - `<node>` - `temperature`, `humidity`, `accelerationX`, `accelerationY` or `accelerationZ`

pub mod buffer;
pub mod config;
pub mod cycle;
pub mod decoder;
pub mod source;
pub mod worker;

pub use buffer::{BufferError, Extraction, Frame, FrameBuffer};
pub use config::{SerialBridgeConfig, SerialConfig};
pub use cycle::{CycleError, CycleOutcome, CycleStats, PublicationCycle, PublishReport};
pub use decoder::{DecodeError, FieldSpec, SENSOR_FIELDS, SensorRecord, decode};
pub use source::{ByteSource, SerialByteSource, SerialSettings, SourceError};
pub use worker::SerialBridge;
