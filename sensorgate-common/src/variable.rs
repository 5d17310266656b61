use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A single value written to a scalar variable node.
///
/// This is the payload published on `<prefix>/<source>/<node>` every time a
/// bridge writes a new value. Subscribers joining late receive the most recent
/// sample from the publisher cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSample {
    /// Unix epoch milliseconds when the value was written.
    pub timestamp: i64,

    /// Device identifier the value originates from (e.g., "arduino01").
    pub source: String,

    /// Variable node name (e.g., "temperature", "accelerationX").
    pub node: String,

    /// The scalar value.
    pub value: f32,
}

impl VariableSample {
    /// Create a new sample stamped with the current time.
    pub fn new(source: impl Into<String>, node: impl Into<String>, value: f32) -> Self {
        Self {
            timestamp: current_timestamp_millis(),
            source: source.into(),
            node: node.into(),
            value,
        }
    }

    /// Override the timestamp.
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Get the current timestamp in milliseconds since Unix epoch.
///
/// Returns 0 if system time is before Unix epoch (should never happen in practice).
pub fn current_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
