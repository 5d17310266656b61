//! Error types for the bridge framework.

use thiserror::Error;

/// Result type alias using [`BridgeError`].
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur in a bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration parse error.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration validation error.
    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    /// Zenoh connection error.
    #[error("Zenoh connection error: {0}")]
    ZenohConnection(String),

    /// Zenoh session error.
    #[error("Zenoh session error: {0}")]
    ZenohSession(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Publishing error.
    #[error("Failed to publish to {key}: {message}")]
    Publish { key: String, message: String },

    /// Write to a variable node that was never created.
    #[error("Unknown variable node: {0}")]
    UnknownNode(String),

    /// Liveliness token error.
    #[error("Liveliness error: {0}")]
    Liveliness(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a configuration validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ConfigValidation(msg.into())
    }

    /// Create a liveliness error.
    pub fn liveliness(msg: impl Into<String>) -> Self {
        Self::Liveliness(msg.into())
    }
}

impl From<zenoh::Error> for BridgeError {
    fn from(err: zenoh::Error) -> Self {
        Self::ZenohSession(err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<json5::Error> for BridgeError {
    fn from(err: json5::Error) -> Self {
        Self::ConfigParse(err.to_string())
    }
}

impl From<sensorgate_common::Error> for BridgeError {
    fn from(err: sensorgate_common::Error) -> Self {
        match err {
            sensorgate_common::Error::Config(msg) => Self::Config(msg),
            sensorgate_common::Error::KeyExpr(msg) => Self::ConfigValidation(msg),
            sensorgate_common::Error::Io(e) => Self::Io(e),
            sensorgate_common::Error::Zenoh(e) => Self::ZenohSession(e.to_string()),
            other => Self::Serialization(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_error_mapping() {
        let err: BridgeError = sensorgate_common::Error::KeyExpr("bad/chunk".into()).into();
        assert!(matches!(err, BridgeError::ConfigValidation(_)));

        let err: BridgeError = sensorgate_common::Error::Cbor("truncated".into()).into();
        assert!(matches!(err, BridgeError::Serialization(_)));
    }

    #[test]
    fn test_display() {
        let err = BridgeError::UnknownNode("pressure".to_string());
        assert_eq!(err.to_string(), "Unknown variable node: pressure");

        let err = BridgeError::Publish {
            key: "sensorgate/serial/arduino01/temperature".to_string(),
            message: "session closed".to_string(),
        };
        assert!(err.to_string().contains("arduino01/temperature"));
    }
}
