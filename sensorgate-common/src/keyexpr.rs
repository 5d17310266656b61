use crate::error::{Error, Result};

/// Root key expression prefix for all SensorGate data.
pub const KEY_PREFIX: &str = "sensorgate";

/// Builder for constructing SensorGate key expressions.
///
/// Key expressions follow the pattern:
/// `<prefix>/<source>/<node>`
///
/// where `<prefix>` is the bridge prefix (e.g., `sensorgate/serial`).
/// Administrative keys live under `<prefix>/@/...`.
#[derive(Debug, Clone)]
pub struct KeyExprBuilder {
    prefix: String,
}

impl KeyExprBuilder {
    /// Create a builder for a bridge prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Get the bridge prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Build the key expression of a variable node.
    ///
    /// # Example
    /// ```
    /// use sensorgate_common::keyexpr::KeyExprBuilder;
    ///
    /// let builder = KeyExprBuilder::new("sensorgate/serial");
    /// let key = builder.variable("arduino01", "temperature");
    /// assert_eq!(key, "sensorgate/serial/arduino01/temperature");
    /// ```
    pub fn variable(&self, source: &str, node: &str) -> String {
        format!("{}/{}/{}", self.prefix, source, node)
    }

    /// Build a wildcard key expression for all variables of a source.
    ///
    /// # Example
    /// ```
    /// use sensorgate_common::keyexpr::KeyExprBuilder;
    ///
    /// let builder = KeyExprBuilder::new("sensorgate/serial");
    /// assert_eq!(builder.source_wildcard("arduino01"), "sensorgate/serial/arduino01/*");
    /// ```
    pub fn source_wildcard(&self, source: &str) -> String {
        format!("{}/{}/*", self.prefix, source)
    }

    /// Build the key expression for bridge status.
    ///
    /// # Example
    /// ```
    /// use sensorgate_common::keyexpr::KeyExprBuilder;
    ///
    /// let builder = KeyExprBuilder::new("sensorgate/serial");
    /// assert_eq!(builder.status_key(), "sensorgate/serial/@/status");
    /// ```
    pub fn status_key(&self) -> String {
        format!("{}/@/status", self.prefix)
    }

    /// Build the bridge liveliness key expression.
    pub fn alive_key(&self) -> String {
        format!("{}/@/alive", self.prefix)
    }

    /// Build the liveliness key expression for a device.
    pub fn device_alive_key(&self, device: &str) -> String {
        format!("{}/@/devices/{}/alive", self.prefix, device)
    }
}

/// Build a wildcard key expression for every SensorGate key.
///
/// # Example
/// ```
/// use sensorgate_common::keyexpr::all_variables_wildcard;
///
/// assert_eq!(all_variables_wildcard(), "sensorgate/**");
/// ```
pub fn all_variables_wildcard() -> String {
    format!("{}/**", KEY_PREFIX)
}

/// Check that a string can be used as a single key expression chunk.
///
/// Rejects empty strings, separators, wildcards and the `@` admin marker.
pub fn validate_chunk(chunk: &str) -> Result<()> {
    if chunk.is_empty() {
        return Err(Error::KeyExpr("empty key chunk".to_string()));
    }

    if chunk.starts_with('@') {
        return Err(Error::KeyExpr(format!(
            "'{}' starts with the reserved '@' marker",
            chunk
        )));
    }

    if let Some(c) = chunk.chars().find(|c| matches!(c, '/' | '*' | '$' | '?' | '#')) {
        return Err(Error::KeyExpr(format!(
            "'{}' contains forbidden character '{}'",
            chunk, c
        )));
    }

    Ok(())
}

/// Parse a variable key expression relative to a bridge prefix.
///
/// Returns `None` if the key doesn't start with `prefix`, is an administrative
/// key, or doesn't have exactly `<source>/<node>` after the prefix.
pub fn parse_key_expr<'a>(prefix: &str, key: &'a str) -> Option<ParsedKeyExpr<'a>> {
    let rest = key.strip_prefix(prefix)?.strip_prefix('/')?;

    let mut parts = rest.split('/');
    let source = parts.next()?;
    let node = parts.next()?;

    if parts.next().is_some() || source.is_empty() || node.is_empty() || source == "@" {
        return None;
    }

    Some(ParsedKeyExpr { source, node })
}

/// Parsed components of a variable key expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKeyExpr<'a> {
    pub source: &'a str,
    pub node: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_builder() {
        let builder = KeyExprBuilder::new("sensorgate/serial");

        assert_eq!(
            builder.variable("arduino01", "accelerationX"),
            "sensorgate/serial/arduino01/accelerationX"
        );
        assert_eq!(builder.status_key(), "sensorgate/serial/@/status");
        assert_eq!(builder.alive_key(), "sensorgate/serial/@/alive");
        assert_eq!(
            builder.device_alive_key("arduino01"),
            "sensorgate/serial/@/devices/arduino01/alive"
        );
    }

    #[test]
    fn test_parse_key_expr() {
        let parsed =
            parse_key_expr("sensorgate/serial", "sensorgate/serial/arduino01/humidity").unwrap();

        assert_eq!(parsed.source, "arduino01");
        assert_eq!(parsed.node, "humidity");
    }

    #[test]
    fn test_parse_invalid_key() {
        assert!(parse_key_expr("sensorgate/serial", "invalid/key").is_none());
        assert!(parse_key_expr("sensorgate/serial", "sensorgate/serial/arduino01").is_none());
        assert!(parse_key_expr("sensorgate/serial", "sensorgate/serial/@/status").is_none());
        assert!(parse_key_expr("sensorgate/serial", "sensorgate/serialx/a/b").is_none());
        assert!(
            parse_key_expr("sensorgate/serial", "sensorgate/serial/arduino01/a/b").is_none()
        );
    }

    #[test]
    fn test_validate_chunk() {
        assert!(validate_chunk("arduino01").is_ok());
        assert!(validate_chunk("accelerationX").is_ok());
        assert!(validate_chunk("").is_err());
        assert!(validate_chunk("a/b").is_err());
        assert!(validate_chunk("dev*").is_err());
        assert!(validate_chunk("@admin").is_err());
    }
}
