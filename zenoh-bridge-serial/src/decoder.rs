//! Strict decoder for sensor frames.
//!
//! The device sends exactly one record shape:
//!
//! ```text
//! {"temperature":<f>,"humidity":<f>,"accelX":<f>,"accelY":<f>,"accelZ":<f>}
//! ```
//!
//! Keys must appear in this order with no whitespace around them. A value may
//! carry leading whitespace; anything else `f32::from_str` rejects fails the
//! whole frame. Values are not range checked, so NaN and infinities pass.

use thiserror::Error;

use crate::buffer::{END_MARKER, Frame, START_MARKER};

/// One field of the wire record and the variable node it feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Key in the JSON record.
    pub key: &'static str,
    /// Variable node name.
    pub variable: &'static str,
}

/// Wire fields in the order the device sends them.
pub const SENSOR_FIELDS: [FieldSpec; 5] = [
    FieldSpec {
        key: "temperature",
        variable: "temperature",
    },
    FieldSpec {
        key: "humidity",
        variable: "humidity",
    },
    FieldSpec {
        key: "accelX",
        variable: "accelerationX",
    },
    FieldSpec {
        key: "accelY",
        variable: "accelerationY",
    },
    FieldSpec {
        key: "accelZ",
        variable: "accelerationZ",
    },
];

/// A fully decoded sensor frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorRecord {
    pub temperature: f32,
    pub humidity: f32,
    pub accel_x: f32,
    pub accel_y: f32,
    pub accel_z: f32,
}

impl SensorRecord {
    fn from_values([temperature, humidity, accel_x, accel_y, accel_z]: [f32; 5]) -> Self {
        Self {
            temperature,
            humidity,
            accel_x,
            accel_y,
            accel_z,
        }
    }

    /// Values paired with their variable node names, in wire order.
    pub fn variables(&self) -> [(&'static str, f32); 5] {
        let values = [
            self.temperature,
            self.humidity,
            self.accel_x,
            self.accel_y,
            self.accel_z,
        ];
        std::array::from_fn(|i| (SENSOR_FIELDS[i].variable, values[i]))
    }
}

/// Decode errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("frame is not enclosed in '{{' and '}}'")]
    MissingDelimiters,

    #[error("frame is not valid UTF-8")]
    InvalidUtf8,

    #[error("field \"{expected}\" missing")]
    MissingField { expected: &'static str },

    #[error("expected field \"{expected}\", found {found:?}")]
    UnexpectedKey {
        expected: &'static str,
        found: String,
    },

    #[error("field \"{field}\" has invalid number {token:?}")]
    InvalidNumber { field: &'static str, token: String },
}

/// Decode an extracted frame.
pub fn decode(frame: Frame<'_>) -> Result<SensorRecord, DecodeError> {
    decode_bytes(frame.as_bytes())
}

/// Decode a `{...}` record given as raw bytes.
pub fn decode_bytes(bytes: &[u8]) -> Result<SensorRecord, DecodeError> {
    let inner = bytes
        .strip_prefix(&[START_MARKER])
        .and_then(|b| b.strip_suffix(&[END_MARKER]))
        .ok_or(DecodeError::MissingDelimiters)?;

    let payload = std::str::from_utf8(inner).map_err(|_| DecodeError::InvalidUtf8)?;

    let mut rest = payload;
    let mut values = [0.0f32; SENSOR_FIELDS.len()];

    for (i, field) in SENSOR_FIELDS.iter().enumerate() {
        if i > 0 {
            rest = rest.strip_prefix(',').ok_or(DecodeError::MissingField {
                expected: field.key,
            })?;
        }

        rest = expect_key(rest, field)?;

        // The last value runs to the end so trailing content makes it invalid
        let (token, tail) = if i + 1 == SENSOR_FIELDS.len() {
            (rest, "")
        } else {
            rest.split_at(rest.find(',').unwrap_or(rest.len()))
        };

        values[i] = parse_number(token, field)?;
        rest = tail;
    }

    Ok(SensorRecord::from_values(values))
}

fn expect_key<'a>(rest: &'a str, field: &FieldSpec) -> Result<&'a str, DecodeError> {
    if rest.is_empty() {
        return Err(DecodeError::MissingField {
            expected: field.key,
        });
    }

    rest.strip_prefix('"')
        .and_then(|r| r.strip_prefix(field.key))
        .and_then(|r| r.strip_prefix("\":"))
        .ok_or_else(|| DecodeError::UnexpectedKey {
            expected: field.key,
            found: rest.split([':', ',']).next().unwrap_or(rest).to_string(),
        })
}

fn parse_number(token: &str, field: &FieldSpec) -> Result<f32, DecodeError> {
    token
        .trim_start_matches(|c: char| c.is_ascii_whitespace())
        .parse::<f32>()
        .map_err(|_| DecodeError::InvalidNumber {
            field: field.key,
            token: token.to_string(),
        })
}
