use serde::{Serialize, de::DeserializeOwned};

use crate::error::{Error, Result};

/// Payload encoding for variable samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// JSON (human-readable, good for debugging).
    #[default]
    Json,

    /// CBOR (compact binary).
    Cbor,
}

/// Encode a value to bytes using the specified format.
pub fn encode<T: Serialize>(value: &T, format: Format) -> Result<Vec<u8>> {
    match format {
        Format::Json => serde_json::to_vec(value).map_err(Error::from),
        Format::Cbor => {
            let mut buf = Vec::new();
            ciborium::into_writer(value, &mut buf)?;
            Ok(buf)
        }
    }
}

/// Decode bytes to a value using the specified format.
pub fn decode<T: DeserializeOwned>(data: &[u8], format: Format) -> Result<T> {
    match format {
        Format::Json => serde_json::from_slice(data).map_err(Error::from),
        Format::Cbor => ciborium::from_reader(data).map_err(|e| Error::Cbor(e.to_string())),
    }
}

/// Guess the format of an encoded payload.
///
/// A JSON object or array starts with `{` or `[`; anything else is treated as CBOR.
pub fn detect_format(data: &[u8]) -> Format {
    match data.first() {
        Some(b'{') | Some(b'[') => Format::Json,
        _ => Format::Cbor,
    }
}

/// Decode bytes, auto-detecting the format.
pub fn decode_auto<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    decode(data, detect_format(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::VariableSample;

    fn sample() -> VariableSample {
        VariableSample::new("arduino01", "temperature", 23.5).with_timestamp(1_700_000_000_000)
    }

    #[test]
    fn test_json_decode() {
        let encoded = encode(&sample(), Format::Json).unwrap();
        assert_eq!(encoded.first(), Some(&b'{'));

        let decoded: VariableSample = decode(&encoded, Format::Json).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_cbor_is_smaller() {
        let json = encode(&sample(), Format::Json).unwrap();
        let cbor = encode(&sample(), Format::Cbor).unwrap();

        assert!(cbor.len() < json.len(), "CBOR should be smaller than JSON");
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(detect_format(b"{\"node\": \"humidity\"}"), Format::Json);
        assert_eq!(detect_format(b"[1, 2, 3]"), Format::Json);
        assert_eq!(detect_format(b"\xa1\x64node\x68humidity"), Format::Cbor);
        assert_eq!(detect_format(b""), Format::Cbor);
    }

    #[test]
    fn test_auto_decode_cbor() {
        let cbor = encode(&sample(), Format::Cbor).unwrap();
        let decoded: VariableSample = decode_auto(&cbor).unwrap();
        assert_eq!(decoded.node, "temperature");
        assert_eq!(decoded.value, 23.5);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result: Result<VariableSample> = decode(b"{not json", Format::Json);
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
