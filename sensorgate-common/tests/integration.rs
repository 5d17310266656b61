//! Integration tests for sensorgate-common library.

use sensorgate_common::{
    Format, KeyExprBuilder, VariableSample, all_variables_wildcard, decode, decode_auto, encode,
    parse_key_expr, validate_chunk,
};

const PREFIX: &str = "sensorgate/serial";

#[test]
fn test_sample_published_and_resolved() {
    let builder = KeyExprBuilder::new(PREFIX);
    let sample = VariableSample::new("arduino01", "accelerationY", -0.2);

    // A bridge publishes the sample on its variable key
    let key = builder.variable(&sample.source, &sample.node);
    assert_eq!(key, "sensorgate/serial/arduino01/accelerationY");

    // A consumer maps the key back to the node and decodes the payload
    let parsed = parse_key_expr(PREFIX, &key).expect("Parse failed");
    assert_eq!(parsed.source, "arduino01");
    assert_eq!(parsed.node, "accelerationY");

    for format in [Format::Json, Format::Cbor] {
        let bytes = encode(&sample, format).expect("Encode failed");
        let decoded: VariableSample = decode_auto(&bytes).expect("Decode failed");
        assert_eq!(decoded, sample);
    }
}

#[test]
fn test_all_variable_nodes_have_valid_keys() {
    let builder = KeyExprBuilder::new(PREFIX);
    let nodes = [
        "temperature",
        "humidity",
        "accelerationX",
        "accelerationY",
        "accelerationZ",
    ];

    for node in nodes {
        validate_chunk(node).expect("Node name should be a valid chunk");
        let key = builder.variable("arduino01", node);
        assert_eq!(parse_key_expr(PREFIX, &key).unwrap().node, node);
    }
}

#[test]
fn test_admin_keys_are_not_variables() {
    let builder = KeyExprBuilder::new(PREFIX);

    assert!(parse_key_expr(PREFIX, &builder.status_key()).is_none());
    assert!(parse_key_expr(PREFIX, &builder.alive_key()).is_none());
    assert!(parse_key_expr(PREFIX, &builder.device_alive_key("arduino01")).is_none());
}

#[test]
fn test_wildcards() {
    assert_eq!(all_variables_wildcard(), "sensorgate/**");
    assert_eq!(
        KeyExprBuilder::new(PREFIX).source_wildcard("arduino01"),
        "sensorgate/serial/arduino01/*"
    );
}

#[test]
fn test_special_float_values_survive_cbor() {
    for value in [f32::MAX, f32::MIN_POSITIVE, -0.0, f32::INFINITY] {
        let sample = VariableSample::new("dev", "temperature", value);
        let bytes = encode(&sample, Format::Cbor).unwrap();
        let decoded: VariableSample = decode(&bytes, Format::Cbor).unwrap();
        assert_eq!(decoded.value.to_bits(), value.to_bits());
    }

    let nan = VariableSample::new("dev", "humidity", f32::NAN);
    let bytes = encode(&nan, Format::Cbor).unwrap();
    let decoded: VariableSample = decode(&bytes, Format::Cbor).unwrap();
    assert!(decoded.value.is_nan());
}
