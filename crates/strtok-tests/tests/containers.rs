//! Container encoding: nesting, empty containers, and length-tier
//! boundaries checked against exact tag bytes.

use strtok_decoder::decode_slice;
use strtok_encoder::to_vec;
use strtok_tests::{nested_array, nested_map};
use strtok_types::Value;

fn decode_one(bytes: &[u8]) -> Value {
    let mut values = decode_slice(bytes).unwrap();
    assert_eq!(values.len(), 1);
    values.remove(0)
}

#[test]
fn nested_array_structure() {
    let decoded = decode_one(&to_vec(&nested_array()).unwrap());
    let items = decoded.as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert_eq!(items[2], Value::array([11, 12, 13].map(Value::from)));
    assert_eq!(items[3].as_array().unwrap()[1].as_str(), Some("b"));
}

#[test]
fn nested_map_compared_as_set() {
    let decoded = decode_one(&to_vec(&nested_map()).unwrap());
    let map = decoded.as_map().unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map[&Value::from("k1")], Value::from(1));
    assert_eq!(map[&Value::from("k2")], Value::array([1, 2, 3, 4].map(Value::from)));

    // Same pairs, opposite wire order
    let reversed = [
        0x82, 0xA2, b'k', b'2', 0x94, 0x01, 0x02, 0x03, 0x04, 0xA2, b'k', b'1', 0x01,
    ];
    assert_eq!(decode_one(&reversed), nested_map());
}

#[test]
fn empty_containers() {
    let empty_array = Value::array([]);
    let empty_map = Value::map::<Value, Value>([]);
    assert_eq!(to_vec(&empty_array).unwrap(), [0x90]);
    assert_eq!(to_vec(&empty_map).unwrap(), [0x80]);
    assert_eq!(decode_one(&[0x90]), empty_array);
    assert_eq!(decode_one(&[0x80]), empty_map);
}

// ── Length tiers ──────────────────────────────────────────────────────────────

fn array_of(len: usize) -> Value {
    Value::Array(vec![Value::Bool(true); len])
}

fn map_of(len: u32) -> Value {
    Value::map((0..len).map(|i| (i, Value::Nil)))
}

fn raw_of(len: usize) -> Value {
    Value::from(vec![b'r'; len])
}

fn check_tier(value: &Value, header: &[u8]) {
    let bytes = to_vec(value).unwrap();
    assert_eq!(&bytes[..header.len()], header, "{} header", value.shape());
    assert_eq!(&decode_one(&bytes), value);
}

#[test]
fn array_tiers() {
    check_tier(&array_of(15), &[0x9F]);
    check_tier(&array_of(16), &[0xDC, 0x00, 0x10]);
    check_tier(&array_of(65_535), &[0xDC, 0xFF, 0xFF]);
    check_tier(&array_of(65_536), &[0xDD, 0x00, 0x01, 0x00, 0x00]);
}

#[test]
fn map_tiers() {
    check_tier(&map_of(15), &[0x8F]);
    check_tier(&map_of(16), &[0xDE, 0x00, 0x10]);
    check_tier(&map_of(65_535), &[0xDE, 0xFF, 0xFF]);
    check_tier(&map_of(65_536), &[0xDF, 0x00, 0x01, 0x00, 0x00]);
}

#[test]
fn raw_tiers() {
    check_tier(&raw_of(15), &[0xAF]);
    check_tier(&raw_of(16), &[0xDA, 0x00, 0x10]);
    check_tier(&raw_of(65_535), &[0xDA, 0xFF, 0xFF]);
    check_tier(&raw_of(65_536), &[0xDB, 0x00, 0x01, 0x00, 0x00]);
}

#[test]
fn deep_mixed_nesting() {
    // {"a": [{"b": [[], {}]}]}
    let value = Value::map([(
        "a",
        Value::array([Value::map([(
            "b",
            Value::array([Value::array([]), Value::map::<Value, Value>([])]),
        )])]),
    )]);
    let bytes = to_vec(&value).unwrap();
    assert_eq!(
        bytes,
        [0x81, 0xA1, b'a', 0x91, 0x81, 0xA1, b'b', 0x92, 0x90, 0x80]
    );
    assert_eq!(decode_one(&bytes), value);
}
