#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use strtok_decoder::decode_slice;
use strtok_encoder::to_vec;
use strtok_types::Value;

#[derive(Debug, Arbitrary)]
enum FuzzValue {
    Nil,
    Bool(bool),
    Integer(i64),
    Raw(Vec<u8>),
    Array(Vec<FuzzValue>),
    Map(Vec<(FuzzValue, FuzzValue)>),
}

fn to_value(v: FuzzValue, depth: usize) -> Value {
    if depth > 32 {
        return Value::Nil;
    }
    match v {
        FuzzValue::Nil => Value::Nil,
        FuzzValue::Bool(b) => Value::Bool(b),
        FuzzValue::Integer(i) => Value::Integer(i),
        FuzzValue::Raw(bytes) => Value::raw(bytes),
        FuzzValue::Array(items) => {
            Value::array(items.into_iter().map(|item| to_value(item, depth + 1)))
        }
        FuzzValue::Map(pairs) => Value::map(
            pairs
                .into_iter()
                .map(|(k, v)| (to_value(k, depth + 1), to_value(v, depth + 1))),
        ),
    }
}

// Fuzz target: encode -> decode roundtrip over arbitrary value trees.
//
// Out-of-range integers must be rejected by the encoder; everything it
// accepts must decode back to an equal value.
fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(input) = FuzzValue::arbitrary(&mut u) else {
        return;
    };
    let value = to_value(input, 0);

    let Ok(bytes) = to_vec(&value) else {
        return;
    };

    let decoded = decode_slice(&bytes);
    assert!(decoded.is_ok(), "decoder failed on valid encoder output: {:?}", decoded.err());

    let decoded = decoded.unwrap();
    assert_eq!(decoded, [value]);
});
