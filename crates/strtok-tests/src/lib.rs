//! Shared fixtures for the integration tests and benchmarks.
//!
//! Everything here is deterministic so that snapshot and benchmark inputs
//! stay identical across runs.

use std::collections::VecDeque;

use bytes::Bytes;
use strtok_types::Value;

/// `[1, 2, [11, 12, 13], ["a", "b", "c"]]`
#[must_use]
pub fn nested_array() -> Value {
    Value::array([
        Value::from(1),
        Value::from(2),
        Value::array([11, 12, 13].map(Value::from)),
        Value::array(["a", "b", "c"].map(Value::from)),
    ])
}

/// `{"k1": 1, "k2": [1, 2, 3, 4]}`
#[must_use]
pub fn nested_map() -> Value {
    Value::map([
        ("k1", Value::from(1)),
        ("k2", Value::array([1, 2, 3, 4].map(Value::from))),
    ])
}

/// Integers on either side of every width tier, plus the extremes.
pub const BOUNDARY_INTEGERS: &[i64] = &[
    0,
    1,
    127,
    128,
    255,
    256,
    65_535,
    65_536,
    2_147_483_647,
    4_294_967_295,
    -1,
    -32,
    -33,
    -128,
    -129,
    -32_768,
    -32_769,
    -2_147_483_648,
];

/// A record-shaped document of `records` maps, used by the benchmarks.
#[must_use]
pub fn sample_document(records: u32) -> Value {
    Value::array((0..records).map(|i| {
        Value::map([
            (Value::from("id"), Value::from(i)),
            (Value::from("name"), Value::from(format!("record-{i}"))),
            (Value::from("active"), Value::from(i % 3 == 0)),
            (
                Value::from("scores"),
                Value::array([i % 7, i * 31, 70_000 + i].map(Value::from)),
            ),
            (Value::from("parent"), Value::Nil),
        ])
    }))
}

/// Split `bytes` into chunks of `size` bytes (the last may be shorter).
///
/// # Panics
///
/// Panics if `size` is zero.
#[must_use]
pub fn split_every(bytes: &[u8], size: usize) -> VecDeque<Bytes> {
    bytes.chunks(size).map(Bytes::copy_from_slice).collect()
}

/// Split `bytes` at each of `points` (sorted, deduplicated, and clamped to
/// the input length first). Empty chunks are never produced.
#[must_use]
pub fn split_at_points(bytes: &[u8], points: &[usize]) -> VecDeque<Bytes> {
    let mut cuts: Vec<usize> = points
        .iter()
        .map(|&p| p.min(bytes.len()))
        .filter(|&p| p > 0 && p < bytes.len())
        .collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut chunks = VecDeque::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts.into_iter().chain(std::iter::once(bytes.len())) {
        if cut > start {
            chunks.push_back(Bytes::copy_from_slice(&bytes[start..cut]));
        }
        start = cut;
    }
    chunks
}

/// Parse a hex fixture, ignoring whitespace.
///
/// # Panics
///
/// Panics on malformed hex; fixtures are written by hand.
#[must_use]
pub fn from_hex(fixture: &str) -> Vec<u8> {
    let compact: String = fixture.split_whitespace().collect();
    hex::decode(&compact).unwrap_or_else(|e| panic!("bad hex fixture {fixture:?}: {e}"))
}
