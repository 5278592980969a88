#![no_main]

use libfuzzer_sys::fuzz_target;
use strtok_decoder::{DecoderConfig, decode_slice_with};

// Fuzz target: whole-buffer decoding of arbitrary bytes.
//
// Catches bugs in:
// - Unknown and unsupported tag handling
// - Hostile raw/array/map length headers (pre-allocation cap)
// - Truncation detection at every position
// - Container completion and map pair assembly
fuzz_target!(|data: &[u8]| {
    let config = DecoderConfig {
        max_depth: Some(512),
        ..DecoderConfig::default()
    };
    let _ = decode_slice_with(data, config);
});
